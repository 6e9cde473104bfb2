pub mod broadcast;
pub mod capture;
pub mod config;
pub mod http;
pub mod session;
pub mod upload;

pub use broadcast::{FrameFeed, StreamBroadcaster};
pub use capture::{
    CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureError, CaptureSource, Frame,
    FrameSource, SyntheticDevice,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{
    Command, ControlError, FailureReport, RecordingController, RecordingSession, SessionState,
    SessionStatus,
};
pub use upload::{
    FsObjectStore, ObjectStore, StoreError, UploadConfig, UploadError, UploadHandle, UploadOutcome,
    UploadTask, UploadWorker,
};
