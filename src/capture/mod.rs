//! Frame capture: the device abstraction and the capture loop.

mod device;
mod frame;
mod source;

pub use device::{
    CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureError, CaptureSource,
    SyntheticDevice,
};
pub use frame::Frame;
pub use source::FrameSource;
