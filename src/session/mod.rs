//! Recording lifecycle: the session state machine, the sink file, and the
//! controller that serializes every command against the single session slot.

mod controller;
mod session;
mod sink;
mod state;
mod status;

pub use controller::RecordingController;
pub use session::RecordingSession;
pub use sink::FrameSink;
pub use state::{Command, ControlError, SessionState};
pub use status::{FailureReport, SessionStatus};
