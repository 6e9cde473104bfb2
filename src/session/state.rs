use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle state of the recording slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No recording in progress
    Idle,
    /// Frames are being appended to the sink
    Recording,
    /// Recording suspended; frames are discarded, the sink stays open
    Paused,
    /// Sink closed, upload not yet accepted
    Finalizing,
    /// Clip handed to the upload worker
    Uploading,
    /// Terminal: upload exhausted or device lost; the local file is retained
    Failed,
}

impl SessionState {
    /// Non-terminal states. At most one session may be in one of these.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Recording
                | SessionState::Paused
                | SessionState::Finalizing
                | SessionState::Uploading
        )
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Paused => "paused",
            SessionState::Finalizing => "finalizing",
            SessionState::Uploading => "uploading",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Operator commands accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Stop,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Command-path failures. None of these mutate session state.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The command's precondition does not hold.
    #[error("cannot {command} while {state}")]
    InvalidTransition {
        command: Command,
        state: SessionState,
    },

    /// The capture device is gone; no new recording can start.
    #[error("capture device lost")]
    DeviceLost,

    /// A stop is still being finalized.
    #[error("a transition is already in flight")]
    SessionBusy,

    /// Unexpected I/O failure; the session (if any) has been marked Failed.
    #[error("recording failed: {0}")]
    Failed(String),
}

impl ControlError {
    /// Stable wire code for the HTTP surface.
    pub fn code(&self) -> &'static str {
        match self {
            ControlError::InvalidTransition { .. } => "InvalidTransition",
            ControlError::DeviceLost => "DeviceLost",
            ControlError::SessionBusy => "SessionBusy",
            ControlError::Failed(_) => "RecordingFailed",
        }
    }
}
