use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::session::RecordingSession;
use super::state::{Command, ControlError, SessionState};
use super::status::{FailureReport, SessionStatus};
use crate::capture::Frame;
use crate::upload::{UploadHandle, UploadOutcome, UploadTask};

/// The single point of command serialization.
///
/// Every command, every frame append, the device-lost teardown, and the
/// upload-completion handler all take the slot mutex, so no two transitions
/// race on the same check-and-set and no append can interleave with a sink
/// close. The controller is the only writer of session state.
pub struct RecordingController {
    slot: Mutex<Slot>,
    uploader: UploadHandle,
    recordings_dir: PathBuf,
}

struct Slot {
    /// `None` is the fresh Idle placeholder.
    session: Option<RecordingSession>,
    last_failure: Option<FailureReport>,
    device_lost: bool,
}

impl RecordingController {
    pub fn new(uploader: UploadHandle, recordings_dir: PathBuf) -> Self {
        Self {
            slot: Mutex::new(Slot {
                session: None,
                last_failure: None,
                device_lost: false,
            }),
            uploader,
            recordings_dir,
        }
    }

    /// `start`: Idle (or a disposed Failed session) → Recording.
    pub async fn start(&self) -> Result<SessionStatus, ControlError> {
        let mut slot = self.slot.lock().await;

        if slot.device_lost {
            return Err(ControlError::DeviceLost);
        }

        match &slot.session {
            None => {}
            Some(s) if s.state() == SessionState::Failed => {
                // The failure has been logged and stays queryable via
                // last_failure; the retained file is untouched.
                info!(
                    "Disposing failed session {} (file retained at {:?})",
                    s.id(),
                    s.file_path()
                );
            }
            Some(s) if s.state() == SessionState::Finalizing => {
                return Err(ControlError::SessionBusy)
            }
            Some(s) => {
                return Err(ControlError::InvalidTransition {
                    command: Command::Start,
                    state: s.state(),
                })
            }
        }

        let session = RecordingSession::begin(&self.recordings_dir).map_err(|e| {
            error!("Failed to open recording sink: {:#}", e);
            ControlError::Failed(format!("{:#}", e))
        })?;

        slot.session = Some(session);
        Ok(Self::status_of(&slot))
    }

    /// `pause`: Recording → Paused.
    pub async fn pause(&self) -> Result<SessionStatus, ControlError> {
        let mut slot = self.slot.lock().await;
        let session = Self::active_session(&mut slot, Command::Pause)?;
        session.pause()?;
        Ok(Self::status_of(&slot))
    }

    /// `resume`: Paused → Recording.
    pub async fn resume(&self) -> Result<SessionStatus, ControlError> {
        let mut slot = self.slot.lock().await;
        let session = Self::active_session(&mut slot, Command::Resume)?;
        session.resume()?;
        Ok(Self::status_of(&slot))
    }

    /// `stop`: Recording or Paused → Finalizing → Uploading.
    ///
    /// Returns as soon as the upload worker accepts the clip; it never waits
    /// for the upload itself.
    pub async fn stop(&self) -> Result<SessionStatus, ControlError> {
        let mut slot = self.slot.lock().await;
        let session = Self::active_session(&mut slot, Command::Stop)?;

        session.finalize()?;

        let task = UploadTask::new(session.id(), session.file_path().to_path_buf());
        match self.uploader.submit(task).await {
            Ok(()) => {
                session.mark_uploading();
                info!("Session {} handed to upload worker", session.id());
            }
            Err(e) => {
                error!("Upload queue unavailable: {:#}", e);
                let report = Self::failure_report(session, "upload queue unavailable");
                session.fail();
                slot.last_failure = Some(report);
                return Err(ControlError::Failed("upload queue unavailable".into()));
            }
        }

        Ok(Self::status_of(&slot))
    }

    /// Current slot snapshot.
    pub async fn status(&self) -> SessionStatus {
        let slot = self.slot.lock().await;
        Self::status_of(&slot)
    }

    /// Called by the capture loop for every frame. A frame racing a `stop` is
    /// dropped here: the state check and the append happen under the same
    /// lock the stop held while closing the sink.
    pub async fn offer_frame(&self, frame: &Frame) {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.session.as_mut() {
            if let Err(e) = session.offer_frame(frame) {
                error!(
                    "Session {} failed while appending frame {}: {:#}",
                    session.id(),
                    frame.sequence,
                    e
                );
                let report = Self::failure_report(session, &format!("sink append: {:#}", e));
                slot.last_failure = Some(report);
            }
        }
    }

    /// Capture device is gone. Fails a session still writing (or waiting to
    /// write) frames; a clip already handed to the upload worker is left to
    /// finish, since its file is closed and safe on disk. Idempotent, and
    /// blocks any further `start`.
    pub async fn device_lost(&self) {
        let mut slot = self.slot.lock().await;
        if slot.device_lost {
            return;
        }
        slot.device_lost = true;

        if let Some(session) = slot.session.as_mut() {
            if matches!(
                session.state(),
                SessionState::Recording | SessionState::Paused | SessionState::Finalizing
            ) {
                warn!("Capture device lost; failing session {}", session.id());
                let report = Self::failure_report(session, "capture device lost");
                session.fail();
                slot.last_failure = Some(report);
            }
        }
    }

    /// Spawn the task that applies terminal upload outcomes to the slot.
    pub fn spawn_upload_listener(
        self: &Arc<Self>,
        mut outcomes: mpsc::Receiver<UploadOutcome>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(outcome) = outcomes.recv().await {
                controller.apply_upload_outcome(outcome).await;
            }
        })
    }

    async fn apply_upload_outcome(&self, outcome: UploadOutcome) {
        let mut slot = self.slot.lock().await;

        let Some(session) = slot.session.as_mut() else {
            warn!(
                "Upload outcome for session {} but the slot is empty",
                outcome.session_id
            );
            return;
        };

        if session.id() != outcome.session_id || session.state() != SessionState::Uploading {
            warn!(
                "Ignoring upload outcome for session {} (slot holds {} in state {})",
                outcome.session_id,
                session.id(),
                session.state()
            );
            return;
        }

        match outcome.result {
            Ok(key) => {
                // Success is recorded before the local copy goes away; a crash
                // in between leaves the file for resubmission, never data loss.
                info!(
                    "Upload confirmed for session {} as {}; removing local file",
                    session.id(),
                    key
                );
                let path = session.file_path().to_path_buf();
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to remove uploaded clip {:?}: {}", path, e);
                }
                slot.session = None;
            }
            Err(err) => {
                error!(
                    "Upload failed for session {}: {} (file retained at {:?})",
                    session.id(),
                    err,
                    session.file_path()
                );
                let report = Self::failure_report(session, &err.to_string());
                session.fail();
                slot.last_failure = Some(report);
            }
        }
    }

    fn active_session<'a>(
        slot: &'a mut Slot,
        command: Command,
    ) -> Result<&'a mut RecordingSession, ControlError> {
        match slot.session.as_mut() {
            Some(s) if s.state() == SessionState::Finalizing => Err(ControlError::SessionBusy),
            Some(s) => Ok(s),
            None => Err(ControlError::InvalidTransition {
                command,
                state: SessionState::Idle,
            }),
        }
    }

    fn failure_report(session: &RecordingSession, reason: &str) -> FailureReport {
        FailureReport {
            session_id: session.id(),
            file_path: session.file_path().display().to_string(),
            reason: reason.to_string(),
            occurred_at: Utc::now(),
        }
    }

    fn status_of(slot: &Slot) -> SessionStatus {
        match &slot.session {
            Some(s) => SessionStatus {
                state: s.state(),
                session_id: Some(s.id()),
                file_path: Some(s.file_path().display().to_string()),
                frame_count: s.frame_count(),
                started_at: Some(s.started_at()),
                duration_secs: (Utc::now() - s.started_at()).num_milliseconds() as f64 / 1000.0,
                last_failure: slot.last_failure.clone(),
            },
            None => SessionStatus {
                state: SessionState::Idle,
                session_id: None,
                file_path: None,
                frame_count: 0,
                started_at: None,
                duration_secs: 0.0,
                last_failure: slot.last_failure.clone(),
            },
        }
    }
}
