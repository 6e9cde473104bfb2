use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{error, info};
use uuid::Uuid;

use super::sink::FrameSink;
use super::state::{Command, ControlError, SessionState};
use crate::capture::Frame;

/// One recording attempt, from `start` to disposal.
///
/// Holds the state machine and the sink file. All mutation goes through the
/// controller's slot lock; this type never synchronizes on its own.
pub struct RecordingSession {
    id: Uuid,
    state: SessionState,
    sink: FrameSink,
    started_at: DateTime<Utc>,
    frame_count: u64,
    discarded_while_paused: u64,
}

impl RecordingSession {
    /// Open a fresh sink file under `dir` and enter Recording.
    pub fn begin(dir: &Path) -> Result<Self> {
        let id = Uuid::new_v4();
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let short: String = id.simple().to_string().chars().take(8).collect();
        let path = dir.join(format!("recorded_stream_{}_{}.mjpeg", stamp, short));

        let sink = FrameSink::create(path)?;
        info!("Session {} recording to {:?}", id, sink.path());

        Ok(Self {
            id,
            state: SessionState::Recording,
            sink,
            started_at: Utc::now(),
            frame_count: 0,
            discarded_while_paused: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn file_path(&self) -> &Path {
        self.sink.path()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Append while Recording; discard (counted) while Paused; drop otherwise.
    /// A sink I/O error fails the session, keeping the partial file on disk.
    pub fn offer_frame(&mut self, frame: &Frame) -> Result<()> {
        match self.state {
            SessionState::Recording => {
                if let Err(e) = self.sink.append(frame) {
                    self.fail();
                    return Err(e);
                }
                self.frame_count += 1;
            }
            SessionState::Paused => {
                self.discarded_while_paused += 1;
            }
            // A frame racing a stop or teardown is simply dropped.
            _ => {}
        }

        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), ControlError> {
        self.expect(SessionState::Recording, Command::Pause)?;
        self.state = SessionState::Paused;
        info!("Session {} paused at frame {}", self.id, self.frame_count);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), ControlError> {
        self.expect(SessionState::Paused, Command::Resume)?;
        self.state = SessionState::Recording;
        info!(
            "Session {} resumed ({} frames discarded while paused)",
            self.id, self.discarded_while_paused
        );
        Ok(())
    }

    /// Close the sink (exactly once) and enter Finalizing.
    pub fn finalize(&mut self) -> Result<(), ControlError> {
        match self.state {
            SessionState::Recording | SessionState::Paused => {}
            state => {
                return Err(ControlError::InvalidTransition {
                    command: Command::Stop,
                    state,
                })
            }
        }

        if let Err(e) = self.sink.finish() {
            error!("Session {} failed to close sink: {:#}", self.id, e);
            self.state = SessionState::Failed;
            return Err(ControlError::Failed(format!("{:#}", e)));
        }

        self.state = SessionState::Finalizing;
        info!(
            "Session {} finalized: {} frames, {} bytes",
            self.id,
            self.frame_count,
            self.sink.bytes_written()
        );
        Ok(())
    }

    /// The upload worker accepted the clip.
    pub fn mark_uploading(&mut self) {
        self.state = SessionState::Uploading;
    }

    /// Terminal failure. Closes the sink if still open; the file is retained
    /// for manual recovery. Idempotent.
    pub fn fail(&mut self) {
        if self.sink.is_open() {
            if let Err(e) = self.sink.finish() {
                error!("Session {} sink close during failure: {:#}", self.id, e);
            }
        }
        self.state = SessionState::Failed;
    }

    fn expect(&self, wanted: SessionState, command: Command) -> Result<(), ControlError> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(ControlError::InvalidTransition {
                command,
                state: self.state,
            })
        }
    }
}
