use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::device::{CaptureDevice, CaptureError};
use super::frame::Frame;
use crate::broadcast::StreamBroadcaster;
use crate::session::RecordingController;

/// Consecutive transient read failures before the device is treated as lost.
const MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// The capture loop: pulls frames from the device at its native rate and
/// fans them out to the broadcaster and the recording controller.
///
/// A transient read error drops that frame and continues; three in a row
/// escalate to device loss, which fails any active recording session and
/// closes every viewer stream.
pub struct FrameSource {
    device: Box<dyn CaptureDevice>,
    broadcaster: Arc<StreamBroadcaster>,
    controller: Arc<RecordingController>,
}

impl FrameSource {
    pub fn new(
        device: Box<dyn CaptureDevice>,
        broadcaster: Arc<StreamBroadcaster>,
        controller: Arc<RecordingController>,
    ) -> Self {
        Self {
            device,
            broadcaster,
            controller,
        }
    }

    /// Run the capture loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!("Capture loop started ({})", self.device.name());

        let mut sequence: u64 = 0;
        let mut dropped: u64 = 0;
        let mut consecutive_errors: u32 = 0;

        loop {
            match self.device.read_frame().await {
                Ok(data) => {
                    consecutive_errors = 0;

                    let frame = Arc::new(Frame {
                        data,
                        sequence,
                        captured_at: Utc::now(),
                    });
                    sequence += 1;

                    self.broadcaster.publish(Arc::clone(&frame));
                    self.controller.offer_frame(&frame).await;
                }
                Err(CaptureError::Frame(reason)) => {
                    dropped += 1;
                    consecutive_errors += 1;
                    warn!(
                        "Dropped frame: {} ({} consecutive errors)",
                        reason, consecutive_errors
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!(
                            "{} consecutive capture errors, treating device as lost",
                            consecutive_errors
                        );
                        break;
                    }
                }
                Err(CaptureError::DeviceLost(reason)) => {
                    error!("Capture device lost: {}", reason);
                    break;
                }
            }
        }

        // Teardown order matters: fail the session first so a status query
        // racing the shutdown never sees a live session on a dead device.
        self.controller.device_lost().await;
        self.broadcaster.close();

        info!(
            "Capture loop stopped: {} frames published, {} dropped",
            sequence, dropped
        );
    }
}
