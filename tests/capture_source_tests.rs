// Integration tests for the capture loop: transient errors drop frames
// without escalating, three consecutive errors become device loss, and
// device loss fails the active session and ends every viewer stream.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use camcast::{
    CaptureDevice, CaptureError, ControlError, FrameSource, FsObjectStore, RecordingController,
    SessionState, StreamBroadcaster, UploadConfig, UploadWorker,
};
use std::collections::VecDeque;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Plays back a fixed script of reads, then reports the device gone.
struct ScriptedDevice {
    steps: VecDeque<Result<Bytes, CaptureError>>,
}

impl ScriptedDevice {
    fn new(steps: Vec<Result<Bytes, CaptureError>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

fn jpeg() -> Bytes {
    Bytes::from_static(&[0xFF, 0xD8, 0x00, 0xFF, 0xD9])
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn read_frame(&mut self) -> Result<Bytes, CaptureError> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.steps
            .pop_front()
            .unwrap_or_else(|| Err(CaptureError::DeviceLost("end of script".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn harness(tmp: &TempDir) -> Result<(Arc<RecordingController>, Arc<StreamBroadcaster>)> {
    let recordings = tmp.path().join("recordings");
    fs::create_dir_all(&recordings)?;
    let store = Arc::new(FsObjectStore::new(tmp.path().join("remote"))?);
    let (uploader, outcomes) = UploadWorker::spawn(
        store,
        UploadConfig {
            initial_backoff: Duration::from_millis(1),
            ..UploadConfig::default()
        },
    );
    let controller = Arc::new(RecordingController::new(uploader, recordings));
    controller.spawn_upload_listener(outcomes);
    Ok((controller, Arc::new(StreamBroadcaster::new())))
}

#[tokio::test]
async fn three_consecutive_transient_errors_escalate_to_device_lost() -> Result<()> {
    let tmp = TempDir::new()?;
    let (controller, broadcaster) = harness(&tmp)?;

    controller.start().await?;

    let device = ScriptedDevice::new(vec![
        Ok(jpeg()),
        Ok(jpeg()),
        Err(CaptureError::Frame("short read".to_string())),
        Err(CaptureError::Frame("short read".to_string())),
        Err(CaptureError::Frame("short read".to_string())),
    ]);
    let mut feed = broadcaster.subscribe();

    let source = FrameSource::new(
        Box::new(device),
        Arc::clone(&broadcaster),
        Arc::clone(&controller),
    );
    source.spawn().await?;

    // The active session is failed, with its partial file retained.
    let status = controller.status().await;
    assert_eq!(status.state, SessionState::Failed);
    assert_eq!(status.frame_count, 2);

    // New recordings are refused.
    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, ControlError::DeviceLost));

    // Viewers get a distinguishable end-of-stream instead of hanging.
    loop {
        match tokio::time::timeout(Duration::from_secs(1), feed.next()).await {
            Ok(None) => break,
            Ok(Some(_)) => continue,
            Err(_) => panic!("feed should end after device loss"),
        }
    }

    Ok(())
}

#[tokio::test]
async fn isolated_transient_errors_only_drop_frames() -> Result<()> {
    let tmp = TempDir::new()?;
    let (controller, broadcaster) = harness(&tmp)?;

    controller.start().await?;

    // Errors interleaved with good reads never accumulate to three.
    let device = ScriptedDevice::new(vec![
        Ok(jpeg()),
        Err(CaptureError::Frame("glitch".to_string())),
        Ok(jpeg()),
        Err(CaptureError::Frame("glitch".to_string())),
        Err(CaptureError::Frame("glitch".to_string())),
        Ok(jpeg()),
        Err(CaptureError::DeviceLost("unplugged".to_string())),
    ]);

    let source = FrameSource::new(
        Box::new(device),
        Arc::clone(&broadcaster),
        Arc::clone(&controller),
    );
    source.spawn().await?;

    // All three good frames reached the session before the device died.
    let status = controller.status().await;
    assert_eq!(status.state, SessionState::Failed);
    assert_eq!(status.frame_count, 3);

    Ok(())
}
