use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Capture failure classes.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Transient per-frame failure. The frame is dropped and capture continues.
    #[error("frame read failed: {0}")]
    Frame(String),

    /// The device is gone and capture cannot continue.
    #[error("capture device lost: {0}")]
    DeviceLost(String),
}

/// Camera capture abstraction
///
/// Devices hand back frames already encoded as JPEG; driver and codec details
/// live behind this trait. Treated as unreliable: any read may fail.
#[async_trait]
pub trait CaptureDevice: Send {
    /// Read the next frame at the device's native pace.
    async fn read_frame(&mut self) -> Result<Bytes, CaptureError>;

    /// Device name for logging.
    fn name(&self) -> &str;
}

/// Capture device configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target frames per second
    pub fps: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 20,
            width: 640,
            height: 480,
        }
    }
}

/// Which camera to open.
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Built-in test-pattern generator
    Synthetic,
    /// A V4L2 device node such as `/dev/video0`
    V4l2(String),
}

impl CaptureSource {
    /// Parse the `camera.source` config value.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("synthetic") {
            Self::Synthetic
        } else {
            Self::V4l2(value.to_string())
        }
    }
}

/// Capture device factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    /// Create a capture device from configuration.
    pub fn create(source: CaptureSource, config: CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
        match source {
            CaptureSource::Synthetic => Ok(Box::new(SyntheticDevice::new(config))),
            CaptureSource::V4l2(path) => {
                anyhow::bail!(
                    "V4L2 capture is not wired up in this build (requested {}); use the synthetic source",
                    path
                )
            }
        }
    }
}

/// Test-pattern generator that paces itself at the configured frame rate.
pub struct SyntheticDevice {
    ticker: Interval,
    frame_index: u64,
    payload_len: usize,
    width: u32,
}

impl SyntheticDevice {
    pub fn new(config: CaptureConfig) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(config.fps.max(1)));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Self {
            ticker,
            frame_index: 0,
            payload_len: ((config.width * config.height) / 256).max(64) as usize,
            width: config.width.max(1),
        }
    }

    fn test_pattern(&self) -> Bytes {
        let mut data = Vec::with_capacity(self.payload_len + 4);
        data.extend_from_slice(&[0xFF, 0xD8]); // SOI
        let phase = (self.frame_index % u64::from(self.width)) as u8;
        data.extend((0..self.payload_len).map(|i| (i as u8).wrapping_add(phase)));
        data.extend_from_slice(&[0xFF, 0xD9]); // EOI
        Bytes::from(data)
    }
}

#[async_trait]
impl CaptureDevice for SyntheticDevice {
    async fn read_frame(&mut self) -> Result<Bytes, CaptureError> {
        self.ticker.tick().await;
        let frame = self.test_pattern();
        self.frame_index += 1;
        Ok(frame)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
