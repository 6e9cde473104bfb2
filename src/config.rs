use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub camera: CameraConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// "synthetic" or a V4L2 device path such as "/dev/video0"
    pub source: String,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingConfig {
    /// Where in-progress and retained clips live
    pub output_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Object store root directory
    pub root: String,
    /// Destination key prefix for uploaded clips
    pub key_prefix: String,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Config {
    /// Load from `<path>.toml` (or any format the config crate recognizes);
    /// a missing file falls back to the coded defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "camcast")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 5001_i64)?
            .set_default("camera.source", "synthetic")?
            .set_default("camera.fps", 20_i64)?
            .set_default("camera.width", 640_i64)?
            .set_default("camera.height", 480_i64)?
            .set_default("recording.output_dir", "recordings")?
            .set_default("storage.root", "remote-store")?
            .set_default("storage.key_prefix", "videos")?
            .set_default("storage.max_attempts", 5_i64)?
            .set_default("storage.initial_backoff_ms", 500_i64)?
            .set_default("storage.max_backoff_ms", 30_000_i64)?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
