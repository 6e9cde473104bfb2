use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use camcast::{
    create_router, AppState, CaptureConfig, CaptureDeviceFactory, CaptureSource, Config,
    FrameSource, FsObjectStore, RecordingController, StreamBroadcaster, UploadConfig, UploadWorker,
};
use clap::Parser;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "camcast", about = "Camera recorder with live view and remote upload")]
struct Args {
    /// Config file stem (e.g. config/camcast for config/camcast.toml)
    #[arg(long, default_value = "config/camcast")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("camcast v0.1.0");
    info!("Service: {}", cfg.service.name);
    info!("Camera source: {} @ {} fps", cfg.camera.source, cfg.camera.fps);

    let recordings_dir = PathBuf::from(&cfg.recording.output_dir);
    std::fs::create_dir_all(&recordings_dir)?;

    let store = Arc::new(FsObjectStore::new(&cfg.storage.root)?);
    let upload_config = UploadConfig {
        max_attempts: cfg.storage.max_attempts,
        initial_backoff: Duration::from_millis(cfg.storage.initial_backoff_ms),
        max_backoff: Duration::from_millis(cfg.storage.max_backoff_ms),
        key_prefix: cfg.storage.key_prefix.clone(),
    };
    let (uploader, outcomes) = UploadWorker::spawn(store, upload_config);

    let controller = Arc::new(RecordingController::new(uploader, recordings_dir));
    controller.spawn_upload_listener(outcomes);

    let broadcaster = Arc::new(StreamBroadcaster::new());

    let device = CaptureDeviceFactory::create(
        CaptureSource::parse(&cfg.camera.source),
        CaptureConfig {
            fps: cfg.camera.fps,
            width: cfg.camera.width,
            height: cfg.camera.height,
        },
    )?;
    FrameSource::new(device, Arc::clone(&broadcaster), Arc::clone(&controller)).spawn();

    let app = create_router(AppState {
        controller,
        broadcaster,
    });

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
