use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Live MJPEG view
        .route("/video_feed", get(handlers::video_feed))
        // Recording control
        .route("/record/start", post(handlers::start_recording))
        .route("/record/pause", post(handlers::pause_recording))
        .route("/record/resume", post(handlers::resume_recording))
        .route("/record/stop", post(handlers::stop_recording))
        // Recording queries
        .route("/record/status", get(handlers::recording_status))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
