use super::state::AppState;
use crate::broadcast::FrameFeed;
use crate::session::ControlError;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use serde::Serialize;
use std::convert::Infallible;
use tracing::info;

const BOUNDARY: &str = "frame";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable error code (InvalidTransition, SessionBusy, DeviceLost, ...)
    pub error: String,
    pub message: String,
}

fn control_error_response(err: ControlError) -> Response {
    let status = match &err {
        ControlError::InvalidTransition { .. } | ControlError::SessionBusy => StatusCode::CONFLICT,
        ControlError::DeviceLost => StatusCode::SERVICE_UNAVAILABLE,
        ControlError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.code().to_string(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /record/start
pub async fn start_recording(State(state): State<AppState>) -> Response {
    match state.controller.start().await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => control_error_response(e),
    }
}

/// POST /record/pause
pub async fn pause_recording(State(state): State<AppState>) -> Response {
    match state.controller.pause().await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => control_error_response(e),
    }
}

/// POST /record/resume
pub async fn resume_recording(State(state): State<AppState>) -> Response {
    match state.controller.resume().await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => control_error_response(e),
    }
}

/// POST /record/stop
///
/// Returns once the clip is accepted by the upload worker; never blocks on
/// upload completion.
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    match state.controller.stop().await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => control_error_response(e),
    }
}

/// GET /record/status
pub async fn recording_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.status().await)
}

/// GET /video_feed
///
/// Long-lived MJPEG stream: one multipart chunk per frame, fed from a fresh
/// broadcaster subscription. Ends when the client disconnects or the capture
/// source is lost (the feed yields `None`).
pub async fn video_feed(State(state): State<AppState>) -> impl IntoResponse {
    let feed = state.broadcaster.subscribe();
    info!(
        "Live viewer connected ({} subscribed)",
        state.broadcaster.subscriber_count()
    );

    let stream = futures::stream::unfold(feed, |mut feed: FrameFeed| async move {
        let frame = feed.next().await?;

        let mut part = Vec::with_capacity(frame.data.len() + 64);
        part.extend_from_slice(
            format!("--{}\r\nContent-Type: image/jpeg\r\n\r\n", BOUNDARY).as_bytes(),
        );
        part.extend_from_slice(&frame.data);
        part.extend_from_slice(b"\r\n");

        Some((Ok::<_, Infallible>(Bytes::from(part)), feed))
    });

    (
        [(
            header::CONTENT_TYPE,
            format!("multipart/x-mixed-replace; boundary={}", BOUNDARY),
        )],
        Body::from_stream(stream),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
