//! HTTP control surface and live view
//!
//! This module provides the operator-facing API:
//! - GET /video_feed - Live MJPEG stream (multipart/x-mixed-replace)
//! - POST /record/start|pause|resume|stop - Recording control
//! - GET /record/status - Query the recording slot
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
