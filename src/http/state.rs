use std::sync::Arc;

use crate::broadcast::StreamBroadcaster;
use crate::session::RecordingController;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Serialized command path for the recording slot
    pub controller: Arc<RecordingController>,

    /// Live frame fan-out for `/video_feed` viewers
    pub broadcaster: Arc<StreamBroadcaster>,
}
