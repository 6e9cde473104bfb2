use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::SessionState;

/// Snapshot of the recording slot, as reported by the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Current state of the slot
    pub state: SessionState,

    /// Session identifier, if a session exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,

    /// Local clip path (retained after a terminal failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Frames appended to the sink so far
    pub frame_count: u64,

    /// When the session started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since the session started
    pub duration_secs: f64,

    /// Most recent terminal failure, kept queryable after disposal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<FailureReport>,
}

/// Operator-visible record of a session that ended in Failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub session_id: Uuid,
    /// Where the unreclaimed local clip lives
    pub file_path: String,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}
