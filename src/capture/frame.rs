use bytes::Bytes;
use chrono::{DateTime, Utc};

/// One captured image, immutable after creation.
///
/// Frames are shared by reference (`Arc<Frame>`) between the broadcaster and
/// the recording session. The capture loop replaces the latest-frame value
/// rather than mutating buffer contents, so consumers never observe a
/// half-written frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Encoded JPEG bytes.
    pub data: Bytes,

    /// Position in the capture sequence, starting at 0.
    pub sequence: u64,

    /// When the frame was read from the device.
    pub captured_at: DateTime<Utc>,
}
