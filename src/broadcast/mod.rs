//! Live frame fan-out to any number of concurrent viewers.
//!
//! Built on `tokio::sync::watch`: the publisher replaces a single latest
//! value, so a slow subscriber never blocks the capture loop or other
//! subscribers — it simply observes the newest frame when it catches up
//! (latest-frame-wins). Nothing is buffered per subscriber.

use std::sync::Arc;

use tokio::sync::watch;

use crate::capture::Frame;

#[derive(Clone)]
enum Signal {
    /// No frame published yet.
    Pending,
    Frame(Arc<Frame>),
    /// The source is gone; every feed ends.
    Ended,
}

pub struct StreamBroadcaster {
    tx: watch::Sender<Signal>,
}

impl StreamBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Signal::Pending);
        Self { tx }
    }

    /// Publish the latest frame. Never blocks; called only by the capture loop.
    pub fn publish(&self, frame: Arc<Frame>) {
        self.tx.send_replace(Signal::Frame(frame));
    }

    /// End the stream for every subscriber (device lost or shutdown).
    pub fn close(&self) {
        self.tx.send_replace(Signal::Ended);
    }

    /// A fresh feed that yields frames published from now on.
    pub fn subscribe(&self) -> FrameFeed {
        FrameFeed {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StreamBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's lazy, non-restartable frame sequence.
///
/// Dropping the feed detaches the subscriber; no explicit unsubscribe exists.
pub struct FrameFeed {
    rx: watch::Receiver<Signal>,
}

impl FrameFeed {
    /// The next frame in capture order, or `None` once the stream has ended.
    ///
    /// Frames published while the caller was busy are skipped in favor of the
    /// newest one.
    pub async fn next(&mut self) -> Option<Arc<Frame>> {
        // A feed created after close() must not hang waiting for a change.
        if matches!(&*self.rx.borrow(), Signal::Ended) {
            return None;
        }

        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }

            let signal = self.rx.borrow_and_update().clone();
            match signal {
                Signal::Frame(frame) => return Some(frame),
                Signal::Ended => return None,
                Signal::Pending => continue,
            }
        }
    }
}
