// Integration tests for the live-frame broadcaster: capture ordering,
// latest-frame-wins under a slow subscriber, and end-of-stream on close.

use bytes::Bytes;
use camcast::{Frame, StreamBroadcaster};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

fn frame(sequence: u64) -> Arc<Frame> {
    Arc::new(Frame {
        data: Bytes::from(vec![0xFF, 0xD8, sequence as u8, 0xFF, 0xD9]),
        sequence,
        captured_at: Utc::now(),
    })
}

#[tokio::test]
async fn subscriber_sees_frames_in_capture_order() {
    let broadcaster = Arc::new(StreamBroadcaster::new());
    let mut feed = broadcaster.subscribe();

    let publisher = {
        let broadcaster = Arc::clone(&broadcaster);
        tokio::spawn(async move {
            for i in 0..10 {
                broadcaster.publish(frame(i));
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            broadcaster.close();
        })
    };

    let mut seen = Vec::new();
    while let Some(f) = feed.next().await {
        seen.push(f.sequence);
    }
    publisher.await.unwrap();

    assert!(!seen.is_empty(), "a live subscriber should receive frames");
    assert!(
        seen.windows(2).all(|w| w[0] < w[1]),
        "sequences must be strictly increasing, got {:?}",
        seen
    );
}

#[tokio::test]
async fn slow_subscriber_gets_latest_frame_not_a_backlog() {
    let broadcaster = StreamBroadcaster::new();
    let mut feed = broadcaster.subscribe();

    // Publish a burst while the subscriber is not polling. Nothing buffers:
    // the feed must resume at the newest frame.
    for i in 0..10 {
        broadcaster.publish(frame(i));
    }

    let f = feed.next().await.expect("latest frame available");
    assert_eq!(f.sequence, 9);

    broadcaster.close();
    assert!(feed.next().await.is_none());
}

#[tokio::test]
async fn publish_never_blocks_without_consumers() {
    let broadcaster = StreamBroadcaster::new();
    let _idle_feed = broadcaster.subscribe();

    // A subscriber that never polls must not make publishing block or grow
    // a queue; publish() is synchronous and completes immediately.
    for i in 0..10_000 {
        broadcaster.publish(frame(i));
    }

    assert_eq!(broadcaster.subscriber_count(), 1);
}

#[tokio::test]
async fn slow_viewer_does_not_stall_a_fast_viewer() {
    let broadcaster = Arc::new(StreamBroadcaster::new());
    let mut fast = broadcaster.subscribe();
    let mut slow = broadcaster.subscribe();

    let publisher = {
        let broadcaster = Arc::clone(&broadcaster);
        tokio::spawn(async move {
            for i in 0..20 {
                broadcaster.publish(frame(i));
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            // Give consumers a beat to observe the final frame before ending.
            tokio::time::sleep(Duration::from_millis(20)).await;
            broadcaster.close();
        })
    };

    let fast_task = tokio::spawn(async move {
        let mut count = 0;
        while fast.next().await.is_some() {
            count += 1;
        }
        count
    });
    let slow_task = tokio::spawn(async move {
        let mut count = 0;
        while slow.next().await.is_some() {
            count += 1;
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        count
    });

    publisher.await.unwrap();
    let fast_count: u32 = fast_task.await.unwrap();
    let slow_count: u32 = slow_task.await.unwrap();

    assert!(fast_count >= slow_count, "slow viewer must not gate the fast one");
    assert!(fast_count >= 5, "fast viewer should keep up, saw {}", fast_count);
}

#[tokio::test]
async fn subscribe_after_close_ends_immediately() {
    let broadcaster = StreamBroadcaster::new();
    broadcaster.publish(frame(0));
    broadcaster.close();

    let mut feed = broadcaster.subscribe();
    assert!(feed.next().await.is_none());
}
