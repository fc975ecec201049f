//! Tests for timed playback over a record channel

use chrono::{Duration as ChronoDuration, Utc};
use geopulse_core::MentionRecord;
use geopulse_runtime::playback::{spawn_playback, Playback, ALERT_PERIOD, DEFAULT_PERIOD};
use std::time::Duration;
use tokio::sync::mpsc;

fn ascending_records(n: usize) -> Vec<MentionRecord> {
    let base = Utc::now();
    (0..n)
        .map(|i| {
            MentionRecord::new(format!("place-{}", i), base + ChronoDuration::seconds(i as i64))
        })
        .collect()
}

#[tokio::test]
async fn test_playback_emits_all_records_in_order() {
    let playback = Playback::new(ascending_records(5), Duration::from_millis(10));
    let (tx, mut rx) = mpsc::channel(16);
    let _handle = spawn_playback(playback, tx);

    let mut labels = Vec::new();
    let result = tokio::time::timeout(Duration::from_secs(1), async {
        while let Some(record) = rx.recv().await {
            labels.push(record.raw_text);
        }
    })
    .await;

    assert!(result.is_ok(), "playback should drain within the timeout");
    assert_eq!(
        labels,
        vec!["place-0", "place-1", "place-2", "place-3", "place-4"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_emission_schedule_at_default_period() {
    let playback = Playback::new(ascending_records(3), DEFAULT_PERIOD);
    let (tx, mut rx) = mpsc::channel(16);
    let _handle = spawn_playback(playback, tx);

    let started = tokio::time::Instant::now();

    // The interval's immediate tick is skipped, so the first record lands
    // one full period in.
    for expected_ms in [400, 800, 1200] {
        assert!(rx.recv().await.is_some());
        assert_eq!(started.elapsed(), Duration::from_millis(expected_ms));
    }

    // The stop transition happens on the tick after the last record, so
    // the channel closes one further period in.
    assert!(rx.recv().await.is_none());
    assert_eq!(started.elapsed(), Duration::from_millis(1600));
}

#[tokio::test(start_paused = true)]
async fn test_alert_cadence_is_slower() {
    let playback = Playback::new(ascending_records(1), ALERT_PERIOD);
    let (tx, mut rx) = mpsc::channel(16);
    let _handle = spawn_playback(playback, tx);

    let started = tokio::time::Instant::now();
    assert!(rx.recv().await.is_some());
    assert_eq!(started.elapsed(), Duration::from_millis(1200));
}

#[tokio::test]
async fn test_empty_playback_closes_channel_without_emitting() {
    let playback = Playback::new(Vec::new(), Duration::from_millis(10));
    let (tx, mut rx) = mpsc::channel(16);
    let handle = spawn_playback(playback, tx);

    let first = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(
        matches!(first, Ok(None)),
        "channel should close with no records"
    );
    assert!(handle.join().await.is_ok());
}

#[tokio::test]
async fn test_abort_stops_emission() {
    let playback = Playback::new(ascending_records(100), Duration::from_millis(10));
    let (tx, mut rx) = mpsc::channel(16);
    let handle = spawn_playback(playback, tx);

    // Take a couple of records, then pull the plug.
    assert!(rx.recv().await.is_some());
    assert!(rx.recv().await.is_some());
    handle.abort();

    let mut after_abort = 0;
    while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await {
        after_abort += 1;
    }
    assert!(
        after_abort < 50,
        "abort should stop the stream well short of all records, got {} more",
        after_abort
    );
}

#[tokio::test]
async fn test_receiver_drop_ends_playback_task() {
    let playback = Playback::new(ascending_records(100), Duration::from_millis(10));
    let (tx, rx) = mpsc::channel(16);
    let handle = spawn_playback(playback, tx);
    drop(rx);

    let joined = tokio::time::timeout(Duration::from_secs(1), handle.join()).await;
    assert!(
        joined.is_ok(),
        "playback task should notice the closed channel and end"
    );
}
