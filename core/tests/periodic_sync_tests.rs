//! Behavioural tests for the periodic sync loop
//!
//! All tests run on a paused tokio clock so timer-driven behaviour is
//! deterministic: the runtime jumps straight to the next pending timer
//! whenever every task is idle.

use naija_core::{FetchError, PeriodicValueSync, SyncError, SyncStatus};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PERIOD: Duration = Duration::from_secs(60);

/// Let the spawned loop run up to its next suspension point
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_successive_ticks_update_value() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "rate",
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<u64, FetchError>(42 + n) }
        },
        PERIOD,
    )
    .unwrap();

    settle().await;
    let first = handle.current_value();
    assert_eq!(first.value(), Some(&42));
    assert_eq!(first.status(), SyncStatus::Ready);

    tokio::time::sleep(PERIOD).await;
    let second = handle.current_value();
    assert_eq!(second.value(), Some(&43));
    assert_eq!(second.status(), SyncStatus::Ready);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failure_then_recovery() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "balance",
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(FetchError::Network("connection refused".into()))
                } else {
                    Ok(7u64)
                }
            }
        },
        PERIOD,
    )
    .unwrap();

    settle().await;
    let failed = handle.current_value();
    assert_eq!(failed.value(), None);
    assert_eq!(failed.status(), SyncStatus::Error);
    assert_eq!(
        failed.last_error(),
        Some(&FetchError::Network("connection refused".into()))
    );

    tokio::time::sleep(PERIOD).await;
    let recovered = handle.current_value();
    assert_eq!(recovered.value(), Some(&7));
    assert_eq!(recovered.status(), SyncStatus::Ready);
    assert!(recovered.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_error_keeps_stale_value() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "balance",
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(5u64)
                } else {
                    Err(FetchError::Decode("unexpected clarity type".into()))
                }
            }
        },
        PERIOD,
    )
    .unwrap();

    settle().await;
    let ready_at = handle.current_value().last_fetched_at();
    assert!(ready_at.is_some());

    tokio::time::sleep(PERIOD).await;
    let v = handle.current_value();
    assert_eq!(v.value(), Some(&5));
    assert_eq!(v.status(), SyncStatus::Error);
    assert_eq!(v.last_fetched_at(), ready_at);

    // Failures keep the loop alive
    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(handle.current_value().value(), Some(&5));
}

#[tokio::test(start_paused = true)]
async fn test_slow_fetches_never_overlap() {
    let calls = Arc::new(AtomicU64::new(0));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let (c, f, m) = (
        Arc::clone(&calls),
        Arc::clone(&in_flight),
        Arc::clone(&max_in_flight),
    );
    let period = Duration::from_secs(1);
    let _handle = PeriodicValueSync::start(
        "slow",
        move || {
            let (c, f, m) = (Arc::clone(&c), Arc::clone(&f), Arc::clone(&m));
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                let now = f.fetch_add(1, Ordering::SeqCst) + 1;
                m.fetch_max(now, Ordering::SeqCst);
                // Takes three periods to resolve
                tokio::time::sleep(Duration::from_secs(3)).await;
                f.fetch_sub(1, Ordering::SeqCst);
                Ok::<u64, FetchError>(n)
            }
        },
        period,
    )
    .unwrap();

    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    // One fetch per 3s fetch + 1s wait
    let total = calls.load(Ordering::SeqCst);
    assert!((4..=6).contains(&total), "unexpected call count {}", total);
}

#[tokio::test(start_paused = true)]
async fn test_result_after_stop_is_discarded() {
    let handle = PeriodicValueSync::start(
        "delayed",
        || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<u64, FetchError>(99)
        },
        PERIOD,
    )
    .unwrap();
    let mut rx = handle.subscribe();

    settle().await;
    let before = handle.current_value();
    assert_eq!(before.status(), SyncStatus::Loading);
    let _ = rx.borrow_and_update();

    handle.stop();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(handle.current_value(), before);
    assert!(!rx.has_changed().unwrap_or(false));
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_cycle_freezes_snapshot() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "balance",
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n > 0 {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                Ok::<u64, FetchError>(n + 1)
            }
        },
        Duration::from_secs(10),
    )
    .unwrap();

    // Second fetch is in flight at t=15s
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert!(handle.is_fetching());
    let before = handle.current_value();
    assert_eq!(before.value(), Some(&1));

    handle.stop();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(handle.current_value(), before);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!handle.is_fetching());
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_first_poll_starts_no_fetch() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "rate",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<u64, FetchError>(1) }
        },
        PERIOD,
    )
    .unwrap();

    // The loop task has not been polled yet on this runtime
    handle.stop();
    tokio::time::sleep(PERIOD * 3).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!handle.is_fetching());
    assert_eq!(handle.current_value().value(), None);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "rate",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<u64, FetchError>(1) }
        },
        PERIOD,
    )
    .unwrap();

    settle().await;
    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());
    assert!(!handle.refresh_now());

    tokio::time::sleep(PERIOD * 5).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_stops_loop() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "rate",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<u64, FetchError>(1) }
        },
        PERIOD,
    )
    .unwrap();

    settle().await;
    drop(handle);
    tokio::time::sleep(PERIOD * 5).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_now_fetches_immediately() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "balance",
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<u64, FetchError>(n + 1) }
        },
        PERIOD,
    )
    .unwrap();

    settle().await;
    assert_eq!(handle.current_value().value(), Some(&1));

    assert!(handle.refresh_now());
    settle().await;
    assert_eq!(handle.current_value().value(), Some(&2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_while_fetching_is_dropped() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);
    let handle = PeriodicValueSync::start(
        "balance",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<u64, FetchError>(1)
            }
        },
        PERIOD,
    )
    .unwrap();

    settle().await;
    assert!(handle.is_fetching());
    assert!(!handle.refresh_now());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(handle.current_value().status(), SyncStatus::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timestamps_are_monotonic() {
    let handle = PeriodicValueSync::start(
        "rate",
        || async { Ok::<u64, FetchError>(1500) },
        Duration::from_secs(1),
    )
    .unwrap();

    let mut seen = Vec::new();
    for _ in 0..5 {
        settle().await;
        if let Some(at) = handle.current_value().last_fetched_at() {
            seen.push(at);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    assert_eq!(seen.len(), 5);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_instances_are_independent() {
    let rate = PeriodicValueSync::start(
        "rate",
        || async { Ok::<u64, FetchError>(1500) },
        PERIOD,
    )
    .unwrap();
    let balance = PeriodicValueSync::start(
        "balance",
        || async { Ok::<u64, FetchError>(2_000_000) },
        PERIOD,
    )
    .unwrap();

    settle().await;
    balance.stop();

    assert!(!rate.is_stopped());
    assert!(rate.refresh_now());
    settle().await;
    assert_eq!(rate.current_value().value(), Some(&1500));
    assert_eq!(balance.current_value().value(), Some(&2_000_000));
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_committed_values() {
    let handle = PeriodicValueSync::start(
        "rate",
        || async { Ok::<u64, FetchError>(1500) },
        PERIOD,
    )
    .unwrap();
    let mut rx = handle.subscribe();

    let ready = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|v| v.status() == SyncStatus::Ready),
    )
    .await
    .expect("sync never became ready")
    .expect("sync dropped");
    assert_eq!(ready.value(), Some(&1500));
}

#[test]
fn test_zero_period_is_rejected() {
    let result = PeriodicValueSync::start(
        "never",
        || async { Ok::<u64, FetchError>(0) },
        Duration::ZERO,
    );
    assert!(matches!(result, Err(SyncError::ZeroPeriod(_))));
}
