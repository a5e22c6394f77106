//! Periodic synchronization of a single externally-sourced value
//!
//! A [`PeriodicValueSync`] keeps one value (an exchange rate, a balance) close
//! to its remote source by re-fetching it on a fixed period from a background
//! tokio task. Consumers read the latest committed [`SyncedValue`] snapshot
//! through the returned [`SyncHandle`] or subscribe to every change.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Loading -> Ready | Error -> Loading -> ...
//! ```
//!
//! `stop` is reachable from every state and is terminal. After it returns no
//! further state mutation is observable, even if a fetch issued before the
//! stop resolves later: its result is discarded.
//!
//! # Scheduling
//!
//! The timer restarts when a fetch completes, so at most one fetch per handle
//! is ever outstanding. A refresh requested while a fetch is in flight is
//! dropped rather than queued. Failures never end the loop; the period acts as
//! the retry interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{FetchError, SyncError};

/// Fetch status of a [`SyncedValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// No fetch has been started yet
    Idle,
    /// A fetch is outstanding
    Loading,
    /// The last fetch succeeded
    Ready,
    /// The last fetch failed; any earlier value is still held
    Error,
}

/// Snapshot of a synchronized value.
///
/// `status == Ready` implies `value` is set. A failed fetch never clears a
/// value obtained earlier: stale data is preferred over blanking the view.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedValue<T> {
    value: Option<T>,
    status: SyncStatus,
    last_fetched_at: Option<DateTime<Utc>>,
    last_error: Option<FetchError>,
}

impl<T> Default for SyncedValue<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> SyncedValue<T> {
    /// Nothing fetched yet
    pub fn idle() -> Self {
        Self {
            value: None,
            status: SyncStatus::Idle,
            last_fetched_at: None,
            last_error: None,
        }
    }

    /// A value fetched successfully at `fetched_at`
    pub fn ready(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self {
            value: Some(value),
            status: SyncStatus::Ready,
            last_fetched_at: Some(fetched_at),
            last_error: None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.last_fetched_at
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == SyncStatus::Loading
    }

    /// True when nothing has been fetched yet, or the last successful fetch is
    /// older than `window` at `now`.
    pub fn is_stale(&self, window: Duration, now: DateTime<Utc>) -> bool {
        let Some(at) = self.last_fetched_at else {
            return true;
        };
        match chrono::Duration::from_std(window) {
            Ok(window) => now.signed_duration_since(at) > window,
            Err(_) => false,
        }
    }

    /// Apply `f` to the held value, keeping status and timestamps
    pub fn map<U, F>(&self, f: F) -> SyncedValue<U>
    where
        F: FnOnce(&T) -> U,
    {
        SyncedValue {
            value: self.value.as_ref().map(f),
            status: self.status,
            last_fetched_at: self.last_fetched_at,
            last_error: self.last_error.clone(),
        }
    }

    fn begin_fetch(&mut self) {
        self.status = SyncStatus::Loading;
    }

    fn record_success(&mut self, value: T, now: DateTime<Utc>) {
        // Wall clock may step backwards; timestamps must not.
        let at = match self.last_fetched_at {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        self.value = Some(value);
        self.status = SyncStatus::Ready;
        self.last_fetched_at = Some(at);
        self.last_error = None;
    }

    fn record_failure(&mut self, error: FetchError) {
        self.status = SyncStatus::Error;
        self.last_error = Some(error);
    }
}

/// State shared between a handle and its background loop
struct Shared<T> {
    tx: watch::Sender<SyncedValue<T>>,
    /// Cleared by `stop`; every commit checks it under the same lock
    live: Mutex<bool>,
    in_flight: AtomicBool,
}

impl<T> Shared<T> {
    /// Apply `f` unless the sync was stopped. Returns whether it was applied.
    fn commit<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut SyncedValue<T>),
    {
        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if !*live {
            return false;
        }
        self.tx.send_modify(f);
        true
    }

    /// Mark a fetch as started and create it, unless the sync was stopped.
    ///
    /// `fetch` is called while the live guard is held, so no fetch can begin
    /// once `stop` has returned.
    fn begin<F, Fut>(&self, fetch: &mut F) -> Option<Fut>
    where
        F: FnMut() -> Fut,
    {
        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if !*live {
            return None;
        }
        self.tx.send_modify(SyncedValue::begin_fetch);
        self.in_flight.store(true, Ordering::SeqCst);
        Some(fetch())
    }

    fn shut(&self) -> bool {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *live, false)
    }
}

/// Starts periodic sync loops. See the module docs for the contract.
pub struct PeriodicValueSync;

impl PeriodicValueSync {
    /// Start keeping a value fresh by calling `fetch` every `period`.
    ///
    /// The first fetch is issued immediately. Must be called from within a
    /// tokio runtime.
    pub fn start<T, F, Fut>(
        name: impl Into<String>,
        fetch: F,
        period: Duration,
    ) -> Result<SyncHandle<T>, SyncError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        if period.is_zero() {
            return Err(SyncError::ZeroPeriod(period));
        }

        let name = name.into();
        let (tx, _rx) = watch::channel(SyncedValue::idle());
        let shared = Arc::new(Shared {
            tx,
            live: Mutex::new(true),
            in_flight: AtomicBool::new(false),
        });
        let token = CancellationToken::new();
        let (refresh_tx, refresh_rx) = mpsc::channel(1);

        shared.commit(SyncedValue::begin_fetch);

        info!("Starting {} sync every {:?}", name, period);
        tokio::spawn(run_loop(
            name.clone(),
            Arc::clone(&shared),
            token.clone(),
            refresh_rx,
            fetch,
            period,
        ));

        Ok(SyncHandle {
            name,
            period,
            shared,
            token,
            refresh_tx,
        })
    }
}

async fn run_loop<T, F, Fut>(
    name: String,
    shared: Arc<Shared<T>>,
    token: CancellationToken,
    mut refresh_rx: mpsc::Receiver<()>,
    mut fetch: F,
    period: Duration,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    loop {
        if token.is_cancelled() {
            break;
        }

        let Some(pending) = shared.begin(&mut fetch) else {
            break;
        };
        let result = pending.await;
        shared.in_flight.store(false, Ordering::SeqCst);

        let committed = match result {
            Ok(value) => {
                debug!("{} sync: fetch succeeded", name);
                shared.commit(|v| v.record_success(value, Utc::now()))
            }
            Err(e) => {
                warn!("{} sync: {} fetch failed: {}", name, e.kind(), e);
                shared.commit(|v| v.record_failure(e))
            }
        };
        if !committed {
            debug!("{} sync: discarding result that arrived after stop", name);
            break;
        }

        // Refresh requests that raced the fetch are already satisfied.
        while refresh_rx.try_recv().is_ok() {}

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(period) => {}
            Some(()) = refresh_rx.recv() => {
                debug!("{} sync: manual refresh", name);
            }
        }
    }

    shared.in_flight.store(false, Ordering::SeqCst);
    debug!("{} sync loop exited", name);
}

/// Owned handle to a running sync loop.
///
/// Dropping the handle stops the loop.
pub struct SyncHandle<T> {
    name: String,
    period: Duration,
    shared: Arc<Shared<T>>,
    token: CancellationToken,
    refresh_tx: mpsc::Sender<()>,
}

impl<T: Clone> SyncHandle<T> {
    /// Latest committed snapshot
    pub fn current_value(&self) -> SyncedValue<T> {
        self.shared.tx.borrow().clone()
    }

    /// Receiver notified on every committed change.
    ///
    /// After `stop` the receiver still yields the last snapshot but never
    /// observes another change.
    pub fn subscribe(&self) -> watch::Receiver<SyncedValue<T>> {
        self.shared.tx.subscribe()
    }
}

impl<T> SyncHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether a fetch is outstanding right now
    pub fn is_fetching(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Ask for a fetch now instead of waiting for the timer.
    ///
    /// Returns false when the request was dropped: the sync is stopped, a
    /// fetch is already outstanding, or a refresh is already pending.
    pub fn refresh_now(&self) -> bool {
        if self.is_stopped() || self.is_fetching() {
            return false;
        }
        self.refresh_tx.try_send(()).is_ok()
    }

    /// Stop the loop. Idempotent.
    ///
    /// No fetch is started after this returns and no result is applied, but
    /// an outstanding fetch is left to finish on its own.
    pub fn stop(&self) {
        if self.shared.shut() {
            info!("Stopping {} sync", self.name);
        }
        self.token.cancel();
    }
}

impl<T> Drop for SyncHandle<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
