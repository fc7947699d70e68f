//! The query cache service: entry lifecycle, coalescing, gating,
//! interval refresh, and completion handling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::key::QueryKey;
use crate::snapshot::{FetchError, QuerySnapshot, QueryStatus};

/// A fetch in progress, produced by a [`Fetcher`].
pub type FetchFuture = BoxFuture<'static, Result<Value, FetchError>>;

/// Factory for fetches of one query. Cloned into the entry so interval
/// refreshes and [`QueryCache::invalidate`] can re-issue the request.
pub type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Per-subscription behaviour flags.
#[derive(Clone, Debug)]
pub struct QueryOptions {
    /// When false the query is gated: the entry stays `Idle` and no
    /// request is issued until an enabled subscriber arrives.
    pub enabled: bool,
    /// Background refetch period. `None` disables interval refresh for
    /// this subscriber.
    pub refresh_interval: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            enabled: true,
            refresh_interval: None,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gated: hold the entry `Idle` without fetching.
    pub fn disabled() -> Self {
        QueryOptions {
            enabled: false,
            refresh_interval: None,
        }
    }

    pub fn with_refresh(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }
}

/// One live cache entry. Owned exclusively by the cache; views only see
/// [`QuerySnapshot`] clones through the watch channel.
struct Entry {
    tx: watch::Sender<QuerySnapshot>,
    fetcher: Fetcher,
    subscribers: usize,
    /// Outstanding fetches for this entry.
    inflight: usize,
    /// Identity of this entry incarnation. A completion whose epoch no
    /// longer matches (entry evicted, possibly re-created) is discarded.
    epoch: u64,
    /// Cancellation for the interval-refresh task, if one is running.
    refresh: Option<CancellationToken>,
}

impl Entry {
    fn new(fetcher: Fetcher, epoch: u64) -> Self {
        Entry {
            tx: watch::Sender::new(QuerySnapshot::idle()),
            fetcher,
            subscribers: 0,
            inflight: 0,
            epoch,
            refresh: None,
        }
    }
}

/// Process-wide query store.
///
/// Constructed once and shared as `Arc<QueryCache>`; never ambient
/// global state, so tests get per-instance isolation.
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    next_epoch: AtomicU64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        QueryCache {
            entries: Mutex::new(HashMap::new()),
            next_epoch: AtomicU64::new(0),
        }
    }

    /// Register a subscriber for `key`.
    ///
    /// If the key has no data yet and the subscription is enabled, the
    /// entry transitions `Idle → Loading` and one fetch is issued; a
    /// concurrent subscriber for the same key joins that fetch instead
    /// of issuing another. If cached data exists it is served as-is and
    /// only interval refreshes (if requested) update it.
    ///
    /// The returned handle unsubscribes on drop. When the last
    /// subscriber goes away the entry is evicted and its refresh task
    /// cancelled; an in-flight completion for the evicted entry is then
    /// discarded rather than applied.
    pub fn subscribe(
        self: &Arc<Self>,
        key: QueryKey,
        options: QueryOptions,
        fetcher: Fetcher,
    ) -> QuerySubscription {
        let mut entries = self.entries.lock().expect("query cache poisoned");
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(Arc::clone(&fetcher), epoch));
        entry.subscribers += 1;
        entry.fetcher = fetcher;
        let rx = entry.tx.subscribe();

        if options.enabled {
            let has_data = entry.tx.borrow().data.is_some();
            if !has_data && entry.inflight == 0 {
                self.start_fetch(&key, entry, false);
            }
            if let Some(interval) = options.refresh_interval {
                if entry.refresh.is_none() {
                    let cancel = CancellationToken::new();
                    entry.refresh = Some(cancel.clone());
                    self.spawn_refresh_task(key.clone(), interval, cancel);
                }
            }
        }

        QuerySubscription {
            cache: Arc::clone(self),
            key,
            rx,
        }
    }

    /// Force an immediate background refetch of a live entry.
    ///
    /// A no-op when the key is unknown, has no subscribers, or already
    /// has a fetch in flight.
    pub fn invalidate(self: &Arc<Self>, key: &QueryKey) {
        self.refetch(key);
    }

    /// Current snapshot for `key`, if a live entry exists.
    pub fn get(&self, key: &QueryKey) -> Option<QuerySnapshot> {
        let entries = self.entries.lock().expect("query cache poisoned");
        entries.get(key).map(|entry| entry.tx.borrow().clone())
    }

    /// Number of live entries (subscribed keys).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("query cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- internal ----

    /// Periodic background refetch driver for one key. Runs until the
    /// entry is evicted (token cancelled on last unsubscribe), so no
    /// timer outlives its subscription.
    fn spawn_refresh_task(
        self: &Arc<Self>,
        key: QueryKey,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(key = %key, "Refresh task stopping");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        cache.refetch(&key);
                    }
                }
            }
        });
    }

    /// Issue a background refetch if the entry is live and idle enough.
    fn refetch(self: &Arc<Self>, key: &QueryKey) {
        let mut entries = self.entries.lock().expect("query cache poisoned");
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.subscribers == 0 || entry.inflight > 0 {
            return;
        }
        self.start_fetch(key, entry, true);
    }

    /// Start one fetch for `entry`, marking the snapshot accordingly:
    /// `Loading` only on first load, `is_refreshing` when data is
    /// already on screen (stale-while-revalidate).
    fn start_fetch(self: &Arc<Self>, key: &QueryKey, entry: &mut Entry, background: bool) {
        entry.inflight += 1;
        entry.tx.send_modify(|snap| {
            if background || snap.data.is_some() {
                snap.is_refreshing = true;
            } else {
                snap.status = QueryStatus::Loading;
            }
        });

        let future = (entry.fetcher)();
        let epoch = entry.epoch;
        let cache = Arc::clone(self);
        let key = key.clone();
        tracing::debug!(key = %key, background, "Query fetch issued");
        tokio::spawn(async move {
            let result = future.await;
            cache.apply_completion(&key, epoch, result);
        });
    }

    /// Apply one completed fetch.
    ///
    /// Completions are applied in completion order (last write wins). A
    /// completion for an evicted or re-created entry is discarded: the
    /// subscriber that wanted it is gone, and writing it anywhere would
    /// show data for a no-longer-selected entity.
    fn apply_completion(&self, key: &QueryKey, epoch: u64, result: Result<Value, FetchError>) {
        let mut entries = self.entries.lock().expect("query cache poisoned");
        let Some(entry) = entries.get_mut(key) else {
            tracing::debug!(key = %key, "Discarding completion for evicted query");
            return;
        };
        if entry.epoch != epoch {
            tracing::debug!(key = %key, "Discarding completion for superseded query entry");
            return;
        }

        entry.inflight = entry.inflight.saturating_sub(1);
        let still_inflight = entry.inflight > 0;
        entry.tx.send_modify(|snap| {
            match result {
                Ok(value) => {
                    snap.status = QueryStatus::Success;
                    snap.data = Some(Arc::new(value));
                    snap.error = None;
                    snap.last_fetched_at = Some(Utc::now());
                }
                Err(e) => {
                    // Keep any previous data so the view can show a
                    // stale value under the error banner.
                    snap.status = QueryStatus::Error;
                    snap.error = Some(e.to_string());
                }
            }
            if !still_inflight {
                snap.is_refreshing = false;
            }
        });
    }

    /// Drop one subscriber; evict the entry when it was the last.
    fn unsubscribe(&self, key: &QueryKey) {
        let mut entries = self.entries.lock().expect("query cache poisoned");
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers == 0 {
            if let Some(cancel) = &entry.refresh {
                cancel.cancel();
            }
            entries.remove(key);
            tracing::debug!(key = %key, "Query entry evicted");
        }
    }
}

/// Live subscription handle for one query key.
///
/// Holds a `watch` receiver on the entry's snapshot; dropping the handle
/// unsubscribes (and evicts the entry if it was the last subscriber).
pub struct QuerySubscription {
    cache: Arc<QueryCache>,
    key: QueryKey,
    rx: watch::Receiver<QuerySnapshot>,
}

impl QuerySubscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current snapshot (cloned; cheap, data is `Arc`-shared).
    pub fn snapshot(&self) -> QuerySnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot change. Returns false if the entry is
    /// gone (cannot happen while this handle is alive, but the receiver
    /// API surfaces it).
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        self.cache.unsubscribe(&self.key);
    }
}

/// A fetcher for gated queries: fails if it ever runs.
///
/// Gated subscriptions never issue a fetch, so this only exists to give
/// the entry a well-typed fetcher until an enabled subscriber replaces
/// it with a real one.
pub fn gated_fetcher() -> Fetcher {
    Arc::new(|| {
        Box::pin(async {
            Err(FetchError::new(
                "query gated: required parameter is absent",
            ))
        })
    })
}
