//! Read-only projections of cache entries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Lifecycle phase of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Gated or never fetched; no request has been issued.
    Idle,
    /// First fetch in flight, nothing to display yet.
    Loading,
    /// Last completed fetch succeeded.
    Success,
    /// Last completed fetch failed; `data` may still hold the previous
    /// successful value.
    Error,
}

/// The view-facing projection of one cache entry.
///
/// Cloned out of the cache's `watch` channel; mutating a snapshot has no
/// effect on the entry. `data` is kept alongside `Error` status so the
/// UI can show a stale value under an error banner instead of blanking.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    /// Last successful response body, type-erased.
    pub data: Option<Arc<Value>>,
    /// Message of the most recent failure, cleared on success.
    pub error: Option<String>,
    /// Completion time of the last successful fetch.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// True while a background refetch is in flight. The first load uses
    /// `Loading` instead; background refreshes never do.
    pub is_refreshing: bool,
}

impl QuerySnapshot {
    pub fn idle() -> Self {
        QuerySnapshot {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            last_fetched_at: None,
            is_refreshing: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Decode the cached value into a typed model.
    ///
    /// Returns `None` when there is no data or the shape does not match;
    /// a shape mismatch is a programming error on the subscriber side
    /// (wrong type for the key), not a runtime condition to branch on.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        let value = self.data.as_deref()?;
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::error!(error = %e, "Cached value failed to decode into the requested type");
                None
            }
        }
    }
}

/// Failure reported by a fetcher.
///
/// Carries only a display message: the cache does not branch on failure
/// kind, it records the message and retains any stale data.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(err: impl std::fmt::Display) -> Self {
        FetchError {
            message: err.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
