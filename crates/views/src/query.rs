//! Bridges between the typed telemetry client and the type-erased
//! query cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use vigil_cache::{FetchError, Fetcher};
use vigil_client::TelemetryError;

/// How often each page refreshes its queries, matching the dashboard's
/// original polling cadence.
pub const OVERVIEW_REFRESH: Duration = Duration::from_secs(5);
pub const CONTAINERS_REFRESH: Duration = Duration::from_secs(10);
pub const ALERTS_REFRESH: Duration = Duration::from_secs(10);
pub const LOGS_REFRESH: Duration = Duration::from_secs(5);
pub const INCIDENTS_REFRESH: Duration = Duration::from_secs(10);

/// Wrap a typed client call into a cache [`Fetcher`].
///
/// The closure is invoked once per fetch; its result is serialized into
/// the cache's type-erased slot and decoded back by the view's
/// `QuerySnapshot::decode`.
pub fn json_fetcher<F, Fut, T>(call: F) -> Fetcher
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TelemetryError>> + Send + 'static,
    T: Serialize,
{
    Arc::new(move || {
        let future = call();
        Box::pin(async move {
            let value = future.await.map_err(FetchError::new)?;
            serde_json::to_value(value).map_err(FetchError::new)
        })
    })
}
