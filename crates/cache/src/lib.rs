//! Query cache implementing the dashboard's synchronization policy.
//!
//! A process-wide, dependency-injected store of query entries keyed by
//! semantic [`QueryKey`]s. It coalesces concurrent fetches for identical
//! parameters, keeps displayed data fresh via per-subscription refresh
//! intervals (stale-while-revalidate), gates queries whose required
//! parameters are absent, and discards completions for abandoned keys so
//! a stale response can never overwrite the currently-selected entity's
//! view.
//!
//! Views hold [`QuerySubscription`] handles and observe state through
//! cloned [`QuerySnapshot`] projections; all entry mutation stays inside
//! the cache (single-writer discipline over one internal mutex).

pub mod cache;
pub mod key;
pub mod snapshot;

pub use cache::{gated_fetcher, FetchFuture, Fetcher, QueryCache, QueryOptions, QuerySubscription};
pub use key::QueryKey;
pub use snapshot::{FetchError, QuerySnapshot, QueryStatus};
