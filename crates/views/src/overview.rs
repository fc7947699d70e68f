//! Overview page view model: headline stats, the processing funnel, the
//! per-category distribution, and the active-container activity table.

use std::sync::Arc;

use vigil_cache::{QueryCache, QueryKey, QueryOptions, QueryStatus, QuerySubscription};
use vigil_client::TelemetryClient;
use vigil_core::{CategoryRate, ContainerSummary, OverviewMetrics};

use crate::query::{json_fetcher, CONTAINERS_REFRESH, OVERVIEW_REFRESH};

/// One stage of the logs → alerts → incidents funnel.
#[derive(Debug, Clone, PartialEq)]
pub struct FunnelRow {
    pub stage: &'static str,
    pub count: u64,
}

/// Renderable state of the overview page.
#[derive(Debug, Clone)]
pub struct OverviewViewState {
    pub loading: bool,
    pub error_banner: Option<String>,
    pub total_events_rate: f64,
    pub active_containers_count: u64,
    /// Count of distinct rule categories currently reporting.
    pub monitored_rules: usize,
    pub funnel: Vec<FunnelRow>,
    pub category_distribution: Vec<CategoryRate>,
    /// Containers sorted by descending event rate.
    pub containers: Vec<ContainerSummary>,
}

/// View model for the overview page.
pub struct OverviewView {
    overview: QuerySubscription,
    containers: QuerySubscription,
}

impl OverviewView {
    pub fn new(cache: Arc<QueryCache>, client: Arc<TelemetryClient>) -> Self {
        let overview = {
            let client = Arc::clone(&client);
            cache.subscribe(
                QueryKey::resource("overview"),
                QueryOptions::new().with_refresh(OVERVIEW_REFRESH),
                json_fetcher(move || {
                    let client = Arc::clone(&client);
                    async move { client.get_overview().await }
                }),
            )
        };
        let containers = {
            let client = Arc::clone(&client);
            cache.subscribe(
                QueryKey::resource("containers"),
                QueryOptions::new().with_refresh(CONTAINERS_REFRESH),
                json_fetcher(move || {
                    let client = Arc::clone(&client);
                    async move { client.list_containers().await }
                }),
            )
        };
        OverviewView {
            overview,
            containers,
        }
    }

    pub fn state(&self) -> OverviewViewState {
        let overview_snap = self.overview.snapshot();
        let containers_snap = self.containers.snapshot();

        let metrics = overview_snap.decode::<OverviewMetrics>();
        let mut containers: Vec<ContainerSummary> =
            containers_snap.decode().unwrap_or_default();
        containers.sort_by(|a, b| {
            b.event_rate
                .partial_cmp(&a.event_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let funnel_stats = metrics
            .as_ref()
            .and_then(|m| m.funnel_stats.clone())
            .unwrap_or_default();

        OverviewViewState {
            loading: overview_snap.is_loading() || containers_snap.is_loading(),
            error_banner: match overview_snap.status {
                QueryStatus::Error => Some(format!(
                    "Error loading overview data: {}",
                    overview_snap.error.as_deref().unwrap_or("unknown error")
                )),
                _ => None,
            },
            total_events_rate: metrics.as_ref().map(|m| m.total_events_rate).unwrap_or(0.0),
            active_containers_count: metrics
                .as_ref()
                .map(|m| m.active_containers_count)
                .unwrap_or(0),
            monitored_rules: metrics
                .as_ref()
                .map(|m| m.category_distribution.len())
                .unwrap_or(0),
            funnel: vec![
                FunnelRow {
                    stage: "Total Logs",
                    count: funnel_stats.logs,
                },
                FunnelRow {
                    stage: "Alerts",
                    count: funnel_stats.alerts,
                },
                FunnelRow {
                    stage: "Incidents",
                    count: funnel_stats.incidents,
                },
            ],
            category_distribution: metrics
                .map(|m| m.category_distribution)
                .unwrap_or_default(),
            containers,
        }
    }
}
