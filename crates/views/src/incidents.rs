//! Incidents page view model: derived incidents across all containers
//! or filtered to one, with the analyzer's verdict per row.

use std::sync::Arc;

use vigil_cache::{QueryCache, QueryKey, QueryOptions, QueryStatus, QuerySubscription};
use vigil_client::{TelemetryClient, DEFAULT_LIMIT};
use vigil_core::{ContainerSummary, Incident, TimeWindow};

use crate::query::{json_fetcher, INCIDENTS_REFRESH};

/// The analyzer column of one incident row.
///
/// A missing or empty analysis is rendered as a pending indicator --
/// distinct from an empty string and never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisCell {
    Pending,
    Done(String),
}

impl AnalysisCell {
    pub fn display(&self) -> &str {
        match self {
            AnalysisCell::Pending => "Pending...",
            AnalysisCell::Done(text) => text,
        }
    }
}

/// One renderable incident row.
#[derive(Debug, Clone)]
pub struct IncidentRow {
    pub key: String,
    pub incident: Incident,
    pub analysis: AnalysisCell,
}

/// Renderable state of the incidents page.
#[derive(Debug, Clone)]
pub struct IncidentsViewState {
    pub containers: Vec<ContainerSummary>,
    /// `None` means "all containers"; the filter is optional here,
    /// unlike the alerts/logs/HBT pages.
    pub selected_container: Option<String>,
    pub window: TimeWindow,
    pub loading: bool,
    pub error_banner: Option<String>,
    pub rows: Vec<IncidentRow>,
}

/// View model for the incidents page.
pub struct IncidentsView {
    cache: Arc<QueryCache>,
    client: Arc<TelemetryClient>,
    container_filter: Option<String>,
    window: TimeWindow,
    containers: QuerySubscription,
    incidents: QuerySubscription,
}

impl IncidentsView {
    pub fn new(cache: Arc<QueryCache>, client: Arc<TelemetryClient>) -> Self {
        let containers = {
            let client = Arc::clone(&client);
            cache.subscribe(
                QueryKey::resource("containers"),
                QueryOptions::new(),
                json_fetcher(move || {
                    let client = Arc::clone(&client);
                    async move { client.list_containers().await }
                }),
            )
        };
        // The incidents page defaults to the unbounded window.
        let window = TimeWindow::ALL;
        let incidents = Self::subscribe_incidents(&cache, &client, None, window);
        IncidentsView {
            cache,
            client,
            container_filter: None,
            window,
            containers,
            incidents,
        }
    }

    /// The incidents query is never gated: with no filter it spans all
    /// containers.
    fn subscribe_incidents(
        cache: &Arc<QueryCache>,
        client: &Arc<TelemetryClient>,
        container_filter: Option<&str>,
        window: TimeWindow,
    ) -> QuerySubscription {
        let client = Arc::clone(client);
        let filter = container_filter.map(str::to_string);
        let key = QueryKey::resource("incidents")
            .with_opt(container_filter)
            .with(window.as_secs());
        cache.subscribe(
            key,
            QueryOptions::new().with_refresh(INCIDENTS_REFRESH),
            json_fetcher(move || {
                let client = Arc::clone(&client);
                let filter = filter.clone();
                async move {
                    client
                        .get_incidents(filter.as_deref(), window, DEFAULT_LIMIT, 0)
                        .await
                }
            }),
        )
    }

    /// Set or clear the container filter (`None` = all containers).
    pub fn set_container_filter(&mut self, filter: Option<String>) {
        if self.container_filter == filter {
            return;
        }
        self.container_filter = filter;
        self.resubscribe();
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        if self.window == window {
            return;
        }
        self.window = window;
        self.resubscribe();
    }

    fn resubscribe(&mut self) {
        self.incidents = Self::subscribe_incidents(
            &self.cache,
            &self.client,
            self.container_filter.as_deref(),
            self.window,
        );
    }

    pub fn state(&self) -> IncidentsViewState {
        let containers: Vec<ContainerSummary> =
            self.containers.snapshot().decode().unwrap_or_default();

        let snap = self.incidents.snapshot();
        let rows = snap
            .decode::<Vec<Incident>>()
            .unwrap_or_default()
            .into_iter()
            .map(|incident| IncidentRow {
                key: incident.row_key(),
                analysis: if incident.is_pending() {
                    AnalysisCell::Pending
                } else {
                    AnalysisCell::Done(incident.analysis.clone().unwrap_or_default())
                },
                incident,
            })
            .collect();

        IncidentsViewState {
            containers,
            selected_container: self.container_filter.clone(),
            window: self.window,
            loading: snap.is_loading(),
            error_banner: match snap.status {
                QueryStatus::Error => Some(format!(
                    "Error loading incidents: {}",
                    snap.error.as_deref().unwrap_or("unknown error")
                )),
                _ => None,
            },
            rows,
        }
    }
}
