//! Alerts page view model: per-container alert table with a time-window
//! filter and a detail drawer.

use std::sync::Arc;

use vigil_cache::{gated_fetcher, QueryCache, QueryKey, QueryOptions, QueryStatus, QuerySubscription};
use vigil_client::{TelemetryClient, DEFAULT_LIMIT};
use vigil_core::{AlertRecord, ContainerAlerts, ContainerSummary, TimeWindow};

use crate::query::{json_fetcher, ALERTS_REFRESH};
use crate::selection::Selection;

/// Renderable state of the alerts page.
#[derive(Debug, Clone)]
pub struct AlertsViewState {
    pub containers: Vec<ContainerSummary>,
    /// True once the directory resolved to an empty list: the page shows
    /// an explicit "no active containers" state, never a spinner.
    pub no_containers: bool,
    pub selected_container: Option<String>,
    pub window: TimeWindow,
    /// First-load spinner only; background refreshes keep the table.
    pub loading: bool,
    /// Non-fatal banner shown above any retained stale rows.
    pub error_banner: Option<String>,
    pub rows: Vec<AlertRecord>,
    /// Table placeholder when `rows` is empty.
    pub empty_text: &'static str,
}

/// View model for the alerts page.
pub struct AlertsView {
    cache: Arc<QueryCache>,
    client: Arc<TelemetryClient>,
    selection: Selection,
    containers: QuerySubscription,
    alerts: QuerySubscription,
    drawer: Option<AlertRecord>,
}

impl AlertsView {
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
        let selection = Selection::new(TimeWindow::default());
        let alerts = Self::subscribe_alerts(&cache, &client, &selection);
        AlertsView {
            cache,
            client,
            selection,
            containers,
            alerts,
            drawer: None,
        }
    }

    /// (Re)subscribe the alerts query for the current selection. Gated
    /// while no container is selected.
    fn subscribe_alerts(
        cache: &Arc<QueryCache>,
        client: &Arc<TelemetryClient>,
        selection: &Selection,
    ) -> QuerySubscription {
        let window = selection.window();
        match selection.container_id() {
            None => cache.subscribe(
                QueryKey::resource("alerts")
                    .with_opt(None::<&str>)
                    .with(window.as_secs()),
                QueryOptions::disabled(),
                gated_fetcher(),
            ),
            Some(id) => {
                let client = Arc::clone(client);
                let id_owned = id.to_string();
                cache.subscribe(
                    QueryKey::resource("alerts").with(id).with(window.as_secs()),
                    QueryOptions::new().with_refresh(ALERTS_REFRESH),
                    json_fetcher(move || {
                        let client = Arc::clone(&client);
                        let id = id_owned.clone();
                        async move {
                            client
                                .get_container_alerts(&id, window, DEFAULT_LIMIT, 0)
                                .await
                        }
                    }),
                )
            }
        }
    }

    /// Pump containers/auto-selection. Call once per frame.
    pub fn sync(&mut self) {
        let containers: Vec<ContainerSummary> =
            self.containers.snapshot().decode().unwrap_or_default();
        if self.selection.observe_containers(&containers) {
            self.resubscribe();
        }
    }

    pub fn select_container(&mut self, id: impl Into<String>) {
        if self.selection.select(id) {
            self.resubscribe();
        }
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        if self.selection.set_window(window) {
            self.resubscribe();
        }
    }

    /// Changing container or window changes the cache key immediately;
    /// the old subscription is dropped (abandoning its in-flight fetch)
    /// and the new key re-runs the gating/loading rules.
    fn resubscribe(&mut self) {
        self.alerts = Self::subscribe_alerts(&self.cache, &self.client, &self.selection);
        self.drawer = None;
    }

    /// Open the detail drawer for the row with the given composite key.
    pub fn open_details(&mut self, row_key: &str) {
        self.drawer = self
            .state()
            .rows
            .into_iter()
            .find(|alert| alert.row_key() == row_key);
    }

    pub fn close_details(&mut self) {
        self.drawer = None;
    }

    pub fn drawer(&self) -> Option<&AlertRecord> {
        self.drawer.as_ref()
    }

    pub fn state(&self) -> AlertsViewState {
        let containers_snap = self.containers.snapshot();
        let containers: Vec<ContainerSummary> = containers_snap.decode().unwrap_or_default();
        let no_containers =
            containers_snap.status == QueryStatus::Success && containers.is_empty();

        let alerts_snap = self.alerts.snapshot();
        let rows = alerts_snap
            .decode::<ContainerAlerts>()
            .map(|payload| payload.alerts)
            .unwrap_or_default();

        let window = self.selection.window();
        AlertsViewState {
            containers,
            no_containers,
            selected_container: self.selection.container_id().map(str::to_string),
            window,
            loading: alerts_snap.is_loading(),
            error_banner: match alerts_snap.status {
                QueryStatus::Error => Some(format!(
                    "Error loading alerts: {}",
                    alerts_snap.error.as_deref().unwrap_or("unknown error")
                )),
                _ => None,
            },
            rows,
            empty_text: if window.is_all_time() {
                "No alerts detected"
            } else {
                "No alerts detected in selected window"
            },
        }
    }
}
