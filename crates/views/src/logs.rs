//! Logs page view model: raw security events for one container, with a
//! severity tag per row and a detail drawer.

use std::sync::Arc;

use vigil_cache::{gated_fetcher, QueryCache, QueryKey, QueryOptions, QueryStatus, QuerySubscription};
use vigil_client::TelemetryClient;
use vigil_core::{ContainerLogs, ContainerSummary, LogEvent, LogPriority, TimeWindow};

use crate::query::{json_fetcher, LOGS_REFRESH};
use crate::selection::Selection;

/// Tag color class for a log priority, matching the dashboard palette.
pub fn priority_color(priority: LogPriority) -> &'static str {
    match priority {
        LogPriority::Critical => "red",
        LogPriority::Error => "volcano",
        LogPriority::Warning => "orange",
        LogPriority::Notice => "gold",
        LogPriority::Info => "blue",
        LogPriority::Debug | LogPriority::Unknown => "default",
    }
}

/// Renderable state of the logs page.
#[derive(Debug, Clone)]
pub struct LogsViewState {
    pub containers: Vec<ContainerSummary>,
    pub no_containers: bool,
    pub selected_container: Option<String>,
    pub loading: bool,
    pub error_banner: Option<String>,
    /// Backend advisory (e.g. degraded log storage), shown as an info
    /// banner distinct from errors.
    pub warning_banner: Option<String>,
    pub rows: Vec<LogEvent>,
    pub empty_text: &'static str,
}

/// View model for the logs page.
pub struct LogsView {
    cache: Arc<QueryCache>,
    client: Arc<TelemetryClient>,
    selection: Selection,
    containers: QuerySubscription,
    logs: QuerySubscription,
    drawer: Option<LogEvent>,
}

impl LogsView {
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
        let logs = Self::subscribe_logs(&cache, &client, &selection);
        LogsView {
            cache,
            client,
            selection,
            containers,
            logs,
            drawer: None,
        }
    }

    fn subscribe_logs(
        cache: &Arc<QueryCache>,
        client: &Arc<TelemetryClient>,
        selection: &Selection,
    ) -> QuerySubscription {
        match selection.container_id() {
            None => cache.subscribe(
                QueryKey::resource("logs").with_opt(None::<&str>),
                QueryOptions::disabled(),
                gated_fetcher(),
            ),
            Some(id) => {
                let client = Arc::clone(client);
                let id_owned = id.to_string();
                cache.subscribe(
                    QueryKey::resource("logs").with(id),
                    QueryOptions::new().with_refresh(LOGS_REFRESH),
                    json_fetcher(move || {
                        let client = Arc::clone(&client);
                        let id = id_owned.clone();
                        async move { client.get_container_logs(&id).await }
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

    fn resubscribe(&mut self) {
        self.logs = Self::subscribe_logs(&self.cache, &self.client, &self.selection);
        self.drawer = None;
    }

    /// Open the detail drawer for the row at `index` (rows have no
    /// unique field, so position identifies them).
    pub fn open_details(&mut self, index: usize) {
        self.drawer = self.state().rows.into_iter().nth(index);
    }

    pub fn close_details(&mut self) {
        self.drawer = None;
    }

    pub fn drawer(&self) -> Option<&LogEvent> {
        self.drawer.as_ref()
    }

    pub fn state(&self) -> LogsViewState {
        let containers_snap = self.containers.snapshot();
        let containers: Vec<ContainerSummary> = containers_snap.decode().unwrap_or_default();
        let no_containers =
            containers_snap.status == QueryStatus::Success && containers.is_empty();

        let logs_snap = self.logs.snapshot();
        let payload = logs_snap.decode::<ContainerLogs>();
        LogsViewState {
            containers,
            no_containers,
            selected_container: self.selection.container_id().map(str::to_string),
            loading: logs_snap.is_loading(),
            error_banner: match logs_snap.status {
                QueryStatus::Error => Some(format!(
                    "Error loading logs: {}",
                    logs_snap.error.as_deref().unwrap_or("unknown error")
                )),
                _ => None,
            },
            warning_banner: payload.as_ref().and_then(|p| p.warning.clone()),
            rows: payload.map(|p| p.logs).unwrap_or_default(),
            empty_text: "No logs available for this container",
        }
    }
}
