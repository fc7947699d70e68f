//! End-to-end view-model flows against a stub telemetry backend.
//!
//! These tests wire real [`TelemetryClient`] + [`QueryCache`] instances
//! to an axum stub and drive the view models the way a render loop
//! would: `sync()` once per frame, then read state. They cover the
//! auto-selection handshake, gating, the empty-directory state, window
//! resubscription, incident pending rows, and the HBT panel lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use vigil_cache::QueryCache;
use vigil_client::TelemetryClient;
use vigil_core::TimeWindow;
use vigil_views::{
    AlertsView, AnalysisCell, HbtPanelState, HbtView, IncidentsView, OverviewView,
};

/// Query strings observed by the stub, in request order.
type SeenQueries = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Serve `router` under the `/api` root on an ephemeral port and return
/// the API root URL.
async fn spawn_backend(router: Router) -> String {
    let app = Router::new().nest("/api", router);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend serve");
    });
    format!("http://{addr}/api")
}

fn harness(api_url: String) -> (Arc<QueryCache>, Arc<TelemetryClient>) {
    let cache = Arc::new(QueryCache::new());
    let client = Arc::new(TelemetryClient::new(api_url).expect("client builds"));
    (cache, client)
}

/// Poll `ready` (which may pump a view's `sync`) until it holds.
async fn eventually(mut ready: impl FnMut() -> bool) {
    for _ in 0..200 {
        if ready() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("stub-backed view did not settle in time");
}

fn containers_route<S>(list: serde_json::Value) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/containers",
        get(move || {
            let list = list.clone();
            async move { Json(list) }
        }),
    )
}

// ---------------------------------------------------------------------------
// Test: auto-selection unlocks the gated alerts query
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alerts_auto_select_first_container_and_load_rows() {
    let router = containers_route(json!([
        {"id": "c1", "name": "web", "last_seen": 1714567890.0, "event_rate": 5.5},
        {"id": "c2", "name": "db", "last_seen": 1714567880.0, "event_rate": 0.2}
    ]))
    .route(
        "/containers/{id}/alerts",
        get(|Path(id): Path<String>| async move {
            Json(json!({
                "container_id": id,
                "alerts": [{
                    "container_id": id,
                    "timestamp": "2024-05-01T12:00:00Z",
                    "category": "filesystem",
                    "reason": "write below etc",
                    "evt_type": "openat",
                    "proc_name": "bash",
                    "fd_name": "/etc/passwd",
                    "output": "..."
                }]
            }))
        }),
    );
    let (cache, client) = harness(spawn_backend(router).await);
    let mut view = AlertsView::new(cache, client);

    // The alerts query is gated until the directory resolves and the
    // first container is auto-selected.
    assert_eq!(view.state().selected_container, None);
    assert!(!view.state().loading);

    eventually(|| {
        view.sync();
        !view.state().rows.is_empty()
    })
    .await;

    let state = view.state();
    assert_eq!(state.selected_container.as_deref(), Some("c1"));
    assert_eq!(state.rows[0].proc_name, "bash");
    assert!(!state.loading);
    assert_eq!(state.error_banner, None);
}

// ---------------------------------------------------------------------------
// Test: empty directory is a terminal empty state, not a spinner
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_directory_shows_no_containers_without_loading() {
    let router = containers_route(json!([]));
    let (cache, client) = harness(spawn_backend(router).await);
    let mut view = AlertsView::new(cache, client);

    eventually(|| {
        view.sync();
        view.state().no_containers
    })
    .await;

    let state = view.state();
    assert_eq!(state.selected_container, None);
    // The gated alerts query never ran, so nothing is loading.
    assert!(!state.loading);
    assert!(state.rows.is_empty());
}

// ---------------------------------------------------------------------------
// Test: window change switches cache key and hits the backend again
// ---------------------------------------------------------------------------

#[tokio::test]
async fn window_change_resubscribes_with_new_window() {
    let seen: SeenQueries = Arc::new(Mutex::new(Vec::new()));
    let router = containers_route(json!([
        {"id": "c1", "name": "web", "last_seen": 1714567890.0, "event_rate": 5.5}
    ]))
    .route(
        "/containers/{id}/alerts",
        get(
            |State(seen): State<SeenQueries>,
             Path(id): Path<String>,
             Query(params): Query<HashMap<String, String>>| async move {
                seen.lock().unwrap().push(params);
                Json(json!({"container_id": id, "alerts": []}))
            },
        ),
    )
    .with_state(Arc::clone(&seen));
    let (cache, client) = harness(spawn_backend(router).await);
    let mut view = AlertsView::new(cache, client);

    eventually(|| {
        view.sync();
        view.state().selected_container.is_some() && !view.state().loading
    })
    .await;
    assert_eq!(view.state().window, TimeWindow::default());
    assert_eq!(view.state().empty_text, "No alerts detected in selected window");

    view.set_window(TimeWindow::ALL);
    eventually(|| {
        view.sync();
        seen.lock()
            .unwrap()
            .iter()
            .any(|q| q.get("window_seconds").map(String::as_str) == Some("0"))
    })
    .await;
    assert_eq!(view.state().empty_text, "No alerts detected");
}

// ---------------------------------------------------------------------------
// Test: incidents render pending analysis distinctly
// ---------------------------------------------------------------------------

#[tokio::test]
async fn incidents_mark_missing_analysis_as_pending() {
    let router = containers_route(json!([])).route(
        "/incidents",
        get(|| async {
            Json(json!([
                {
                    "container_id": "c1",
                    "timestamp": "2024-05-01T12:00:00Z",
                    "threat_score": 0.9,
                    "event_type": "openat",
                    "analysis": "Likely crypto-miner activity."
                },
                {
                    "container_id": "c1",
                    "timestamp": "2024-05-01T12:01:00Z",
                    "threat_score": 0.4,
                    "event_type": "connect"
                }
            ]))
        }),
    );
    let (cache, client) = harness(spawn_backend(router).await);
    let view = IncidentsView::new(cache, client);

    eventually(|| view.state().rows.len() == 2).await;

    let state = view.state();
    // Incidents default to the unbounded window and no filter.
    assert_eq!(state.window, TimeWindow::ALL);
    assert_eq!(state.selected_container, None);
    assert_eq!(
        state.rows[0].analysis,
        AnalysisCell::Done("Likely crypto-miner activity.".to_string())
    );
    assert_eq!(state.rows[1].analysis, AnalysisCell::Pending);
    assert_eq!(state.rows[1].analysis.display(), "Pending...");
}

// ---------------------------------------------------------------------------
// Test: HBT panel failure is terminal until the selection changes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hbt_failure_clears_on_container_reselect() {
    let router = containers_route(json!([
        {"id": "c1", "name": "web", "last_seen": 1714567890.0, "event_rate": 5.5},
        {"id": "c2", "name": "db", "last_seen": 1714567880.0, "event_rate": 0.2}
    ]))
    .route(
        "/hbt/{id}",
        get(|Path(id): Path<String>| async move {
            if id == "c1" {
                return Err((StatusCode::NOT_FOUND, "snapshot not generated yet"));
            }
            Ok(Json(json!({
                "container_id": id,
                "hbt_structure": {
                    "name": "db",
                    "type": "container",
                    "events_count": 0,
                    "children": [
                        {"name": "proc:postgres", "type": "process", "events_count": 3, "children": []}
                    ]
                }
            })))
        }),
    );
    let (cache, client) = harness(spawn_backend(router).await);
    let mut view = HbtView::new(cache, client);

    // Auto-selects c1, whose snapshot is missing.
    eventually(|| {
        view.sync();
        matches!(view.panel_state(), HbtPanelState::Failed(_))
    })
    .await;
    assert_eq!(view.selected_container(), Some("c1"));
    assert!(view.tree().is_none());

    // Reselecting is the only way out of the failed state.
    view.select_container("c2");
    eventually(|| {
        view.sync();
        view.panel_state() == HbtPanelState::Loaded
    })
    .await;

    let tree = view.tree().expect("loaded tree");
    let labels: Vec<String> = tree
        .visible_nodes()
        .iter()
        .map(|n| n.label.clone())
        .collect();
    assert_eq!(labels, vec!["db", "proc:postgres (3)"]);
}

// ---------------------------------------------------------------------------
// Test: overview sorts containers and fills the funnel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn overview_sorts_containers_and_builds_funnel() {
    let router = containers_route(json!([
        {"id": "c1", "name": "web", "last_seen": 1714567890.0, "event_rate": 0.2},
        {"id": "c2", "name": "db", "last_seen": 1714567880.0, "event_rate": 5.5}
    ]))
    .route(
        "/overview",
        get(|| async {
            Json(json!({
                "total_events_rate": 42.5,
                "priority_distribution": [{"priority": "Warning", "value": 12.0}],
                "category_distribution": [
                    {"category": "filesystem", "value": 30.5},
                    {"category": "network", "value": 12.0}
                ],
                "active_containers_count": 2,
                "funnel_stats": {"logs": 1000, "alerts": 40, "incidents": 3}
            }))
        }),
    );
    let (cache, client) = harness(spawn_backend(router).await);
    let view = OverviewView::new(cache, client);

    eventually(|| {
        let state = view.state();
        !state.loading && !state.containers.is_empty()
    })
    .await;

    let state = view.state();
    assert_eq!(state.active_containers_count, 2);
    assert_eq!(state.monitored_rules, 2);
    // Highest event rate first.
    assert_eq!(state.containers[0].id, "c2");
    let counts: Vec<u64> = state.funnel.iter().map(|row| row.count).collect();
    assert_eq!(counts, vec![1000, 40, 3]);
    assert_eq!(state.funnel[0].stage, "Total Logs");
}
