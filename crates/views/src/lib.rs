//! View models for the vigil dashboard.
//!
//! Each page of the dashboard (overview, alerts, logs, incidents, HBT
//! visualizer, settings) has a view model here that owns its selection
//! state and query subscriptions and projects cache snapshots into
//! renderable state. Renderers are expected to be thin: call `sync()`
//! once per frame, then read `state()` and draw.

pub mod alerts;
pub mod hbt;
pub mod incidents;
pub mod logs;
pub mod overview;
pub mod query;
pub mod selection;
pub mod settings;

pub use alerts::{AlertsView, AlertsViewState};
pub use hbt::{HbtPanelState, HbtTree, HbtView, LabelSide, VisualNode};
pub use incidents::{AnalysisCell, IncidentRow, IncidentsView, IncidentsViewState};
pub use logs::{priority_color, LogsView, LogsViewState};
pub use overview::{FunnelRow, OverviewView, OverviewViewState};
pub use selection::Selection;
pub use settings::{SettingsForm, SettingsNotice};
