//! Plain-text rendering of view-model state for the terminal.
//!
//! Thin presentation layer: every decision about what to show (loading
//! vs. stale rows, empty-state text, banners) is made by the view
//! models; this module only lays the text out.

use vigil_views::{
    AlertsViewState, HbtPanelState, HbtTree, IncidentsViewState, LogsViewState,
    OverviewViewState,
};

fn heading(title: &str) -> String {
    format!("== {title} ==\n")
}

fn banner_lines(out: &mut String, error: &Option<String>) {
    if let Some(message) = error {
        out.push_str(&format!("  !! {message}\n"));
    }
}

pub fn overview_section(state: &OverviewViewState) -> String {
    let mut out = heading("Overview");
    banner_lines(&mut out, &state.error_banner);
    if state.loading {
        out.push_str("  loading...\n");
        return out;
    }
    out.push_str(&format!(
        "  events/s: {:.1}   active containers: {}   monitored rules: {}\n",
        state.total_events_rate, state.active_containers_count, state.monitored_rules
    ));
    for row in &state.funnel {
        out.push_str(&format!("  {:<12} {}\n", row.stage, row.count));
    }
    for rate in &state.category_distribution {
        out.push_str(&format!("  {:<20} {:.1}/s\n", rate.category, rate.value));
    }
    for container in &state.containers {
        out.push_str(&format!(
            "  {:<16} {:<20} {:>6.1}/s\n",
            container.id, container.name, container.event_rate
        ));
    }
    out
}

pub fn alerts_section(state: &AlertsViewState) -> String {
    let mut out = heading(&format!(
        "Alerts [{}] [{}]",
        state.selected_container.as_deref().unwrap_or("-"),
        state.window.label()
    ));
    banner_lines(&mut out, &state.error_banner);
    if state.no_containers {
        out.push_str("  No active containers\n");
        return out;
    }
    if state.loading {
        out.push_str("  loading...\n");
        return out;
    }
    if state.rows.is_empty() {
        out.push_str(&format!("  {}\n", state.empty_text));
        return out;
    }
    for alert in &state.rows {
        out.push_str(&format!(
            "  {}  {:<12} {:<16} {}\n",
            alert.timestamp, alert.category, alert.proc_name, alert.reason
        ));
    }
    out
}

pub fn logs_section(state: &LogsViewState) -> String {
    let mut out = heading(&format!(
        "Logs [{}]",
        state.selected_container.as_deref().unwrap_or("-")
    ));
    banner_lines(&mut out, &state.error_banner);
    if let Some(warning) = &state.warning_banner {
        out.push_str(&format!("  (i) {warning}\n"));
    }
    if state.no_containers {
        out.push_str("  No active containers\n");
        return out;
    }
    if state.loading {
        out.push_str("  loading...\n");
        return out;
    }
    if state.rows.is_empty() {
        out.push_str(&format!("  {}\n", state.empty_text));
        return out;
    }
    for event in &state.rows {
        out.push_str(&format!(
            "  {}  {:<8} {:<28} {}\n",
            event.timestamp,
            event.priority.as_str(),
            event.rule,
            event.output
        ));
    }
    out
}

pub fn incidents_section(state: &IncidentsViewState) -> String {
    let mut out = heading(&format!(
        "Incidents [{}] [{}]",
        state.selected_container.as_deref().unwrap_or("all"),
        state.window.label()
    ));
    banner_lines(&mut out, &state.error_banner);
    if state.loading {
        out.push_str("  loading...\n");
        return out;
    }
    if state.rows.is_empty() {
        out.push_str("  No incidents recorded\n");
        return out;
    }
    for row in &state.rows {
        out.push_str(&format!(
            "  {}  {:<16} score {:.2}  {}\n",
            row.incident.timestamp,
            row.incident.container_id,
            row.incident.threat_score,
            row.analysis.display()
        ));
    }
    out
}

pub fn hbt_section(panel: &HbtPanelState, tree: Option<&HbtTree>) -> String {
    let mut out = heading("Behavior Tree");
    match panel {
        HbtPanelState::NoContainers => out.push_str("  No active containers\n"),
        HbtPanelState::NoContainerSelected => out.push_str("  No container selected\n"),
        HbtPanelState::Loading => out.push_str("  loading...\n"),
        HbtPanelState::Failed(message) => out.push_str(&format!("  !! {message}\n")),
        HbtPanelState::Loaded => {
            if let Some(tree) = tree {
                for node in tree.visible_nodes() {
                    let marker = if node.is_leaf {
                        "-"
                    } else if node.expanded {
                        "v"
                    } else {
                        ">"
                    };
                    out.push_str(&format!(
                        "  {}{} {}\n",
                        "  ".repeat(node.depth),
                        marker,
                        node.label
                    ));
                }
            }
        }
    }
    out
}
