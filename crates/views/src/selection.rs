//! Per-view container/window selection.

use vigil_core::{ContainerSummary, TimeWindow};

/// The currently selected container and time window for one view.
///
/// Owned by each view instance; views never share selection. The first
/// non-empty container list auto-selects `containers[0]`, at most once,
/// re-armed only if the list later transitions back through empty.
#[derive(Debug, Clone)]
pub struct Selection {
    container_id: Option<String>,
    window: TimeWindow,
    auto_select_armed: bool,
}

impl Selection {
    pub fn new(window: TimeWindow) -> Self {
        Selection {
            container_id: None,
            window,
            auto_select_armed: true,
        }
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Explicitly select a container. Returns true if the selection
    /// changed (callers re-key their dependent queries on change).
    pub fn select(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.container_id.as_deref() == Some(id.as_str()) {
            return false;
        }
        self.container_id = Some(id);
        true
    }

    /// Change the time window. Returns true if it changed.
    pub fn set_window(&mut self, window: TimeWindow) -> bool {
        if self.window == window {
            return false;
        }
        self.window = window;
        true
    }

    /// Feed the latest container list through the auto-select rule.
    /// Returns true if a container was auto-selected.
    pub fn observe_containers(&mut self, containers: &[ContainerSummary]) -> bool {
        if containers.is_empty() {
            // Re-arm: a later empty → non-empty transition may select again.
            self.auto_select_armed = true;
            return false;
        }
        if self.container_id.is_none() && self.auto_select_armed {
            self.container_id = Some(containers[0].id.clone());
            self.auto_select_armed = false;
            return true;
        }
        false
    }
}
