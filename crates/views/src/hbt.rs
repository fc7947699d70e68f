//! Hierarchical behavior tree panel: tree projection and view model.
//!
//! The fetched tree is immutable; expand/collapse lives in a UI-only
//! overlay keyed by node index-path, so toggling never touches data and
//! never refetches. The snapshot itself is fetched once per container
//! selection with no retry and no interval refresh -- a missing snapshot
//! is an expected transient state.

use std::collections::HashMap;
use std::sync::Arc;

use vigil_cache::{gated_fetcher, QueryCache, QueryKey, QueryOptions, QueryStatus, QuerySubscription};
use vigil_client::TelemetryClient;
use vigil_core::{ContainerSummary, HbtNode, HbtSnapshot, TimeWindow};

use crate::query::{json_fetcher, CONTAINERS_REFRESH};
use crate::selection::Selection;

/// Number of levels expanded on first render, counting the root level.
pub const INITIAL_TREE_DEPTH: usize = 2;

/// Which side of the node glyph the label is drawn on. Leaves take the
/// opposite side from internal nodes to avoid overlap in a left-to-right
/// layout; the data semantics are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    /// Before the node glyph (internal nodes).
    Start,
    /// After the node glyph (leaves).
    End,
}

/// A renderable projection of one visible tree node.
#[derive(Debug, Clone)]
pub struct VisualNode {
    /// Index path from the root (root is the empty path).
    pub path: Vec<usize>,
    pub depth: usize,
    pub name: String,
    pub node_type: String,
    pub events_count: u64,
    /// Composite label: `name (count)` when the count is positive.
    pub label: String,
    pub tooltip: String,
    pub is_leaf: bool,
    pub label_side: LabelSide,
    pub expanded: bool,
}

/// An immutable fetched tree plus its UI-only expansion overlay.
#[derive(Debug, Clone)]
pub struct HbtTree {
    root: HbtNode,
    /// Explicit expand/collapse choices; nodes not present fall back to
    /// the initial-depth rule.
    overlay: HashMap<Vec<usize>, bool>,
}

impl HbtTree {
    pub fn new(root: HbtNode) -> Self {
        HbtTree {
            root,
            overlay: HashMap::new(),
        }
    }

    pub fn root(&self) -> &HbtNode {
        &self.root
    }

    /// Look up a node by index path.
    pub fn node_at(&self, path: &[usize]) -> Option<&HbtNode> {
        let mut node = &self.root;
        for &index in path {
            node = node.children.get(index)?;
        }
        Some(node)
    }

    /// Whether the node at `path` currently shows its children.
    pub fn is_expanded(&self, path: &[usize]) -> bool {
        match self.overlay.get(path) {
            Some(&explicit) => explicit,
            None => path.len() < INITIAL_TREE_DEPTH,
        }
    }

    /// Flip the expansion of the node at `path`. Pure UI state; no
    /// refetch happens, the full tree was fetched eagerly.
    pub fn toggle(&mut self, path: &[usize]) {
        let next = !self.is_expanded(path);
        self.overlay.insert(path.to_vec(), next);
    }

    /// Label for one node: `name (count)` when events were attributed
    /// directly to it, bare `name` otherwise.
    pub fn label(node: &HbtNode) -> String {
        if node.events_count > 0 {
            format!("{} ({})", node.name, node.events_count)
        } else {
            node.name.clone()
        }
    }

    /// Hover/focus tooltip: name, type, and direct event count.
    pub fn tooltip(node: &HbtNode) -> String {
        format!(
            "{} ({})\nEvents: {}",
            node.name, node.node_type, node.events_count
        )
    }

    /// The currently visible nodes in depth-first order.
    ///
    /// A node is visible when every ancestor is expanded; collapsed
    /// nodes are themselves visible but their subtrees are not.
    pub fn visible_nodes(&self) -> Vec<VisualNode> {
        let mut nodes = Vec::new();
        self.collect_visible(&self.root, Vec::new(), &mut nodes);
        nodes
    }

    fn collect_visible(&self, node: &HbtNode, path: Vec<usize>, out: &mut Vec<VisualNode>) {
        let expanded = self.is_expanded(&path);
        out.push(VisualNode {
            depth: path.len(),
            name: node.name.clone(),
            node_type: node.node_type.clone(),
            events_count: node.events_count,
            label: Self::label(node),
            tooltip: Self::tooltip(node),
            is_leaf: node.is_leaf(),
            label_side: if node.is_leaf() {
                LabelSide::End
            } else {
                LabelSide::Start
            },
            expanded,
            path: path.clone(),
        });
        if expanded {
            for (index, child) in node.children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(index);
                self.collect_visible(child, child_path, out);
            }
        }
    }
}

/// Render phase of the HBT panel.
///
/// `Failed` is terminal until the container selection changes; there is
/// no background refresh and no retry for snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HbtPanelState {
    /// The container directory is empty; nothing to visualize.
    NoContainers,
    NoContainerSelected,
    Loading,
    Loaded,
    Failed(String),
}

/// View model for the HBT visualizer page.
pub struct HbtView {
    cache: Arc<QueryCache>,
    client: Arc<TelemetryClient>,
    selection: Selection,
    containers: QuerySubscription,
    snapshot_sub: QuerySubscription,
    tree: Option<HbtTree>,
    /// Container id the current `tree` was built from.
    tree_container: Option<String>,
}

impl HbtView {
    pub fn new(cache: Arc<QueryCache>, client: Arc<TelemetryClient>) -> Self {
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
        let snapshot_sub = Self::subscribe_snapshot(&cache, &client, None);
        HbtView {
            cache,
            client,
            selection: Selection::new(TimeWindow::default()),
            containers,
            snapshot_sub,
            tree: None,
            tree_container: None,
        }
    }

    fn subscribe_snapshot(
        cache: &Arc<QueryCache>,
        client: &Arc<TelemetryClient>,
        container_id: Option<&str>,
    ) -> QuerySubscription {
        match container_id {
            None => cache.subscribe(
                QueryKey::resource("hbt").with_opt(None::<&str>),
                QueryOptions::disabled(),
                gated_fetcher(),
            ),
            Some(id) => {
                let client = Arc::clone(client);
                let id_owned = id.to_string();
                cache.subscribe(
                    QueryKey::resource("hbt").with(id),
                    // Point-in-time artifact: fetched once, no interval.
                    QueryOptions::new(),
                    json_fetcher(move || {
                        let client = Arc::clone(&client);
                        let id = id_owned.clone();
                        async move { client.get_hbt_snapshot(&id).await }
                    }),
                )
            }
        }
    }

    /// Pump containers/auto-selection and materialize a freshly loaded
    /// tree. Call once per frame before reading state.
    pub fn sync(&mut self) {
        let containers: Vec<ContainerSummary> =
            self.containers.snapshot().decode().unwrap_or_default();
        if self.selection.observe_containers(&containers) {
            self.resubscribe();
        }

        if self.snapshot_sub.snapshot().status == QueryStatus::Success {
            let selected = self.selection.container_id().map(str::to_string);
            if self.tree_container != selected {
                if let Some(snapshot) = self.snapshot_sub.snapshot().decode::<HbtSnapshot>() {
                    self.tree = Some(HbtTree::new(snapshot.hbt_structure));
                    self.tree_container = selected;
                }
            }
        }
    }

    /// Select a different container; re-enters `Loading` and discards
    /// the previous tree and its expansion overlay.
    pub fn select_container(&mut self, id: impl Into<String>) {
        if self.selection.select(id) {
            self.resubscribe();
        }
    }

    fn resubscribe(&mut self) {
        self.snapshot_sub =
            Self::subscribe_snapshot(&self.cache, &self.client, self.selection.container_id());
        self.tree = None;
        self.tree_container = None;
    }

    pub fn containers(&self) -> Vec<ContainerSummary> {
        self.containers.snapshot().decode().unwrap_or_default()
    }

    pub fn selected_container(&self) -> Option<&str> {
        self.selection.container_id()
    }

    pub fn panel_state(&self) -> HbtPanelState {
        let containers = self.containers.snapshot();
        if containers.status == QueryStatus::Success
            && containers
                .decode::<Vec<ContainerSummary>>()
                .map(|list| list.is_empty())
                .unwrap_or(false)
        {
            return HbtPanelState::NoContainers;
        }
        if self.selection.container_id().is_none() {
            return HbtPanelState::NoContainerSelected;
        }
        let snap = self.snapshot_sub.snapshot();
        match snap.status {
            QueryStatus::Idle | QueryStatus::Loading => HbtPanelState::Loading,
            QueryStatus::Success => {
                if self.tree.is_some() {
                    HbtPanelState::Loaded
                } else {
                    HbtPanelState::Loading
                }
            }
            QueryStatus::Error => HbtPanelState::Failed(
                snap.error
                    .unwrap_or_else(|| "snapshot not available".to_string()),
            ),
        }
    }

    pub fn tree(&self) -> Option<&HbtTree> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut HbtTree> {
        self.tree.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, count: u64) -> HbtNode {
        HbtNode {
            name: name.to_string(),
            node_type: "process".to_string(),
            events_count: count,
            children: Vec::new(),
        }
    }

    fn sample_tree() -> HbtNode {
        HbtNode {
            name: "root".to_string(),
            node_type: "container".to_string(),
            events_count: 0,
            children: vec![HbtNode {
                name: "proc:bash".to_string(),
                node_type: "process".to_string(),
                events_count: 7,
                children: vec![leaf("file:/etc/passwd", 2), leaf("net:10.0.0.1:443", 0)],
            }],
        }
    }

    #[test]
    fn labels_show_count_only_when_positive() {
        let tree = sample_tree();
        assert_eq!(HbtTree::label(&tree), "root");
        assert_eq!(HbtTree::label(&tree.children[0]), "proc:bash (7)");
        assert_eq!(
            HbtTree::label(&tree.children[0].children[1]),
            "net:10.0.0.1:443"
        );
    }

    #[test]
    fn tooltip_includes_name_type_and_count() {
        let tree = sample_tree();
        assert_eq!(
            HbtTree::tooltip(&tree.children[0]),
            "proc:bash (process)\nEvents: 7"
        );
    }

    #[test]
    fn two_level_tree_is_fully_visible_initially() {
        let tree = HbtTree::new(HbtNode {
            name: "root".to_string(),
            node_type: String::new(),
            events_count: 0,
            children: vec![leaf("proc:bash", 7)],
        });
        let visible = tree.visible_nodes();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].label, "root");
        assert!(visible[1].label.contains("(7)"));
        assert!(visible[0].expanded);
    }

    #[test]
    fn depth_beyond_two_starts_collapsed() {
        let deep = HbtNode {
            name: "root".to_string(),
            node_type: String::new(),
            events_count: 0,
            children: vec![HbtNode {
                name: "a".to_string(),
                node_type: String::new(),
                events_count: 0,
                children: vec![HbtNode {
                    name: "b".to_string(),
                    node_type: String::new(),
                    events_count: 0,
                    children: vec![leaf("c", 1)],
                }],
            }],
        };
        let tree = HbtTree::new(deep);
        let visible: Vec<String> = tree.visible_nodes().iter().map(|n| n.name.clone()).collect();
        // Depths 0 and 1 are expanded, so depth 2 is visible but closed;
        // its child at depth 3 is not.
        assert_eq!(visible, vec!["root", "a", "b"]);
    }

    #[test]
    fn toggle_is_overlay_only() {
        let mut tree = HbtTree::new(sample_tree());
        assert_eq!(tree.visible_nodes().len(), 4);

        tree.toggle(&[0]);
        let visible: Vec<String> = tree.visible_nodes().iter().map(|n| n.name.clone()).collect();
        assert_eq!(visible, vec!["root", "proc:bash"]);
        // The underlying tree is untouched.
        assert_eq!(tree.node_at(&[0]).unwrap().children.len(), 2);

        tree.toggle(&[0]);
        assert_eq!(tree.visible_nodes().len(), 4);
    }

    #[test]
    fn leaves_take_the_opposite_label_side() {
        let tree = HbtTree::new(sample_tree());
        let visible = tree.visible_nodes();
        assert_eq!(visible[0].label_side, LabelSide::Start);
        let leaf_node = visible.iter().find(|n| n.is_leaf).expect("a leaf");
        assert_eq!(leaf_node.label_side, LabelSide::End);
    }
}
