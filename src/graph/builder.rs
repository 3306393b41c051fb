//! Fluent construction of workflow graphs.

use rustc_hash::FxHashMap;

use super::edges::{ConditionalEdge, RouterFn};
use crate::node::GraphNode;
use crate::runtime::RuntimeConfig;
use crate::types::NodeId;

/// Builder for workflow graphs.
///
/// Every graph needs at least one node, an edge from [`NodeId::Start`]
/// naming the entry node, and a path to [`NodeId::End`] (direct or through a
/// conditional mapping). `Start` and `End` are virtual: registering a node
/// under either is rejected at compile time.
pub struct GraphBuilder {
    pub(crate) nodes: FxHashMap<NodeId, GraphNode>,
    pub(crate) edges: FxHashMap<NodeId, NodeId>,
    pub(crate) conditional_edges: Vec<ConditionalEdge>,
    pub(crate) interrupt_before: Vec<NodeId>,
    pub(crate) runtime_config: RuntimeConfig,
    /// Insertion order, kept for deterministic validation and DOT output.
    pub(crate) node_order: Vec<NodeId>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            interrupt_before: Vec::new(),
            runtime_config: RuntimeConfig::default(),
            node_order: Vec::new(),
        }
    }

    /// Registers an executable node under a name.
    #[must_use]
    pub fn add_node(mut self, id: impl Into<NodeId>, node: GraphNode) -> Self {
        let id = id.into();
        if !self.nodes.contains_key(&id) {
            self.node_order.push(id.clone());
        }
        self.nodes.insert(id, node);
        self
    }

    /// Adds the direct edge `from -> to`. A node has at most one direct
    /// successor; a second edge from the same node is a compile error.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        let from = from.into();
        let to = to.into();
        if self.edges.insert(from.clone(), to).is_some() {
            tracing::warn!(%from, "direct edge replaced; nodes have one direct successor");
        }
        self
    }

    /// Adds a conditional edge: after `from` runs, `router` labels the new
    /// state and `mapping` turns the label into a successor.
    #[must_use]
    pub fn add_conditional_edge<L, T, M>(
        mut self,
        from: impl Into<NodeId>,
        router: impl Fn(&crate::state::StateSnapshot) -> String + Send + Sync + 'static,
        mapping: M,
    ) -> Self
    where
        L: Into<String>,
        T: Into<NodeId>,
        M: IntoIterator<Item = (L, T)>,
    {
        let mapping: FxHashMap<String, NodeId> = mapping
            .into_iter()
            .map(|(label, target)| (label.into(), target.into()))
            .collect();
        let router: RouterFn = std::sync::Arc::new(router);
        self.conditional_edges
            .push(ConditionalEdge::new(from.into(), router, mapping));
        self
    }

    /// Marks a node as an interrupt point: execution suspends just before it
    /// runs, until the thread is resumed.
    #[must_use]
    pub fn interrupt_before(mut self, node: impl Into<NodeId>) -> Self {
        let node = node.into();
        if !self.interrupt_before.contains(&node) {
            self.interrupt_before.push(node);
        }
        self
    }

    /// Overrides the default runtime configuration.
    #[must_use]
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }
}
