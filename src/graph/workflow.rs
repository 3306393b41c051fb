//! The compiled, executable form of a graph.

use rustc_hash::FxHashMap;

use super::edges::ConditionalEdge;
use crate::node::GraphNode;
use crate::runtime::RuntimeConfig;
use crate::types::NodeId;

/// A validated graph: nodes, topology, interrupt points, and runtime
/// configuration. Execution lives in [`crate::runtime::Executor`]; one
/// `Workflow` can back any number of threads.
#[derive(Clone)]
pub struct Workflow {
    nodes: FxHashMap<NodeId, GraphNode>,
    edges: FxHashMap<NodeId, NodeId>,
    conditional_edges: Vec<ConditionalEdge>,
    interrupt_before: Vec<NodeId>,
    entry: NodeId,
    runtime_config: RuntimeConfig,
    node_order: Vec<NodeId>,
}

impl Workflow {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeId, GraphNode>,
        edges: FxHashMap<NodeId, NodeId>,
        conditional_edges: Vec<ConditionalEdge>,
        interrupt_before: Vec<NodeId>,
        entry: NodeId,
        runtime_config: RuntimeConfig,
        node_order: Vec<NodeId>,
    ) -> Self {
        Self {
            nodes,
            edges,
            conditional_edges,
            interrupt_before,
            entry,
            runtime_config,
            node_order,
        }
    }

    /// The node execution starts from.
    #[must_use]
    pub fn entry(&self) -> &NodeId {
        &self.entry
    }

    /// Looks up an executable node.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Registered nodes in insertion order.
    #[must_use]
    pub fn node_order(&self) -> &[NodeId] {
        &self.node_order
    }

    /// The direct successor of a node, if one was declared.
    #[must_use]
    pub fn direct_successor(&self, id: &NodeId) -> Option<&NodeId> {
        self.edges.get(id)
    }

    /// The conditional edge leaving a node, if one was declared.
    #[must_use]
    pub fn conditional_edge(&self, id: &NodeId) -> Option<&ConditionalEdge> {
        self.conditional_edges.iter().find(|e| e.from() == id)
    }

    /// All conditional edges.
    #[must_use]
    pub fn conditional_edges(&self) -> &[ConditionalEdge] {
        &self.conditional_edges
    }

    /// All direct edges.
    #[must_use]
    pub fn edges(&self) -> &FxHashMap<NodeId, NodeId> {
        &self.edges
    }

    /// Whether execution must suspend before this node runs.
    #[must_use]
    pub fn interrupts_before(&self, id: &NodeId) -> bool {
        self.interrupt_before.contains(id)
    }

    /// Runtime configuration attached at build time.
    #[must_use]
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("entry", &self.entry)
            .field("nodes", &self.node_order)
            .field("interrupt_before", &self.interrupt_before)
            .finish_non_exhaustive()
    }
}
