//! Conditional edges and routing functions.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::NodeId;

/// Routing function for a conditional edge.
///
/// Inspects the latest state (typically: does the last message carry a
/// pending tool call?) and returns a discrete label. Must be deterministic
/// for a given snapshot; the graph maps each label to a successor node or to
/// [`NodeId::End`].
pub type RouterFn = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A conditional edge: evaluated after its `from` node runs, the router's
/// label picks the successor out of `mapping`.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeId,
    router: RouterFn,
    mapping: FxHashMap<String, NodeId>,
}

impl ConditionalEdge {
    pub fn new(from: NodeId, router: RouterFn, mapping: FxHashMap<String, NodeId>) -> Self {
        Self {
            from,
            router,
            mapping,
        }
    }

    /// The source node of this edge.
    #[must_use]
    pub fn from(&self) -> &NodeId {
        &self.from
    }

    /// Evaluates the router and returns its label.
    #[must_use]
    pub fn route(&self, snapshot: &StateSnapshot) -> String {
        (self.router)(snapshot)
    }

    /// The successor mapped to a label, if any.
    #[must_use]
    pub fn target(&self, label: &str) -> Option<&NodeId> {
        self.mapping.get(label)
    }

    /// All mapped (label, target) pairs, sorted by label.
    #[must_use]
    pub fn targets(&self) -> Vec<(&String, &NodeId)> {
        let mut pairs: Vec<_> = self.mapping.iter().collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        pairs
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}
