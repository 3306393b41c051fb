//! Graph validation and compilation into an executable [`Workflow`].

use miette::Diagnostic;
use thiserror::Error;

use super::GraphBuilder;
use super::workflow::Workflow;
use crate::types::NodeId;

/// Structural problems caught at compile time.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum CompileError {
    /// No nodes were registered.
    #[error("graph has no nodes")]
    #[diagnostic(code(threadloom::graph::empty))]
    EmptyGraph,

    /// `Start` or `End` was registered as an executable node.
    #[error("cannot register the virtual node {node}")]
    #[diagnostic(
        code(threadloom::graph::virtual_node),
        help("Start and End only anchor edges; give executable nodes their own names.")
    )]
    VirtualNodeRegistered { node: NodeId },

    /// No edge leaves `Start`, so there is no entry node.
    #[error("no entry edge from Start")]
    #[diagnostic(
        code(threadloom::graph::no_entry),
        help("Add an edge from NodeId::Start to the first node.")
    )]
    NoEntryEdge,

    /// An edge or mapping references a node that was never registered.
    #[error("edge references unknown node {node} (from {from})")]
    #[diagnostic(code(threadloom::graph::unknown_node))]
    UnknownNode { from: NodeId, node: NodeId },

    /// An interrupt point names an unregistered node.
    #[error("interrupt_before names unknown node {node}")]
    #[diagnostic(code(threadloom::graph::unknown_interrupt))]
    UnknownInterrupt { node: NodeId },
}

impl GraphBuilder {
    /// Validates the topology and compiles into a [`Workflow`].
    pub fn compile(self) -> Result<Workflow, CompileError> {
        if self.nodes.is_empty() {
            return Err(CompileError::EmptyGraph);
        }
        for id in self.nodes.keys() {
            if !id.is_named() {
                return Err(CompileError::VirtualNodeRegistered { node: id.clone() });
            }
        }

        let entry = self
            .edges
            .get(&NodeId::Start)
            .cloned()
            .ok_or(CompileError::NoEntryEdge)?;

        let known = |id: &NodeId| id.is_end() || self.nodes.contains_key(id);

        for (from, to) in &self.edges {
            if !from.is_named() && *from != NodeId::Start {
                return Err(CompileError::UnknownNode {
                    from: from.clone(),
                    node: from.clone(),
                });
            }
            if from.is_named() && !self.nodes.contains_key(from) {
                return Err(CompileError::UnknownNode {
                    from: from.clone(),
                    node: from.clone(),
                });
            }
            if !known(to) {
                return Err(CompileError::UnknownNode {
                    from: from.clone(),
                    node: to.clone(),
                });
            }
        }

        for edge in &self.conditional_edges {
            if !self.nodes.contains_key(edge.from()) {
                return Err(CompileError::UnknownNode {
                    from: edge.from().clone(),
                    node: edge.from().clone(),
                });
            }
            for (_, target) in edge.targets() {
                if !known(target) {
                    return Err(CompileError::UnknownNode {
                        from: edge.from().clone(),
                        node: target.clone(),
                    });
                }
            }
        }

        for node in &self.interrupt_before {
            if !self.nodes.contains_key(node) {
                return Err(CompileError::UnknownInterrupt { node: node.clone() });
            }
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            conditional_edges = self.conditional_edges.len(),
            interrupts = self.interrupt_before.len(),
            "graph compiled"
        );

        Ok(Workflow::from_parts(
            self.nodes,
            self.edges,
            self.conditional_edges,
            self.interrupt_before,
            entry,
            self.runtime_config,
            self.node_order,
        ))
    }
}
