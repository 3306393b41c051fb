//! Graph definition and compilation.
//!
//! A workflow graph is a fixed set of named nodes, one direct successor per
//! node, and optional conditional edges that route through a deterministic
//! labeling function. [`GraphBuilder`] collects the pieces; `compile()`
//! validates the topology and produces an executable [`Workflow`].
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use threadloom::graph::GraphBuilder;
//! use threadloom::message::Message;
//! use threadloom::model::ScriptedModel;
//! use threadloom::node::GraphNode;
//! use threadloom::state::StateSnapshot;
//! use threadloom::tools::{PlaceholderSearch, ToolRegistry};
//! use threadloom::types::NodeId;
//!
//! let model = Arc::new(ScriptedModel::replies(vec![Message::assistant("done")]));
//! let registry = Arc::new(ToolRegistry::new().register(Arc::new(PlaceholderSearch)));
//!
//! let workflow = GraphBuilder::new()
//!     .add_node("agent", GraphNode::model(model))
//!     .add_node("action", GraphNode::tools(registry))
//!     .add_edge(NodeId::Start, "agent")
//!     .add_conditional_edge(
//!         "agent",
//!         |snapshot: &StateSnapshot| {
//!             let pending = snapshot
//!                 .last_message()
//!                 .map(|m| m.has_tool_calls())
//!                 .unwrap_or(false);
//!             if pending { "continue".into() } else { "end".into() }
//!         },
//!         [("continue", "action"), ("end", "End")],
//!     )
//!     .add_edge("action", "agent")
//!     .compile()
//!     .expect("valid graph");
//! # let _ = workflow;
//! ```

mod builder;
mod compile;
mod edges;
mod viz;
mod workflow;

pub use builder::GraphBuilder;
pub use compile::CompileError;
pub use edges::{ConditionalEdge, RouterFn};
pub use workflow::Workflow;
