//! # Threadloom: a conversation-graph agent runtime
//!
//! Threadloom runs conversational agent loops as small, fixed graphs: a model
//! node asks a chat model what to do next, a tool node executes the requested
//! call, and a conditional edge decides whether to loop or finish. State flows
//! through per-field reducers, every step is checkpointed under a thread id,
//! and designated interrupt points suspend execution until a human supplies a
//! resume payload.
//!
//! ## Core Concepts
//!
//! - **Messages**: role-tagged chat messages with tool-call requests and ids
//! - **State**: a transcript plus a key/value side channel, merged by reducers
//! - **Graph**: named nodes, direct edges, and label-routed conditional edges
//! - **Executor**: one node at a time per thread, snapshot streamed per step
//! - **Checkpointer**: latest state per thread id, the source of truth while
//!   a thread is suspended
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use threadloom::{
//!     graph::GraphBuilder,
//!     message::Message,
//!     model::ScriptedModel,
//!     node::GraphNode,
//!     types::NodeId,
//! };
//!
//! let model = Arc::new(ScriptedModel::replies(vec![Message::assistant("hi!")]));
//! let workflow = GraphBuilder::new()
//!     .add_node("agent", GraphNode::model(model))
//!     .add_edge(NodeId::Start, "agent")
//!     .add_edge("agent", NodeId::End)
//!     .compile()
//!     .expect("valid graph");
//! # let _ = workflow;
//! ```
//!
//! Running a compiled [`graph::Workflow`] happens through
//! [`runtime::Executor`]: create it with a checkpointer, call
//! [`runtime::Executor::invoke`] with a thread id and user input, and match on
//! the returned [`runtime::RunOutcome`] to detect suspension. A suspended
//! thread is continued with [`runtime::Executor::resume`].
//!
//! ## Module Guide
//!
//! - [`message`] - Messages and tool-call requests
//! - [`state`] - Conversation state, snapshots, and the state builder
//! - [`reducers`] - Per-channel merge strategies
//! - [`node`] - Node variants, partial updates, and node errors
//! - [`model`] - The chat-model seam and a scripted stand-in
//! - [`tools`] - Tool trait, registry, and dispatch
//! - [`graph`] - Graph construction, compilation, and DOT rendering
//! - [`runtime`] - Executor, checkpointing, and interrupt/resume
//! - [`events`] - Step streaming over a flume bus
//! - [`repl`] - Line-oriented chat-loop helpers

pub mod events;
pub mod graph;
pub mod message;
pub mod model;
pub mod node;
pub mod reducers;
pub mod repl;
pub mod runtime;
pub mod state;
pub mod tools;
pub mod types;
