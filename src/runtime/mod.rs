//! Thread execution, checkpointing, and runtime configuration.
//!
//! The pieces fit together like this:
//!
//! - **[`Executor`]** runs a compiled workflow against named threads
//! - **[`Checkpointer`]** is the pluggable persistence seam; the bundled
//!   [`InMemoryCheckpointer`] covers tests and single-process runs
//! - **Persistence models** are the serde shapes checkpoints are stored as
//! - **[`RuntimeConfig`]** carries tunables resolved at graph-build time
//!
//! # Usage Example
//!
//! ```
//! use std::sync::Arc;
//! use threadloom::graph::GraphBuilder;
//! use threadloom::message::Message;
//! use threadloom::model::ScriptedModel;
//! use threadloom::node::GraphNode;
//! use threadloom::runtime::{Executor, InMemoryCheckpointer, RunOutcome};
//! use threadloom::state::ConversationState;
//! use threadloom::types::NodeId;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = Arc::new(ScriptedModel::replies(vec![Message::assistant("hi there")]));
//! let workflow = Arc::new(
//!     GraphBuilder::new()
//!         .add_node("agent", GraphNode::model(model))
//!         .add_edge(NodeId::Start, "agent")
//!         .add_edge("agent", NodeId::End)
//!         .compile()?,
//! );
//!
//! let executor = Executor::new(workflow, InMemoryCheckpointer::shared());
//! let outcome = executor
//!     .invoke("thread-1", ConversationState::new_with_user_message("hello"))
//!     .await?;
//! assert!(matches!(outcome, RunOutcome::Completed(_)));
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod config;
pub mod executor;
pub mod persistence;

pub use checkpoint::{
    Checkpoint, Checkpointer, CheckpointerError, InMemoryCheckpointer, PendingInterrupt,
};
pub use config::RuntimeConfig;
pub use executor::{Executor, ExecutorError, Interruption, RunOutcome};
pub use persistence::{
    PersistedCheckpoint, PersistedInterrupt, PersistedState, PersistenceError,
};
