//! Checkpoints and the pluggable persistence seam.
//!
//! A checkpoint is the full resumable position of one thread: the merged
//! state, the node that runs next, the step counter, and whatever the thread
//! is suspended on. The executor writes one after every merged step, so a
//! failing node never corrupts a thread; the last good checkpoint stays as
//! it was.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;

use super::persistence::{PersistedCheckpoint, PersistenceError};
use crate::message::ToolCallRequest;
use crate::state::ConversationState;
use crate::types::NodeId;

/// What a suspended thread is waiting for.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingInterrupt {
    /// Paused on an `interrupt_before` point; resuming runs the node.
    BeforeNode { node: NodeId },
    /// A human gate suspended on this tool call; resuming resolves it with
    /// the payload.
    HumanGate { node: NodeId, call: ToolCallRequest },
}

impl PendingInterrupt {
    /// The node the thread is suspended at.
    #[must_use]
    pub fn node(&self) -> &NodeId {
        match self {
            PendingInterrupt::BeforeNode { node } => node,
            PendingInterrupt::HumanGate { node, .. } => node,
        }
    }

    /// The pending tool call id, when there is one.
    #[must_use]
    pub fn call_id(&self) -> Option<&str> {
        match self {
            PendingInterrupt::BeforeNode { .. } => None,
            PendingInterrupt::HumanGate { call, .. } => Some(&call.id),
        }
    }
}

/// The resumable position of one thread.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    pub thread_id: String,
    pub state: ConversationState,
    /// The node that runs next when the thread continues.
    pub next_node: NodeId,
    pub pending_interrupt: Option<PendingInterrupt>,
    /// Number of node executions merged so far.
    pub step: u64,
    pub created_at: DateTime<Utc>,
}

/// Errors surfaced by checkpoint backends.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    #[error("no checkpoint for thread: {thread_id}")]
    #[diagnostic(
        code(threadloom::checkpointer::not_found),
        help("Invoke the thread at least once before loading or resuming it.")
    )]
    NotFound { thread_id: String },

    #[error(transparent)]
    #[diagnostic(code(threadloom::checkpointer::persistence))]
    Persistence(#[from] PersistenceError),

    #[error("checkpoint backend error: {0}")]
    #[diagnostic(code(threadloom::checkpointer::backend))]
    Backend(String),
}

/// Pluggable persistence for thread checkpoints, keyed by thread id.
///
/// One checkpoint per thread; `save` overwrites. Durable backends can keep
/// history, the executor only ever reads the latest.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persists the latest checkpoint for its thread, replacing any prior one.
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointerError>;

    /// Loads the latest checkpoint for a thread, `None` if the thread has
    /// never been saved.
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointerError>;

    /// Thread ids with at least one saved checkpoint, sorted.
    async fn list_threads(&self) -> Result<Vec<String>, CheckpointerError>;
}

/// Volatile checkpointer for tests and single-process runs.
///
/// Stores the serde shape rather than the live structs, so the same
/// conversion path is exercised as any durable backend would use.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    store: Mutex<FxHashMap<String, PersistedCheckpoint>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle ready to hand to an executor.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointerError> {
        let persisted = PersistedCheckpoint::from(&checkpoint);
        self.store
            .lock()
            .insert(checkpoint.thread_id.clone(), persisted);
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointerError> {
        let persisted = self.store.lock().get(thread_id).cloned();
        match persisted {
            Some(p) => Ok(Some(Checkpoint::try_from(p)?)),
            None => Ok(None),
        }
    }

    async fn list_threads(&self) -> Result<Vec<String>, CheckpointerError> {
        let mut ids: Vec<String> = self.store.lock().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn sample_checkpoint(thread_id: &str, step: u64) -> Checkpoint {
        Checkpoint {
            thread_id: thread_id.to_string(),
            state: ConversationState::new_with_user_message("hello"),
            next_node: NodeId::Named("agent".into()),
            pending_interrupt: None,
            step,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let cp = InMemoryCheckpointer::new();
        cp.save(sample_checkpoint("t1", 1)).await.unwrap();

        let loaded = cp.load("t1").await.unwrap().expect("saved");
        assert_eq!(loaded.thread_id, "t1");
        assert_eq!(loaded.step, 1);
        assert_eq!(loaded.next_node, NodeId::Named("agent".into()));
        assert_eq!(loaded.state.messages[0].content, "hello");
    }

    #[tokio::test]
    async fn load_unknown_thread_is_none() {
        let cp = InMemoryCheckpointer::new();
        assert!(cp.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_step() {
        let cp = InMemoryCheckpointer::new();
        cp.save(sample_checkpoint("t1", 1)).await.unwrap();
        let mut later = sample_checkpoint("t1", 2);
        later.state.messages.push(Message::assistant("more"));
        cp.save(later).await.unwrap();

        let loaded = cp.load("t1").await.unwrap().expect("saved");
        assert_eq!(loaded.step, 2);
        assert_eq!(loaded.state.messages.len(), 2);
    }

    #[tokio::test]
    async fn pending_interrupt_survives_round_trip() {
        let cp = InMemoryCheckpointer::new();
        let call = ToolCallRequest::new("verify_user_info", serde_json::json!({"name": "Miro"}));
        let mut checkpoint = sample_checkpoint("t1", 3);
        checkpoint.pending_interrupt = Some(PendingInterrupt::HumanGate {
            node: NodeId::Named("gate".into()),
            call: call.clone(),
        });
        cp.save(checkpoint).await.unwrap();

        let loaded = cp.load("t1").await.unwrap().expect("saved");
        match loaded.pending_interrupt {
            Some(PendingInterrupt::HumanGate { node, call: got }) => {
                assert_eq!(node, NodeId::Named("gate".into()));
                assert_eq!(got.id, call.id);
                assert_eq!(got.name, "verify_user_info");
            }
            other => panic!("unexpected interrupt: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_threads_is_sorted() {
        let cp = InMemoryCheckpointer::new();
        cp.save(sample_checkpoint("b", 0)).await.unwrap();
        cp.save(sample_checkpoint("a", 0)).await.unwrap();
        assert_eq!(cp.list_threads().await.unwrap(), vec!["a", "b"]);
    }
}
