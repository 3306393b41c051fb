//! Serde-friendly mirrors of runtime state and checkpoints.
//!
//! Backends persist these shapes instead of the in-memory structs, keeping
//! conversion logic in one place (the `From` / `TryFrom` impls below) and
//! the stored form stable as internals evolve. Node ids are stored in their
//! `encode()` string form, timestamps as RFC3339 strings. This module does
//! no I/O.

use chrono::Utc;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::checkpoint::{Checkpoint, PendingInterrupt};
use crate::message::{Message, ToolCallRequest};
use crate::state::ConversationState;
use crate::types::NodeId;

/// Persisted shape of [`ConversationState`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersistedState {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub extra: FxHashMap<String, Value>,
}

/// Persisted shape of [`PendingInterrupt`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistedInterrupt {
    BeforeNode { node: String },
    HumanGate { node: String, call: ToolCallRequest },
}

/// Persisted shape of a full [`Checkpoint`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedCheckpoint {
    pub thread_id: String,
    pub step: u64,
    pub state: PersistedState,
    /// Next node in `NodeId::encode()` form.
    pub next_node: String,
    #[serde(default)]
    pub pending_interrupt: Option<PersistedInterrupt>,
    /// RFC3339 creation time (keeps `chrono::DateTime` out of the stored shape).
    pub created_at: String,
}

/// Conversion and serialization errors for persistence models.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("missing field: {0}")]
    #[diagnostic(
        code(threadloom::persistence::missing_field),
        help("Populate the field in the persisted JSON before conversion.")
    )]
    MissingField(&'static str),

    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(threadloom::persistence::serde),
        help("Ensure the JSON structure matches the Persisted* types.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

impl From<&ConversationState> for PersistedState {
    fn from(s: &ConversationState) -> Self {
        PersistedState {
            messages: s.messages.clone(),
            extra: s.extra.clone(),
        }
    }
}

impl From<PersistedState> for ConversationState {
    fn from(p: PersistedState) -> Self {
        ConversationState {
            messages: p.messages,
            extra: p.extra,
        }
    }
}

impl From<&PendingInterrupt> for PersistedInterrupt {
    fn from(interrupt: &PendingInterrupt) -> Self {
        match interrupt {
            PendingInterrupt::BeforeNode { node } => PersistedInterrupt::BeforeNode {
                node: node.encode(),
            },
            PendingInterrupt::HumanGate { node, call } => PersistedInterrupt::HumanGate {
                node: node.encode(),
                call: call.clone(),
            },
        }
    }
}

impl From<PersistedInterrupt> for PendingInterrupt {
    fn from(p: PersistedInterrupt) -> Self {
        match p {
            PersistedInterrupt::BeforeNode { node } => PendingInterrupt::BeforeNode {
                node: NodeId::decode(&node),
            },
            PersistedInterrupt::HumanGate { node, call } => PendingInterrupt::HumanGate {
                node: NodeId::decode(&node),
                call,
            },
        }
    }
}

impl From<&Checkpoint> for PersistedCheckpoint {
    fn from(cp: &Checkpoint) -> Self {
        PersistedCheckpoint {
            thread_id: cp.thread_id.clone(),
            step: cp.step,
            state: PersistedState::from(&cp.state),
            next_node: cp.next_node.encode(),
            pending_interrupt: cp.pending_interrupt.as_ref().map(PersistedInterrupt::from),
            created_at: cp.created_at.to_rfc3339(),
        }
    }
}

impl TryFrom<PersistedCheckpoint> for Checkpoint {
    type Error = PersistenceError;

    fn try_from(p: PersistedCheckpoint) -> Result<Self> {
        // A mangled timestamp is not worth refusing the whole checkpoint.
        let created_at = chrono::DateTime::parse_from_rfc3339(&p.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Ok(Checkpoint {
            thread_id: p.thread_id,
            state: ConversationState::from(p.state),
            next_node: NodeId::decode(&p.next_node),
            pending_interrupt: p.pending_interrupt.map(PendingInterrupt::from),
            step: p.step,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checkpoint_round_trips_through_persisted_form() {
        let mut state = ConversationState::new_with_user_message("hi");
        state.extra.insert("name".into(), json!("Miro"));
        let call = ToolCallRequest::new("verify_user_info", json!({"name": "Miro"}));
        let checkpoint = Checkpoint {
            thread_id: "t1".into(),
            state,
            next_node: NodeId::Named("gate".into()),
            pending_interrupt: Some(PendingInterrupt::HumanGate {
                node: NodeId::Named("gate".into()),
                call,
            }),
            step: 4,
            created_at: Utc::now(),
        };

        let persisted = PersistedCheckpoint::from(&checkpoint);
        assert_eq!(persisted.next_node, "Named:gate");
        let restored = Checkpoint::try_from(persisted).expect("convertible");
        assert_eq!(restored.thread_id, checkpoint.thread_id);
        assert_eq!(restored.step, checkpoint.step);
        assert_eq!(restored.next_node, checkpoint.next_node);
        assert_eq!(restored.state, checkpoint.state);
        assert_eq!(restored.pending_interrupt, checkpoint.pending_interrupt);
    }

    #[test]
    fn bad_timestamp_is_replaced_not_rejected() {
        let persisted = PersistedCheckpoint {
            thread_id: "t1".into(),
            step: 0,
            state: PersistedState::default(),
            next_node: "End".into(),
            pending_interrupt: None,
            created_at: "not a timestamp".into(),
        };
        let restored = Checkpoint::try_from(persisted).expect("convertible");
        assert_eq!(restored.next_node, NodeId::End);
    }

    #[test]
    fn persisted_json_shape_is_stable() {
        let persisted = PersistedCheckpoint {
            thread_id: "t1".into(),
            step: 2,
            state: PersistedState::default(),
            next_node: "Named:agent".into(),
            pending_interrupt: Some(PersistedInterrupt::BeforeNode {
                node: "Named:action".into(),
            }),
            created_at: "2026-01-01T00:00:00+00:00".into(),
        };
        let text = serde_json::to_string(&persisted).expect("serializable");
        assert!(text.contains("\"kind\":\"before_node\""));
        let back: PersistedCheckpoint = serde_json::from_str(&text).expect("deserializable");
        assert_eq!(back, persisted);
    }
}
