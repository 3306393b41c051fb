//! Conversation state and snapshots.
//!
//! State holds two channels: the message transcript and an `extra` key-value
//! map for fields a workflow extracts along the way (a verified name, a
//! birthday). Nodes never mutate state directly; they return
//! [`NodePartial`](crate::node::NodePartial) deltas that the executor merges
//! through the reducer registry, so the transcript is only ever appended to
//! or patched in place by message id.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::message::Message;

/// The running state of one conversation thread.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use threadloom::state::ConversationState;
///
/// let state = ConversationState::builder()
///     .with_user_message("hello")
///     .with_extra("name", json!("Miro"))
///     .build();
/// let snapshot = state.snapshot();
/// assert_eq!(snapshot.messages.len(), 1);
/// assert_eq!(snapshot.extra.get("name"), Some(&json!("Miro")));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ConversationState {
    /// The ordered transcript.
    pub messages: Vec<Message>,
    /// Auxiliary fields, merged last-write-wins.
    pub extra: FxHashMap<String, Value>,
}

/// Immutable view of state handed to nodes and routing functions.
///
/// Snapshots are plain clones; mutating the live state after taking one does
/// not affect it.
#[derive(Clone, Debug, Default)]
pub struct StateSnapshot {
    /// Messages at snapshot time.
    pub messages: Vec<Message>,
    /// Extra fields at snapshot time.
    pub extra: FxHashMap<String, Value>,
}

impl StateSnapshot {
    /// The most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl ConversationState {
    /// State seeded with a single user message.
    #[must_use]
    pub fn new_with_user_message(user_text: &str) -> Self {
        Self {
            messages: vec![Message::user(user_text)],
            extra: FxHashMap::default(),
        }
    }

    /// State seeded with an existing transcript.
    #[must_use]
    pub fn new_with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            extra: FxHashMap::default(),
        }
    }

    /// Fluent builder for richer initial states.
    #[must_use]
    pub fn builder() -> ConversationStateBuilder {
        ConversationStateBuilder::default()
    }

    /// Takes an immutable snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.messages.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Builder for [`ConversationState`].
#[derive(Debug, Default)]
pub struct ConversationStateBuilder {
    messages: Vec<Message>,
    extra: FxHashMap<String, Value>,
}

impl ConversationStateBuilder {
    /// Appends a user message.
    #[must_use]
    pub fn with_user_message(mut self, content: &str) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Appends an assistant message.
    #[must_use]
    pub fn with_assistant_message(mut self, content: &str) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Appends a system message.
    #[must_use]
    pub fn with_system_message(mut self, content: &str) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Appends an arbitrary prebuilt message.
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets an extra field.
    #[must_use]
    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Builds the state.
    #[must_use]
    pub fn build(self) -> ConversationState {
        ConversationState {
            messages: self.messages,
            extra: self.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_is_independent_of_live_state() {
        let mut state = ConversationState::new_with_user_message("hello");
        state.extra.insert("k".into(), json!("before"));
        let snapshot = state.snapshot();

        state.messages.push(Message::assistant("later"));
        state.extra.insert("k".into(), json!("after"));

        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.extra.get("k"), Some(&json!("before")));
    }

    #[test]
    fn builder_preserves_message_order() {
        let state = ConversationState::builder()
            .with_system_message("you are terse")
            .with_user_message("hi")
            .with_assistant_message("hello")
            .build();
        let roles: Vec<&str> = state.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
    }
}
