use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A structured request, emitted by a model response, naming a tool and its
/// arguments.
///
/// The tool node (or a resumed interrupt) must produce exactly one tool
/// message whose [`Message::tool_call_id`] matches [`ToolCallRequest::id`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON arguments forwarded verbatim to the tool.
    pub args: Value,
    /// Correlation id linking the request to its tool response.
    pub id: String,
}

impl ToolCallRequest {
    /// Creates a request with a fresh correlation id.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
            id: format!("call-{}", Uuid::new_v4()),
        }
    }

    /// Creates a request with an explicit correlation id.
    #[must_use]
    pub fn with_id(name: impl Into<String>, args: Value, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args,
            id: id.into(),
        }
    }
}

/// A message in a conversation: a role, text content, and optional tool-call
/// plumbing.
///
/// Every message carries a generated `id`. The messages reducer treats an
/// incoming message whose id matches an existing one as an in-place
/// replacement, which is what lets a suspended thread edit a pending tool
/// call through `update_state` without appending a duplicate.
///
/// # Examples
///
/// ```
/// use threadloom::message::Message;
///
/// let user = Message::user("What's the weather in Quincy, MA?");
/// let reply = Message::assistant("Let me check.");
/// assert!(user.has_role(Message::USER));
/// assert!(reply.tool_calls.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identity used for replace-by-id merging.
    pub id: String,
    /// The role of the sender (use the constants on [`Message`]).
    pub role: String,
    /// The text content.
    pub content: String,
    /// Tool-call requests attached to an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// For tool messages, the id of the call this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// AI assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System prompt or instruction message role.
    pub const SYSTEM: &'static str = "system";
    /// Tool observation message role.
    pub const TOOL: &'static str = "tool";

    /// Creates a new message with the specified role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            role: role.to_string(),
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Creates a tool response message answering the given call id.
    #[must_use]
    pub fn tool(content: &str, call_id: impl Into<String>) -> Self {
        let mut msg = Self::new(Self::TOOL, content);
        msg.tool_call_id = Some(call_id.into());
        msg
    }

    /// Attaches tool-call requests (builder style).
    #[must_use]
    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRequest>) -> Self {
        self.tool_calls = calls;
        self
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Returns true if this message carries at least one pending tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
