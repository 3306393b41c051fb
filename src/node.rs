//! Node variants and partial state updates.
//!
//! Nodes are a closed set of tagged variants dispatched by the executor
//! rather than opaque callbacks: a model node, a tool-dispatch node, and a
//! human gate that suspends execution until a resume payload arrives. Each
//! step a node either yields a [`NodePartial`] to merge into state or asks
//! the executor to suspend on a pending tool call.

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::message::{Message, ToolCallRequest};
use crate::model::{ChatModel, ModelError};
use crate::state::StateSnapshot;
use crate::tools::{ToolError, ToolRegistry};

/// Partial state update returned by node execution.
///
/// Both fields are optional; the reducer registry merges whatever is present
/// (messages append or replace by id, extras last-write-wins).
#[derive(Clone, Debug, Default)]
pub struct NodePartial {
    /// Messages to merge into the transcript.
    pub messages: Option<Vec<Message>>,
    /// Extra fields to merge into the side channel.
    pub extra: Option<FxHashMap<String, Value>>,
}

impl NodePartial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the messages delta.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Sets the extra delta.
    #[must_use]
    pub fn with_extra(mut self, extra: FxHashMap<String, Value>) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// What a node asks the executor to do after running.
#[derive(Clone, Debug)]
pub enum NodeStep {
    /// Merge this delta and keep going.
    Advance(NodePartial),
    /// Suspend the thread; the payload call awaits an external resume value.
    Suspend(ToolCallRequest),
}

/// Fatal errors raised by node execution. A failing node aborts the run and
/// leaves the thread at its last checkpoint.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(threadloom::node::missing_input),
        help("Check that the previous node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// The chat model failed.
    #[error(transparent)]
    #[diagnostic(code(threadloom::node::model))]
    Model(#[from] ModelError),

    /// A tool invocation failed.
    #[error(transparent)]
    #[diagnostic(code(threadloom::node::tool))]
    Tool(#[from] ToolError),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(threadloom::node::serde_json))]
    Serde(#[from] serde_json::Error),
}

/// Configuration for a human-in-the-loop gate node.
///
/// The gate watches for a pending tool call with the configured name and
/// suspends the thread before answering it. [`HumanGate::resolve`] turns a
/// resume payload into the tool response: a confirming payload (`correct`
/// starting with "y") keeps the requested fields as-is; anything else takes
/// corrections from the payload, falling back to the original arguments per
/// field when a key is absent or malformed.
#[derive(Clone, Debug)]
pub struct HumanGate {
    tool_name: String,
}

/// Outcome of applying a resume payload to a suspended gate.
#[derive(Clone, Debug)]
pub struct GateResolution {
    /// Tool response message answering the suspended call.
    pub message: Message,
    /// Verified fields to merge into `extra` (last write wins).
    pub extra: FxHashMap<String, Value>,
}

impl HumanGate {
    /// Fields the gate asks a human to verify.
    const REVIEWED_FIELDS: [&'static str; 2] = ["name", "birthday"];

    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
        }
    }

    /// The tool name whose calls this gate intercepts.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Finds the pending call this gate should suspend on, if any.
    #[must_use]
    pub fn pending_call(&self, snapshot: &StateSnapshot) -> Option<ToolCallRequest> {
        snapshot
            .last_message()
            .filter(|m| m.has_role(Message::ASSISTANT))
            .and_then(|m| {
                m.tool_calls
                    .iter()
                    .find(|c| c.name == self.tool_name)
                    .cloned()
            })
    }

    /// Applies a resume payload to the suspended call.
    pub fn resolve(&self, call: &ToolCallRequest, payload: &Value) -> GateResolution {
        let confirmed = payload
            .get("correct")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_ascii_lowercase().starts_with('y'))
            .unwrap_or(false);

        let mut extra = FxHashMap::default();
        let message = if confirmed {
            for field in Self::REVIEWED_FIELDS {
                if let Some(original) = call.args.get(field) {
                    extra.insert(field.to_string(), original.clone());
                }
            }
            Message::tool("Correct", call.id.clone())
        } else {
            let mut corrections: Vec<String> = Vec::new();
            for field in Self::REVIEWED_FIELDS {
                // Payload value wins; a missing or non-string key falls back
                // to whatever the original request carried.
                let corrected = payload.get(field).filter(|v| v.is_string());
                let value = corrected.or_else(|| call.args.get(field));
                if let Some(value) = value {
                    extra.insert(field.to_string(), value.clone());
                }
                if let Some(corrected) = corrected {
                    corrections.push(format!("{field}={corrected}"));
                }
            }
            let content = if corrections.is_empty() {
                "No usable correction supplied; kept the original values".to_string()
            } else {
                format!("Made a correction: {}", corrections.join(", "))
            };
            Message::tool(&content, call.id.clone())
        };

        GateResolution { message, extra }
    }
}

/// An executable graph node.
///
/// The executor matches on the variant; there is no dynamic node trait to
/// implement. Model and tool collaborators stay behind their own traits, so
/// the set of node behaviors is closed while the collaborators are open.
#[derive(Clone)]
pub enum GraphNode {
    /// Asks the chat model for the next assistant message.
    Model(Arc<dyn ChatModel>),
    /// Executes pending tool calls from the last assistant message.
    Tools(Arc<ToolRegistry>),
    /// Suspends on a named tool call until a human resume payload arrives.
    HumanGate(HumanGate),
}

impl GraphNode {
    /// Convenience constructor for a model node.
    #[must_use]
    pub fn model(model: Arc<dyn ChatModel>) -> Self {
        GraphNode::Model(model)
    }

    /// Convenience constructor for a tool-dispatch node.
    #[must_use]
    pub fn tools(registry: Arc<ToolRegistry>) -> Self {
        GraphNode::Tools(registry)
    }

    /// Convenience constructor for a human gate on the given tool name.
    #[must_use]
    pub fn human_gate(tool_name: impl Into<String>) -> Self {
        GraphNode::HumanGate(HumanGate::new(tool_name))
    }

    /// Short label for logging and DOT output.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            GraphNode::Model(_) => "model",
            GraphNode::Tools(_) => "tools",
            GraphNode::HumanGate(_) => "human_gate",
        }
    }

    /// Runs this node against a snapshot.
    pub async fn run(&self, snapshot: &StateSnapshot) -> Result<NodeStep, NodeError> {
        match self {
            GraphNode::Model(model) => {
                let reply = model.invoke(&snapshot.messages).await?;
                Ok(NodeStep::Advance(
                    NodePartial::new().with_messages(vec![reply]),
                ))
            }
            GraphNode::Tools(registry) => {
                let last = snapshot
                    .last_message()
                    .filter(|m| m.has_tool_calls())
                    .ok_or(NodeError::MissingInput {
                        what: "pending tool calls",
                    })?;
                let responses = registry.dispatch(&last.tool_calls).await?;
                Ok(NodeStep::Advance(
                    NodePartial::new().with_messages(responses),
                ))
            }
            GraphNode::HumanGate(gate) => {
                let call = gate
                    .pending_call(snapshot)
                    .ok_or(NodeError::MissingInput {
                        what: "pending human-gate tool call",
                    })?;
                Ok(NodeStep::Suspend(call))
            }
        }
    }
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GraphNode").field(&self.kind_label()).finish()
    }
}
