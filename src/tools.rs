//! Tools and tool dispatch.
//!
//! A [`Tool`] is any external capability the model can request by name with
//! JSON arguments. The [`ToolRegistry`] resolves requests to implementations
//! and turns results into tool messages carrying the originating call id.
//!
//! Dispatch policy: when any registered tool is interruptible (requires a
//! human resume), at most one call per turn is processed so that a resumed
//! thread always lands on exactly one outstanding call.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use thiserror::Error;

use crate::message::{Message, ToolCallRequest};

/// Errors raised while resolving or invoking tools.
#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    /// The requested tool name is not registered.
    #[error("unresolved tool: {name}")]
    #[diagnostic(
        code(threadloom::tools::unresolved),
        help("Register the tool on the ToolRegistry before compiling the graph.")
    )]
    Unresolved { name: String },

    /// The tool itself failed.
    #[error("tool {tool} failed: {message}")]
    #[diagnostic(code(threadloom::tools::invocation))]
    Invocation { tool: String, message: String },
}

/// Declarative schema for a tool, as advertised to the model.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the arguments.
    pub parameters: Value,
}

/// An external capability invocable with JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the model uses to request this tool.
    fn name(&self) -> &str;

    /// What the tool does and when to use it.
    fn description(&self) -> &str;

    /// JSON-schema object for the arguments. Defaults to a single free-form
    /// `input` string.
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string", "description": self.description() }
            },
            "required": ["input"]
        })
    }

    /// Whether calls to this tool suspend the thread for human input.
    fn interruptible(&self) -> bool {
        false
    }

    /// Executes the tool.
    async fn invoke(&self, args: Value) -> Result<Value, ToolError>;

    /// The advertised schema for this tool.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Name-keyed collection of tools with dispatch.
#[derive(Default)]
pub struct ToolRegistry {
    tools: FxHashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool (builder style). Later registrations under the same
    /// name replace earlier ones.
    #[must_use]
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// True if any registered tool requires a human resume.
    #[must_use]
    pub fn has_interruptible(&self) -> bool {
        self.tools.values().any(|t| t.interruptible())
    }

    /// Schemas of every registered tool, sorted by name for determinism.
    #[must_use]
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Executes pending calls and returns one tool message per processed
    /// call, each carrying the originating call id.
    ///
    /// With an interruptible tool registered, only the first call is
    /// processed; the rest are left for the next turn.
    pub async fn dispatch(&self, calls: &[ToolCallRequest]) -> Result<Vec<Message>, ToolError> {
        let limit = if self.has_interruptible() { 1 } else { calls.len() };
        let mut responses = Vec::with_capacity(calls.len().min(limit));

        for call in calls.iter().take(limit) {
            let tool = self.get(&call.name).ok_or_else(|| ToolError::Unresolved {
                name: call.name.clone(),
            })?;
            tracing::debug!(tool = %call.name, call_id = %call.id, "dispatching tool call");
            let result = tool.invoke(call.args.clone()).await?;
            let content = match &result {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            responses.push(Message::tool(&content, call.id.clone()));
        }

        Ok(responses)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

/// Placeholder web-search tool returning a canned observation.
///
/// Stands in for a real search backend; the model is none the wiser.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderSearch;

impl PlaceholderSearch {
    /// The observation every search returns.
    pub const CANNED_ANSWER: &'static str =
        "It's sunny in Boston, but you better look out if you're a Gemini.";
}

#[async_trait]
impl Tool for PlaceholderSearch {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Call to surf the web."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to search for" }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, _args: Value) -> Result<Value, ToolError> {
        Ok(json!([Self::CANNED_ANSWER]))
    }
}
