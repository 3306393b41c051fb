//! The chat-model seam.
//!
//! The executor treats the model as an opaque collaborator behind
//! [`ChatModel`]: it hands over the transcript and gets one assistant
//! message back, possibly carrying tool-call requests. Real providers live
//! outside this crate; [`ScriptedModel`] is the deterministic stand-in used
//! by tests and the demo binary.

use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::Mutex;
use thiserror::Error;

use crate::message::Message;
use crate::tools::ToolSpec;

/// Errors surfaced by a chat-model collaborator.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    /// The provider rejected or failed the request.
    #[error("model provider error: {message}")]
    #[diagnostic(code(threadloom::model::provider))]
    Provider { message: String },

    /// The scripted model ran out of queued replies.
    #[error("scripted model exhausted after {served} replies")]
    #[diagnostic(
        code(threadloom::model::script_exhausted),
        help("Queue one reply per expected model turn when scripting a run.")
    )]
    ScriptExhausted { served: usize },
}

/// A chat model: transcript in, one assistant message out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produces the next assistant message for the given transcript.
    async fn invoke(&self, messages: &[Message]) -> Result<Message, ModelError>;

    /// Tool schemas this model may call. Defaults to none.
    fn bound_tools(&self) -> &[ToolSpec] {
        &[]
    }
}

/// Deterministic model that replays a queue of canned replies.
///
/// # Examples
///
/// ```
/// use threadloom::message::Message;
/// use threadloom::model::ScriptedModel;
///
/// let model = ScriptedModel::replies(vec![
///     Message::assistant("first turn"),
///     Message::assistant("second turn"),
/// ]);
/// ```
pub struct ScriptedModel {
    replies: Mutex<std::collections::VecDeque<Message>>,
    served: Mutex<usize>,
    tools: Vec<ToolSpec>,
}

impl ScriptedModel {
    /// Builds a model that serves the given replies in order.
    #[must_use]
    pub fn replies(replies: Vec<Message>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            served: Mutex::new(0),
            tools: Vec::new(),
        }
    }

    /// Declares tool schemas the scripted model pretends to know about.
    #[must_use]
    pub fn bind_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    /// Queues another reply behind whatever is already scripted.
    pub fn enqueue(&self, reply: Message) {
        self.replies.lock().push_back(reply);
    }

    /// How many replies have been served so far.
    #[must_use]
    pub fn served(&self) -> usize {
        *self.served.lock()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(&self, _messages: &[Message]) -> Result<Message, ModelError> {
        let next = self.replies.lock().pop_front();
        match next {
            Some(reply) => {
                *self.served.lock() += 1;
                Ok(reply)
            }
            None => Err(ModelError::ScriptExhausted {
                served: self.served(),
            }),
        }
    }

    fn bound_tools(&self) -> &[ToolSpec] {
        &self.tools
    }
}
