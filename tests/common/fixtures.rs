//! Shared fixtures for integration tests.

use std::sync::Arc;

use serde_json::{Value, json};
use threadloom::graph::{GraphBuilder, Workflow};
use threadloom::message::{Message, ToolCallRequest};
use threadloom::model::ScriptedModel;
use threadloom::node::GraphNode;
use threadloom::runtime::{Executor, InMemoryCheckpointer};
use threadloom::state::StateSnapshot;
use threadloom::tools::{PlaceholderSearch, ToolRegistry};
use threadloom::types::NodeId;

/// Assistant message carrying one pending tool call.
pub fn tool_call_reply(tool: &str, args: Value) -> Message {
    Message::assistant("").with_tool_calls(vec![ToolCallRequest::new(tool, args)])
}

/// Same, with an explicit call id for assertions.
pub fn tool_call_reply_with_id(tool: &str, args: Value, id: &str) -> Message {
    Message::assistant("").with_tool_calls(vec![ToolCallRequest::with_id(tool, args, id)])
}

/// The classic agent router: loop into the tool node while the newest
/// message requests tools, otherwise finish.
pub fn should_continue(snapshot: &StateSnapshot) -> String {
    let pending = snapshot
        .last_message()
        .map(Message::has_tool_calls)
        .unwrap_or(false);
    if pending {
        "continue".into()
    } else {
        "end".into()
    }
}

/// Two-node search agent: model decides, search tool acts, loop until the
/// model stops requesting tools.
pub fn search_agent_workflow(model: Arc<ScriptedModel>, interrupt_before_action: bool) -> Workflow {
    let registry = Arc::new(ToolRegistry::new().register(Arc::new(PlaceholderSearch)));
    let mut builder = GraphBuilder::new()
        .add_node("agent", GraphNode::model(model))
        .add_node("action", GraphNode::tools(registry))
        .add_edge(NodeId::Start, "agent")
        .add_conditional_edge(
            "agent",
            should_continue,
            [("continue", "action"), ("end", "End")],
        )
        .add_edge("action", "agent");
    if interrupt_before_action {
        builder = builder.interrupt_before("action");
    }
    builder.compile().expect("valid graph")
}

/// Model scripted for one complete search turn: request the tool, then
/// answer.
pub fn scripted_search_turn(question: &str, answer: &str) -> Arc<ScriptedModel> {
    Arc::new(ScriptedModel::replies(vec![
        tool_call_reply("search", json!({ "query": question })),
        Message::assistant(answer),
    ]))
}

/// Executor over an in-memory checkpointer.
pub fn executor_for(workflow: Workflow) -> Executor {
    Executor::new(Arc::new(workflow), InMemoryCheckpointer::shared())
}
