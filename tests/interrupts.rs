//! Suspension and resume: interrupt-before points, mid-pause state edits,
//! and the human gate.

mod common;
use common::*;

use std::sync::Arc;

use serde_json::{Value, json};
use threadloom::graph::GraphBuilder;
use threadloom::message::{Message, ToolCallRequest};
use threadloom::model::ScriptedModel;
use threadloom::node::{GraphNode, NodePartial};
use threadloom::runtime::{Executor, ExecutorError, PendingInterrupt, RunOutcome};
use threadloom::state::ConversationState;
use threadloom::types::NodeId;

#[tokio::test]
async fn interrupt_before_suspends_ahead_of_the_tool_node() {
    let model = scripted_search_turn("weather in Quincy, MA", "final answer");
    let executor = executor_for(search_agent_workflow(model, true));

    let outcome = executor
        .invoke("3", ConversationState::new_with_user_message("weather?"))
        .await
        .expect("run ok");

    let RunOutcome::Suspended(interruption) = outcome else {
        panic!("expected suspension before the action node");
    };
    assert_eq!(interruption.node, NodeId::Named("action".into()));
    assert!(interruption.call.is_none());

    // Tool has not run: the transcript ends at the pending request.
    let snapshot = executor.get_state("3").await.expect("checkpointed");
    assert!(snapshot.last_message().unwrap().has_tool_calls());
    assert!(matches!(
        executor.pending_interrupt("3").await.expect("checkpointed"),
        Some(PendingInterrupt::BeforeNode { .. })
    ));
}

#[tokio::test]
async fn resume_runs_the_parked_node_and_finishes() {
    let model = scripted_search_turn("q", "all done");
    let executor = executor_for(search_agent_workflow(model, true));

    executor
        .invoke("3", ConversationState::new_with_user_message("q"))
        .await
        .expect("run ok");
    let outcome = executor.resume("3", Value::Null).await.expect("resume ok");

    let RunOutcome::Completed(snapshot) = outcome else {
        panic!("expected completion after resume");
    };
    let roles: Vec<&str> = snapshot.messages.iter().map(|m| m.role.as_str()).collect();
    assert_eq!(roles, vec!["user", "assistant", "tool", "assistant"]);
    assert_eq!(snapshot.last_message().unwrap().content, "all done");
}

#[tokio::test]
async fn suspended_thread_rejects_invoke() {
    let model = scripted_search_turn("q", "unused");
    let executor = executor_for(search_agent_workflow(model, true));

    executor
        .invoke("3", ConversationState::new_with_user_message("q"))
        .await
        .expect("run ok");
    let err = executor
        .invoke("3", ConversationState::new_with_user_message("again"))
        .await
        .expect_err("suspended threads resume, not re-invoke");
    assert!(matches!(err, ExecutorError::ThreadSuspended { .. }));
}

#[tokio::test]
async fn pending_tool_call_can_be_edited_while_suspended() {
    let model = scripted_search_turn("weather in SF", "answer");
    let executor = executor_for(search_agent_workflow(model, true));

    executor
        .invoke("3", ConversationState::new_with_user_message("weather?"))
        .await
        .expect("run ok");

    // Patch the suspended request in place: same message id, same call id,
    // new arguments.
    let snapshot = executor.get_state("3").await.expect("checkpointed");
    let request = snapshot.last_message().expect("pending request").clone();
    let call = request.tool_calls[0].clone();
    let mut patched = request.clone();
    patched.tool_calls[0] =
        ToolCallRequest::with_id("search", json!({"query": "weather in Quincy, MA"}), call.id);

    let after_edit = executor
        .update_state("3", NodePartial::new().with_messages(vec![patched]))
        .await
        .expect("edit ok");
    // Replaced, not appended.
    assert_eq!(after_edit.messages.len(), snapshot.messages.len());
    assert_eq!(
        after_edit.last_message().unwrap().tool_calls[0].args,
        json!({"query": "weather in Quincy, MA"})
    );
    assert_eq!(after_edit.last_message().unwrap().id, request.id);

    let outcome = executor.resume("3", Value::Null).await.expect("resume ok");
    assert!(matches!(outcome, RunOutcome::Completed(_)));
}

fn gate_workflow(model: Arc<ScriptedModel>) -> Executor {
    let workflow = GraphBuilder::new()
        .add_node("agent", GraphNode::model(model))
        .add_node("gate", GraphNode::human_gate("verify_user_info"))
        .add_edge(NodeId::Start, "agent")
        .add_conditional_edge("agent", should_continue, [("continue", "gate"), ("end", "End")])
        .add_edge("gate", "agent")
        .compile()
        .expect("valid graph");
    executor_for(workflow)
}

fn gate_model(answer: &str) -> Arc<ScriptedModel> {
    Arc::new(ScriptedModel::replies(vec![
        tool_call_reply(
            "verify_user_info",
            json!({"name": "Miro", "birthday": "Jan 1"}),
        ),
        Message::assistant(answer),
    ]))
}

#[tokio::test]
async fn human_gate_suspends_on_its_tool_call() {
    let executor = gate_workflow(gate_model("thanks"));

    let outcome = executor
        .invoke("g1", ConversationState::new_with_user_message("hi, I'm Miro"))
        .await
        .expect("run ok");

    let RunOutcome::Suspended(interruption) = outcome else {
        panic!("expected gate suspension");
    };
    assert_eq!(interruption.node, NodeId::Named("gate".into()));
    let call = interruption.call.expect("gate carries the call");
    assert_eq!(call.name, "verify_user_info");
    assert_eq!(call.args["name"], json!("Miro"));
}

#[tokio::test]
async fn confirming_payload_keeps_the_original_fields() {
    let executor = gate_workflow(gate_model("confirmed, thanks"));
    executor
        .invoke("g1", ConversationState::new_with_user_message("hi"))
        .await
        .expect("run ok");

    let outcome = executor
        .resume("g1", json!({"correct": "yes"}))
        .await
        .expect("resume ok");

    let RunOutcome::Completed(snapshot) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(snapshot.extra.get("name"), Some(&json!("Miro")));
    assert_eq!(snapshot.extra.get("birthday"), Some(&json!("Jan 1")));

    let tool_msg = snapshot
        .messages
        .iter()
        .find(|m| m.has_role(Message::TOOL))
        .expect("gate answered the call");
    assert_eq!(tool_msg.content, "Correct");
}

#[tokio::test]
async fn corrective_payload_overwrites_and_documents_the_change() {
    let executor = gate_workflow(gate_model("updated, thanks"));
    executor
        .invoke("g1", ConversationState::new_with_user_message("hi"))
        .await
        .expect("run ok");

    let outcome = executor
        .resume("g1", json!({"correct": "no", "name": "Miroslav"}))
        .await
        .expect("resume ok");

    let RunOutcome::Completed(snapshot) = outcome else {
        panic!("expected completion");
    };
    // Corrected field from the payload, untouched field from the call.
    assert_eq!(snapshot.extra.get("name"), Some(&json!("Miroslav")));
    assert_eq!(snapshot.extra.get("birthday"), Some(&json!("Jan 1")));

    let tool_msg = snapshot
        .messages
        .iter()
        .find(|m| m.has_role(Message::TOOL))
        .expect("gate answered the call");
    assert!(tool_msg.content.starts_with("Made a correction:"));
    assert!(tool_msg.content.contains("name"));
}

#[tokio::test]
async fn malformed_payload_falls_back_to_original_values() {
    let executor = gate_workflow(gate_model("kept as-is"));
    executor
        .invoke("g1", ConversationState::new_with_user_message("hi"))
        .await
        .expect("run ok");

    let outcome = executor
        .resume("g1", json!({"unexpected": 42}))
        .await
        .expect("resume ok");

    let RunOutcome::Completed(snapshot) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(snapshot.extra.get("name"), Some(&json!("Miro")));
    assert_eq!(snapshot.extra.get("birthday"), Some(&json!("Jan 1")));

    let tool_msg = snapshot
        .messages
        .iter()
        .find(|m| m.has_role(Message::TOOL))
        .expect("gate answered the call");
    assert!(tool_msg.content.contains("kept the original values"));
}

#[tokio::test]
async fn gate_resolution_answers_the_suspended_call_id() {
    let executor = gate_workflow(gate_model("done"));
    let outcome = executor
        .invoke("g1", ConversationState::new_with_user_message("hi"))
        .await
        .expect("run ok");
    let RunOutcome::Suspended(interruption) = outcome else {
        panic!("expected suspension");
    };
    let call_id = interruption.call.expect("gate call").id;

    let RunOutcome::Completed(snapshot) = executor
        .resume("g1", json!({"correct": "y"}))
        .await
        .expect("resume ok")
    else {
        panic!("expected completion");
    };
    let tool_msg = snapshot
        .messages
        .iter()
        .find(|m| m.has_role(Message::TOOL))
        .expect("gate answered");
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some(call_id.as_str()));
}
