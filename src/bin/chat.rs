//! Interactive chat loop over a search-agent workflow.
//!
//! Builds the classic two-node agent graph (model decides, tool acts, loop
//! until the model stops requesting tools) with an interrupt point before
//! the tool node: every pending search is shown to you first, and you can
//! approve it as-is or rewrite the query before it runs.
//!
//! The model is scripted and the search tool returns a canned observation,
//! so the whole loop runs offline. Type `quit`, `exit`, or `q` to leave;
//! an empty line asks a built-in fallback question.

use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use serde_json::{Value, json};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use threadloom::events::Event;
use threadloom::graph::GraphBuilder;
use threadloom::message::{Message, ToolCallRequest};
use threadloom::model::ScriptedModel;
use threadloom::node::{GraphNode, NodePartial};
use threadloom::repl::{self, ReplInput, TurnCommand};
use threadloom::runtime::{Executor, InMemoryCheckpointer, RunOutcome, RuntimeConfig};
use threadloom::state::{ConversationState, StateSnapshot};
use threadloom::tools::{PlaceholderSearch, ToolRegistry};
use threadloom::types::NodeId;

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn,threadloom=warn"))
        .expect("static filter parses");

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    miette::set_panic_hook();
    chat().await
}

async fn chat() -> Result<()> {
    let config = RuntimeConfig::default();
    let thread_id = config.default_thread_id.clone();

    let model = Arc::new(ScriptedModel::replies(vec![]));
    let registry = Arc::new(ToolRegistry::new().register(Arc::new(PlaceholderSearch)));

    let workflow = Arc::new(
        GraphBuilder::new()
            .add_node("agent", GraphNode::model(model.clone()))
            .add_node("action", GraphNode::tools(registry))
            .add_edge(NodeId::Start, "agent")
            .add_conditional_edge(
                "agent",
                |snapshot: &StateSnapshot| {
                    let pending = snapshot
                        .last_message()
                        .map(Message::has_tool_calls)
                        .unwrap_or(false);
                    if pending { "continue".into() } else { "end".into() }
                },
                [("continue", "action"), ("end", "End")],
            )
            .add_edge("action", "agent")
            .interrupt_before("action")
            .with_runtime_config(config.clone())
            .compile()
            .into_diagnostic()?,
    );

    workflow.write_visualization(&config.visualization_path).await;

    let executor = Executor::new(workflow, InMemoryCheckpointer::shared());
    let events = executor.subscribe();
    let mut input = ReplInput::stdin();

    println!("Ask me anything. Empty line asks: {:?}", repl::FALLBACK_QUESTION);

    loop {
        println!();
        print!("> ");
        flush_stdout();
        let (question, last_turn) = match input.read_turn().await {
            TurnCommand::Quit => break,
            TurnCommand::Ask(question) => (question, false),
            TurnCommand::FinalAsk(question) => {
                println!("{question}");
                (question, true)
            }
        };

        let state = next_turn_state(&executor, &thread_id, &question).await?;
        script_turn(&model, &question);

        let mut outcome = executor.invoke(&thread_id, state).await.into_diagnostic()?;
        drain_events(&events);

        while let RunOutcome::Suspended(interruption) = outcome {
            match &interruption.call {
                Some(call) => {
                    // A human gate is waiting on a specific tool call.
                    println!("[paused] {} is waiting on your answer: {}", call.name, call.args);
                    print!("reply> ");
                    flush_stdout();
                    let reply = input.read_line().await.unwrap_or_default();
                    outcome = executor
                        .resume(&interruption.thread_id, json!({ "correct": reply }))
                        .await
                        .into_diagnostic()?;
                }
                None => {
                    review_pending_search(&executor, &interruption.thread_id, &mut input).await?;
                    outcome = executor
                        .resume(&interruption.thread_id, Value::Null)
                        .await
                        .into_diagnostic()?;
                }
            }
            drain_events(&events);
        }

        if let RunOutcome::Completed(snapshot) = outcome {
            if let Some(last) = snapshot.last_message() {
                println!("{}", last.content);
            }
        }

        if last_turn {
            break;
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Prior transcript plus the new user question, or a fresh state on the
/// first turn.
async fn next_turn_state(
    executor: &Executor,
    thread_id: &str,
    question: &str,
) -> Result<ConversationState> {
    match executor.get_state(thread_id).await {
        Ok(snapshot) => {
            let mut state = ConversationState {
                messages: snapshot.messages,
                extra: snapshot.extra,
            };
            state.messages.push(Message::user(question));
            Ok(state)
        }
        Err(_) => Ok(ConversationState::new_with_user_message(question)),
    }
}

/// Queues the scripted pair for one turn: a tool-calling decision, then a
/// final answer once the observation is in.
fn script_turn(model: &ScriptedModel, question: &str) {
    model.enqueue(
        Message::assistant("")
            .with_tool_calls(vec![ToolCallRequest::new("search", json!({ "query": question }))]),
    );
    model.enqueue(Message::assistant(PlaceholderSearch::CANNED_ANSWER));
}

/// Shows the pending search and lets the user rewrite the query before the
/// tool node runs. An empty line approves it as-is.
async fn review_pending_search(
    executor: &Executor,
    thread_id: &str,
    input: &mut ReplInput,
) -> Result<()> {
    let snapshot = executor.get_state(thread_id).await.into_diagnostic()?;
    let Some(request) = snapshot
        .messages
        .iter()
        .rev()
        .find(|m| m.has_tool_calls())
        .cloned()
    else {
        return Ok(());
    };
    let call = request.tool_calls[0].clone();
    println!("[paused] about to run {} with {}", call.name, call.args);
    print!("edit query (Enter to approve)> ");
    flush_stdout();

    let Some(edited) = input.read_line().await else {
        return Ok(());
    };
    let edited = edited.trim().to_string();
    if edited.is_empty() {
        return Ok(());
    }

    // Replace-by-id: hand back the same message with rewritten arguments.
    let mut patched = request;
    patched.tool_calls[0] = ToolCallRequest::with_id(call.name, json!({ "query": edited }), call.id);
    executor
        .update_state(thread_id, NodePartial::new().with_messages(vec![patched]))
        .await
        .into_diagnostic()?;
    println!("query updated");
    Ok(())
}

fn drain_events(events: &flume::Receiver<Event>) {
    while let Ok(event) = events.try_recv() {
        match event {
            Event::Step { step, node, snapshot, .. } => {
                if let Some(last) = snapshot.last_message() {
                    tracing::debug!(step, %node, role = %last.role, "step merged");
                }
            }
            Event::Suspended { node, call_id, .. } => {
                tracing::debug!(%node, ?call_id, "thread suspended");
            }
            Event::Diagnostic { scope, message } => {
                tracing::debug!(scope, message, "runtime diagnostic");
            }
        }
    }
}

fn flush_stdout() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
}
