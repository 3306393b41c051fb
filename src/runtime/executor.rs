//! Single-threaded graph execution with checkpointing and step streaming.
//!
//! The executor advances one node at a time: run the node, merge its delta
//! through the reducer registry, emit a step event, route to the successor,
//! checkpoint. A failing node returns an error without saving, so the
//! thread stays at its last good checkpoint. Suspension is explicit data,
//! never control flow: interrupt-before points and human gates both park
//! the thread as a [`PendingInterrupt`] inside the checkpoint, and
//! [`Executor::resume`] picks it back up.

use std::sync::Arc;

use chrono::Utc;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use super::checkpoint::{Checkpoint, Checkpointer, CheckpointerError, PendingInterrupt};
use crate::events::{Event, EventBus};
use crate::graph::Workflow;
use crate::message::ToolCallRequest;
use crate::node::{GraphNode, NodeError, NodePartial, NodeStep};
use crate::reducers::{ReducerError, ReducerRegistry};
use crate::state::{ConversationState, StateSnapshot};
use crate::types::NodeId;

/// Why a run stopped without completing.
#[derive(Clone, Debug)]
pub struct Interruption {
    pub thread_id: String,
    /// The node the thread is parked at.
    pub node: NodeId,
    /// The tool call a human gate suspended on, absent for plain
    /// interrupt-before pauses.
    pub call: Option<ToolCallRequest>,
}

/// How a run ended.
#[derive(Clone, Debug)]
pub enum RunOutcome {
    /// The graph reached `End`; here is the final state.
    Completed(StateSnapshot),
    /// The thread suspended and awaits [`Executor::resume`].
    Suspended(Interruption),
}

/// Errors surfaced by thread execution.
#[derive(Debug, Error, Diagnostic)]
pub enum ExecutorError {
    #[error("thread not found: {thread_id}")]
    #[diagnostic(code(threadloom::executor::thread_not_found))]
    ThreadNotFound { thread_id: String },

    #[error("thread {thread_id} is suspended; resume it instead of invoking")]
    #[diagnostic(
        code(threadloom::executor::thread_suspended),
        help("Call resume() with a payload to continue a suspended thread.")
    )]
    ThreadSuspended { thread_id: String },

    #[error("thread {thread_id} has no pending interrupt to resume")]
    #[diagnostic(code(threadloom::executor::no_pending_interrupt))]
    NoPendingInterrupt { thread_id: String },

    #[error("node {node} failed")]
    #[diagnostic(code(threadloom::executor::node_failed))]
    NodeFailed {
        node: NodeId,
        #[source]
        source: NodeError,
    },

    #[error("workflow has no node registered as {node}")]
    #[diagnostic(code(threadloom::executor::missing_node))]
    MissingNode { node: NodeId },

    #[error("no outgoing edge from {node}")]
    #[diagnostic(
        code(threadloom::executor::no_route),
        help("Give every node a direct or conditional edge, or route it to End.")
    )]
    NoRoute { node: NodeId },

    #[error("router at {node} returned unmapped label: {label}")]
    #[diagnostic(
        code(threadloom::executor::unknown_route_label),
        help("Every label a router can return needs an entry in the edge mapping.")
    )]
    UnknownRouteLabel { node: NodeId, label: String },

    #[error("run exceeded the step limit of {limit}")]
    #[diagnostic(
        code(threadloom::executor::step_limit),
        help("Raise max_steps in RuntimeConfig or break the routing cycle.")
    )]
    StepLimitExceeded { limit: u64 },

    #[error(transparent)]
    #[diagnostic(code(threadloom::executor::reducer))]
    Reducer(#[from] ReducerError),

    #[error(transparent)]
    #[diagnostic(code(threadloom::executor::checkpointer))]
    Checkpointer(#[from] CheckpointerError),
}

/// Runs compiled workflows against checkpointed threads.
///
/// One executor serves any number of threads; state isolation comes from
/// the checkpointer keying everything by thread id.
pub struct Executor {
    workflow: Arc<Workflow>,
    checkpointer: Arc<dyn Checkpointer>,
    reducers: ReducerRegistry,
    event_bus: EventBus,
}

impl Executor {
    #[must_use]
    pub fn new(workflow: Arc<Workflow>, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            workflow,
            checkpointer,
            reducers: ReducerRegistry::default(),
            event_bus: EventBus::new(),
        }
    }

    /// Swaps in a non-default reducer registry.
    #[must_use]
    pub fn with_reducers(mut self, reducers: ReducerRegistry) -> Self {
        self.reducers = reducers;
        self
    }

    /// The compiled workflow this executor runs.
    #[must_use]
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// A receiver of step and suspension events. Each subscriber competes
    /// for events, so take one per consumer loop.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<Event> {
        self.event_bus.subscribe()
    }

    /// Runs a thread from the entry node with the given state.
    ///
    /// Overwrites any completed checkpoint under the same thread id, which
    /// is how a chat loop feeds each new user turn back in. Invoking a
    /// suspended thread is an error; resume it instead.
    #[instrument(skip(self, state))]
    pub async fn invoke(
        &self,
        thread_id: impl Into<String> + std::fmt::Debug,
        state: ConversationState,
    ) -> Result<RunOutcome, ExecutorError> {
        let thread_id = thread_id.into();
        if let Some(existing) = self.checkpointer.load(&thread_id).await? {
            if existing.pending_interrupt.is_some() {
                return Err(ExecutorError::ThreadSuspended { thread_id });
            }
        }
        let entry = self.workflow.entry().clone();
        self.event_bus.emitter().emit(Event::diagnostic(
            "executor",
            format!("thread {thread_id} starting at {entry}"),
        ));
        self.run_loop(&thread_id, state, entry, 0, false).await
    }

    /// Continues a suspended thread.
    ///
    /// For an interrupt-before pause the payload is ignored and the parked
    /// node simply runs. For a human gate, the payload is resolved into the
    /// tool response answering the suspended call, merged, and execution
    /// continues past the gate.
    #[instrument(skip(self, payload))]
    pub async fn resume(
        &self,
        thread_id: &str,
        payload: Value,
    ) -> Result<RunOutcome, ExecutorError> {
        let checkpoint = self.load_required(thread_id).await?;
        let pending =
            checkpoint
                .pending_interrupt
                .ok_or_else(|| ExecutorError::NoPendingInterrupt {
                    thread_id: thread_id.to_string(),
                })?;

        match pending {
            PendingInterrupt::BeforeNode { node } => {
                if !payload.is_null() {
                    tracing::debug!(%node, "resume payload ignored for interrupt-before pause");
                }
                self.run_loop(thread_id, checkpoint.state, node, checkpoint.step, true)
                    .await
            }
            PendingInterrupt::HumanGate { node, call } => {
                let Some(GraphNode::HumanGate(gate)) = self.workflow.node(&node) else {
                    return Err(ExecutorError::MissingNode { node });
                };
                let resolution = gate.resolve(&call, &payload);
                let partial = NodePartial::new()
                    .with_messages(vec![resolution.message])
                    .with_extra(resolution.extra);

                let mut state = checkpoint.state;
                self.reducers.apply_all(&mut state, &partial)?;
                let step = checkpoint.step + 1;
                self.event_bus.emitter().emit(Event::Step {
                    thread_id: thread_id.to_string(),
                    step,
                    node: node.clone(),
                    snapshot: state.snapshot(),
                });

                let next = self.route(&node, &state.snapshot())?;
                self.save_position(thread_id, &state, next.clone(), None, step)
                    .await?;
                self.run_loop(thread_id, state, next, step, false).await
            }
        }
    }

    /// Merges a delta into a thread's checkpointed state without running
    /// any node.
    ///
    /// The messages channel replaces by id, so handing back an edited copy
    /// of an existing message (say, a pending tool call with corrected
    /// arguments) patches it in place. Any pending interrupt is preserved.
    pub async fn update_state(
        &self,
        thread_id: &str,
        update: NodePartial,
    ) -> Result<StateSnapshot, ExecutorError> {
        let mut checkpoint = self.load_required(thread_id).await?;
        self.reducers.apply_all(&mut checkpoint.state, &update)?;
        checkpoint.created_at = Utc::now();
        let snapshot = checkpoint.state.snapshot();
        self.checkpointer.save(checkpoint).await?;
        Ok(snapshot)
    }

    /// The latest checkpointed state of a thread.
    pub async fn get_state(&self, thread_id: &str) -> Result<StateSnapshot, ExecutorError> {
        Ok(self.load_required(thread_id).await?.state.snapshot())
    }

    /// What the thread is suspended on, `None` when it is runnable.
    pub async fn pending_interrupt(
        &self,
        thread_id: &str,
    ) -> Result<Option<PendingInterrupt>, ExecutorError> {
        Ok(self.load_required(thread_id).await?.pending_interrupt)
    }

    async fn load_required(&self, thread_id: &str) -> Result<Checkpoint, ExecutorError> {
        self.checkpointer
            .load(thread_id)
            .await?
            .ok_or_else(|| ExecutorError::ThreadNotFound {
                thread_id: thread_id.to_string(),
            })
    }

    async fn run_loop(
        &self,
        thread_id: &str,
        mut state: ConversationState,
        mut current: NodeId,
        mut step: u64,
        mut resume_through_interrupt: bool,
    ) -> Result<RunOutcome, ExecutorError> {
        let emitter = self.event_bus.emitter();
        let max_steps = self.workflow.runtime_config().max_steps;

        loop {
            if current.is_end() {
                self.save_position(thread_id, &state, NodeId::End, None, step)
                    .await?;
                emitter.emit(Event::diagnostic(
                    "executor",
                    format!("thread {thread_id} completed after {step} steps"),
                ));
                return Ok(RunOutcome::Completed(state.snapshot()));
            }
            if step >= max_steps {
                return Err(ExecutorError::StepLimitExceeded { limit: max_steps });
            }

            if self.workflow.interrupts_before(&current) && !resume_through_interrupt {
                let pending = PendingInterrupt::BeforeNode {
                    node: current.clone(),
                };
                self.save_position(thread_id, &state, current.clone(), Some(pending), step)
                    .await?;
                emitter.emit(Event::Suspended {
                    thread_id: thread_id.to_string(),
                    node: current.clone(),
                    call_id: None,
                });
                return Ok(RunOutcome::Suspended(Interruption {
                    thread_id: thread_id.to_string(),
                    node: current,
                    call: None,
                }));
            }
            resume_through_interrupt = false;

            let node = self
                .workflow
                .node(&current)
                .ok_or_else(|| ExecutorError::MissingNode {
                    node: current.clone(),
                })?;
            tracing::debug!(thread_id, node = %current, kind = node.kind_label(), step, "running node");

            let outcome =
                node.run(&state.snapshot())
                    .await
                    .map_err(|source| ExecutorError::NodeFailed {
                        node: current.clone(),
                        source,
                    })?;

            match outcome {
                NodeStep::Advance(partial) => {
                    self.reducers.apply_all(&mut state, &partial)?;
                    step += 1;
                    emitter.emit(Event::Step {
                        thread_id: thread_id.to_string(),
                        step,
                        node: current.clone(),
                        snapshot: state.snapshot(),
                    });
                    let next = self.route(&current, &state.snapshot())?;
                    self.save_position(thread_id, &state, next.clone(), None, step)
                        .await?;
                    current = next;
                }
                NodeStep::Suspend(call) => {
                    let pending = PendingInterrupt::HumanGate {
                        node: current.clone(),
                        call: call.clone(),
                    };
                    self.save_position(thread_id, &state, current.clone(), Some(pending), step)
                        .await?;
                    emitter.emit(Event::Suspended {
                        thread_id: thread_id.to_string(),
                        node: current.clone(),
                        call_id: Some(call.id.clone()),
                    });
                    return Ok(RunOutcome::Suspended(Interruption {
                        thread_id: thread_id.to_string(),
                        node: current,
                        call: Some(call),
                    }));
                }
            }
        }
    }

    fn route(&self, from: &NodeId, snapshot: &StateSnapshot) -> Result<NodeId, ExecutorError> {
        if let Some(edge) = self.workflow.conditional_edge(from) {
            let label = edge.route(snapshot);
            let target =
                edge.target(&label)
                    .cloned()
                    .ok_or_else(|| ExecutorError::UnknownRouteLabel {
                        node: from.clone(),
                        label: label.clone(),
                    })?;
            tracing::debug!(%from, %label, %target, "conditional route");
            return Ok(target);
        }
        self.workflow
            .direct_successor(from)
            .cloned()
            .ok_or_else(|| ExecutorError::NoRoute { node: from.clone() })
    }

    async fn save_position(
        &self,
        thread_id: &str,
        state: &ConversationState,
        next_node: NodeId,
        pending_interrupt: Option<PendingInterrupt>,
        step: u64,
    ) -> Result<(), CheckpointerError> {
        self.checkpointer
            .save(Checkpoint {
                thread_id: thread_id.to_string(),
                state: state.clone(),
                next_node,
                pending_interrupt,
                step,
                created_at: Utc::now(),
            })
            .await
    }
}
