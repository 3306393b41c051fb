//! Step streaming over a flume channel.
//!
//! The executor emits one [`Event::Step`] per node execution so callers can
//! render progress (the chat loop prints the newest message of each
//! snapshot). The bus is mpmc: any number of subscribers can pull from the
//! same stream, and dropping all receivers simply makes emission a no-op.

use crate::state::StateSnapshot;
use crate::types::NodeId;

/// Events emitted during workflow execution.
#[derive(Clone, Debug)]
pub enum Event {
    /// A node finished and its delta was merged; `snapshot` is the state
    /// after the merge.
    Step {
        thread_id: String,
        step: u64,
        node: NodeId,
        snapshot: StateSnapshot,
    },
    /// The thread suspended waiting for a resume. `call_id` is set when a
    /// human gate suspended on a specific tool call, absent for plain
    /// interrupt-before pauses.
    Suspended {
        thread_id: String,
        node: NodeId,
        call_id: Option<String>,
    },
    /// Free-form diagnostics (run start/end, routing decisions).
    Diagnostic { scope: String, message: String },
}

impl Event {
    #[must_use]
    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic {
            scope: scope.into(),
            message: message.into(),
        }
    }
}

/// Cloneable emitter handed to the executor.
#[derive(Clone)]
pub struct EventEmitter {
    tx: flume::Sender<Event>,
}

impl EventEmitter {
    /// Sends an event; silently drops it when nobody is listening.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

/// Mpmc event bus backed by an unbounded flume channel.
pub struct EventBus {
    tx: flume::Sender<Event>,
    rx: flume::Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// An emitter for producers.
    #[must_use]
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            tx: self.tx.clone(),
        }
    }

    /// A receiver for consumers; each subscriber competes for events, so use
    /// one subscriber per consumer loop.
    #[must_use]
    pub fn subscribe(&self) -> flume::Receiver<Event> {
        self.rx.clone()
    }
}
