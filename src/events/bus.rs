//! Observer - pub/sub fan-out plus a locked summary aggregate
//!
//! Uses a tokio broadcast channel so producers never block: a slow
//! subscriber lags and drops events, the summary stays correct either way.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::debug;

use super::summary::ExecutionSummary;
use super::types::{Event, EventKind, FileChange};

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Central observer for engine activity
///
/// Components emit events through an [`EventEmitter`] handle; consumers
/// (drivers, log sinks) subscribe. Emission is fire-and-forget.
pub struct Observer {
    tx: broadcast::Sender<Event>,
    summary: Mutex<ExecutionSummary>,
}

impl Observer {
    /// Create an observer with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            summary: Mutex::new(ExecutionSummary::default()),
        }
    }

    /// Create an observer with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers and fold it into the summary
    ///
    /// No subscribers is fine; a full channel drops the oldest events.
    pub fn emit(&self, event: Event) {
        debug!(kind = event.kind_name(), run_id = %event.run_id, "Observer::emit");
        self.summary.lock().expect("summary lock poisoned").record(&event.kind);
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Snapshot of the aggregate summary
    pub fn summary(&self) -> ExecutionSummary {
        self.summary.lock().expect("summary lock poisoned").clone()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Create an emitter handle bound to a run id
    pub fn emitter_for(self: &Arc<Self>, run_id: impl Into<String>) -> EventEmitter {
        EventEmitter {
            observer: Arc::clone(self),
            run_id: run_id.into(),
        }
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for components to emit events without owning the observer
///
/// Cheap to clone; stamps every event with its run id.
#[derive(Clone)]
pub struct EventEmitter {
    observer: Arc<Observer>,
    run_id: String,
}

impl EventEmitter {
    /// The run id this emitter is bound to
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Emit a raw event kind
    pub fn emit(&self, kind: EventKind) {
        self.observer.emit(Event::now(self.run_id.clone(), kind));
    }

    /// A tool call finished
    pub fn tool_call(&self, tool: &str, args_summary: &str, success: bool) {
        self.emit(EventKind::ToolCall {
            tool: tool.to_string(),
            args_summary: args_summary.to_string(),
            success,
        });
    }

    /// A workspace file changed
    pub fn file_modified(&self, path: &str, change: FileChange) {
        self.emit(EventKind::FileModified {
            path: path.to_string(),
            change,
        });
    }

    /// One LLM round-trip finished
    pub fn llm_request(&self, backend: &str, model: &str, tokens_in: u64, tokens_out: u64, latency_ms: u64) {
        self.emit(EventKind::LlmRequest {
            backend: backend.to_string(),
            model: model.to_string(),
            tokens_in,
            tokens_out,
            latency_ms,
        });
    }

    /// An agent run started
    pub fn agent_started(&self, agent: &str) {
        self.emit(EventKind::AgentStarted {
            agent: agent.to_string(),
        });
    }

    /// An agent run ended
    pub fn agent_completed(&self, agent: &str, success: bool) {
        self.emit(EventKind::AgentCompleted {
            agent: agent.to_string(),
            success,
        });
    }

    /// A movement started
    pub fn movement_started(&self, index: usize, name: &str) {
        self.emit(EventKind::MovementStarted {
            index,
            name: name.to_string(),
        });
    }

    /// A movement ended
    pub fn movement_completed(&self, index: usize, name: &str, success: bool) {
        self.emit(EventKind::MovementCompleted {
            index,
            name: name.to_string(),
            success,
        });
    }

    /// A verifier ran
    pub fn validation(&self, verifier: &str, success: bool) {
        self.emit(EventKind::Validation {
            verifier: verifier.to_string(),
            success,
        });
    }
}

/// Create an observer wrapped in an Arc for shared ownership
pub fn create_observer() -> Arc<Observer> {
    Arc::new(Observer::with_default_capacity())
}
