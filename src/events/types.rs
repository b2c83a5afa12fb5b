//! Event types for engine activity
//!
//! The closed vocabulary of observable activity: tool calls, file
//! modifications, LLM requests, agent and movement lifecycle, validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An emitted event: what happened, in which run, and when
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    /// Run this event belongs to
    pub run_id: String,

    /// Emission timestamp
    pub at: DateTime<Utc>,

    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Create an event stamped with the current time
    pub fn now(run_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            run_id: run_id.into(),
            at: Utc::now(),
            kind,
        }
    }

    /// Short name of the event kind (for logs and tests)
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// The closed set of event kinds
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A tool was requested by the model
    ToolCall {
        tool: String,
        args_summary: String,
        success: bool,
    },

    /// A file in the workspace changed
    FileModified { path: String, change: FileChange },

    /// One LLM round-trip finished
    LlmRequest {
        backend: String,
        model: String,
        tokens_in: u64,
        tokens_out: u64,
        latency_ms: u64,
    },

    /// An agent run started
    AgentStarted { agent: String },

    /// An agent run ended
    AgentCompleted { agent: String, success: bool },

    /// A symphony movement started
    MovementStarted { index: usize, name: String },

    /// A symphony movement ended
    MovementCompleted { index: usize, name: String, success: bool },

    /// A verifier ran
    Validation { verifier: String, success: bool },
}

impl EventKind {
    /// Short name for logs and tests
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ToolCall { .. } => "tool_call",
            EventKind::FileModified { .. } => "file_modified",
            EventKind::LlmRequest { .. } => "llm_request",
            EventKind::AgentStarted { .. } | EventKind::AgentCompleted { .. } => "agent",
            EventKind::MovementStarted { .. } | EventKind::MovementCompleted { .. } => "movement",
            EventKind::Validation { .. } => "validation",
        }
    }
}

/// What happened to a file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChange {
    Create,
    Modify,
    Delete,
}

impl std::fmt::Display for FileChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileChange::Create => write!(f, "create"),
            FileChange::Modify => write!(f, "modify"),
            FileChange::Delete => write!(f, "delete"),
        }
    }
}
