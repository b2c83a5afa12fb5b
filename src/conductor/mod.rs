//! Conductor - the per-step edit / verify / recover loop
//!
//! One movement or direct task goes through up to `max_attempts` rounds:
//! run the editor over an accumulating conversation, verify the touched
//! files, classify any failure, roll back build breaks, seed the next
//! attempt with a recovery prompt. Transient provider trouble escalates
//! to a model switch instead of burning attempts.

mod plan;
mod recovery;

pub use plan::{PlanStep, split_plan};
pub use recovery::{ErrorKind, RecoveryStrategy, classify_error};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agent::{AgentKind, AgentRunner};
use crate::cancel::CancellationToken;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::{ConductorConfig, VerifyConfig};
use crate::events::EventEmitter;
use crate::history::{ExecutionRecord, HistoryStore};
use crate::llm::{LlmClient, LlmError, Message};
use crate::tools::ToolContext;
use crate::verify::{VerifyContext, verify};

/// Why a step did not complete
#[derive(Debug, Error)]
pub enum ConductorError {
    /// Transient provider failure or tool incompatibility: the layer
    /// above should switch models and restart the step
    #[error("escalating for model switch ({kind}): {message}")]
    Escalate { kind: ErrorKind, message: String },

    /// The step failed after exhausting its attempts
    #[error("step failed after {attempts} attempts ({kind}): {message}")]
    Failed {
        kind: ErrorKind,
        message: String,
        attempts: u32,
    },

    #[error("step cancelled")]
    Cancelled,

    #[error(transparent)]
    Internal(#[from] eyre::Report),
}

impl ConductorError {
    /// The error kind carried by this failure, if any
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ConductorError::Escalate { kind, .. } | ConductorError::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A successfully verified step
#[derive(Debug)]
pub struct StepOutcome {
    /// The editor's final summary text
    pub summary: String,

    /// Files touched this step, workspace-relative
    pub modified_files: Vec<PathBuf>,

    /// Snapshot taken after the successful verify (none for steps that
    /// touched nothing)
    pub checkpoint: Option<Checkpoint>,

    /// Attempts consumed, including the successful one
    pub attempts: u32,
}

/// Drives one step to a verified outcome
pub struct Conductor {
    llm: Arc<dyn LlmClient>,
    backend: String,
    model: String,
    workspace: PathBuf,
    config: ConductorConfig,
    verify_config: VerifyConfig,
    history: Option<HistoryStore>,
    emitter: Option<EventEmitter>,
    cancel: CancellationToken,
    run_id: String,
}

impl Conductor {
    /// Create a conductor for a workspace and (backend, model) pair
    pub fn new(
        llm: Arc<dyn LlmClient>,
        backend: impl Into<String>,
        model: impl Into<String>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            llm,
            backend: backend.into(),
            model: model.into(),
            workspace: workspace.into(),
            config: ConductorConfig::default(),
            verify_config: VerifyConfig::default(),
            history: None,
            emitter: None,
            cancel: CancellationToken::new(),
            run_id: "conductor".to_string(),
        }
    }

    /// Override retry behavior
    pub fn with_config(mut self, config: ConductorConfig) -> Self {
        self.config = config;
        self
    }

    /// Override verification behavior
    pub fn with_verify_config(mut self, config: VerifyConfig) -> Self {
        self.verify_config = config;
        self
    }

    /// Record terminal attempts to the history log
    pub fn with_history(mut self, history: HistoryStore) -> Self {
        self.history = Some(history);
        self
    }

    /// Attach an event emitter
    pub fn with_emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Tag tool contexts and events with a run id
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// The (backend, model) pair this conductor drives
    pub fn pair(&self) -> (&str, &str) {
        (&self.backend, &self.model)
    }

    /// Execute one goal to a verified outcome
    pub async fn execute(&self, goal: &str) -> Result<StepOutcome, ConductorError> {
        info!(model = %self.model, backend = %self.backend, "Conductor: executing step");
        let started = Instant::now();
        let store = CheckpointStore::new(&self.workspace);

        let mut ctx = ToolContext::new(self.workspace.clone(), self.run_id.clone())
            .with_cancel(self.cancel.clone())
            .with_command_timeout(Duration::from_millis(self.config.command_timeout_ms));
        if let Some(emitter) = &self.emitter {
            ctx = ctx.with_emitter(emitter.clone());
        }

        let mut messages = vec![Message::user(goal.to_string())];
        let mut recovery = RecoveryStrategy::new();
        let mut last_kind = ErrorKind::Unknown;
        let mut last_error = String::new();

        for attempt in 1..=self.config.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(ConductorError::Cancelled);
            }
            debug!(attempt, max = self.config.max_attempts, "Conductor: attempt start");
            ctx.clear_changes().await;

            let mut runner = AgentRunner::new(AgentKind::Editor, Arc::clone(&self.llm), &self.model, ctx.clone());
            if let Some(emitter) = &self.emitter {
                runner = runner.with_emitter(emitter.clone());
            }

            let summary = match runner.run(&mut messages).await {
                Ok(text) => text,
                Err(LlmError::Cancelled) => return Err(ConductorError::Cancelled),
                Err(e) => {
                    let kind = ErrorKind::from(&e);
                    self.record(goal, false, started, Some(kind));
                    let message = e.to_string();
                    return if e.is_transient() {
                        Err(ConductorError::Escalate { kind, message })
                    } else {
                        Err(ConductorError::Failed {
                            kind,
                            message,
                            attempts: attempt,
                        })
                    };
                }
            };

            // The editor's own telemetry is the preferred source of the
            // modified set; git is the fallback when nothing was tracked.
            let mut modified = ctx.modified_files().await;
            if modified.is_empty() {
                modified = git_diff_names(&self.workspace).await;
            }
            debug!(files = modified.len(), "Conductor: modified set collected");

            let mut vctx = VerifyContext::new(self.workspace.clone(), modified.clone());
            vctx.timeout = Duration::from_millis(self.verify_config.timeout_ms);
            vctx.lint_command = self.verify_config.lint_command.clone();
            vctx.emitter = self.emitter.clone();
            vctx.cancel = self.cancel.clone();

            let result = verify(&vctx).await.map_err(ConductorError::Internal)?;

            if result.success {
                if self.cancel.is_cancelled() {
                    // Cancelled attempts never commit a checkpoint
                    return Err(ConductorError::Cancelled);
                }
                let checkpoint = if modified.is_empty() {
                    None
                } else {
                    Some(store.save(attempt, &modified).map_err(ConductorError::Internal)?)
                };
                self.record(goal, true, started, None);
                info!(attempt, "Conductor: step verified");
                return Ok(StepOutcome {
                    summary,
                    modified_files: modified,
                    checkpoint,
                    attempts: attempt,
                });
            }

            let combined = match &result.error {
                Some(error) if result.output.is_empty() => error.clone(),
                Some(error) => format!("{}\n{}", result.output, error),
                None => result.output.clone(),
            };
            let kind = classify_error(&combined);
            warn!(attempt, %kind, "Conductor: verification failed");
            recovery.record_attempt();
            last_kind = kind;
            last_error = combined.clone();

            if kind.should_escalate() {
                self.record(goal, false, started, Some(kind));
                return Err(ConductorError::Escalate {
                    kind,
                    message: combined,
                });
            }

            if kind.should_rollback()
                && let Ok(Some(checkpoint)) = store.latest()
            {
                info!(id = %checkpoint.id, "Conductor: rolling back build break");
                store.rollback(&checkpoint).map_err(ConductorError::Internal)?;
            }

            if let Some(prompt) = recovery.fix_prompt(kind, &combined) {
                messages.push(Message::user(prompt));
            }
        }

        self.record(goal, false, started, Some(last_kind));
        Err(ConductorError::Failed {
            kind: last_kind,
            message: last_error,
            attempts: self.config.max_attempts,
        })
    }

    /// Append one terminal-attempt record
    fn record(&self, task: &str, success: bool, started: Instant, error_kind: Option<ErrorKind>) {
        let Some(history) = &self.history else {
            return;
        };
        let latency_ms = started.elapsed().as_millis() as u64;
        let record = if success {
            ExecutionRecord::success(task, &self.backend, &self.model, AgentKind::Editor.role(), latency_ms)
        } else {
            ExecutionRecord::failure(
                task,
                &self.backend,
                &self.model,
                AgentKind::Editor.role(),
                latency_ms,
                error_kind.unwrap_or(ErrorKind::Unknown),
            )
        };
        if let Err(e) = history.append(&record) {
            warn!(error = %e, "Failed to append execution record");
        }
    }
}

/// Names of files changed per `git diff --name-only`, empty outside git
async fn git_diff_names(workspace: &std::path::Path) -> Vec<PathBuf> {
    let output = tokio::process::Command::new("git")
        .args(["diff", "--name-only"])
        .current_dir(workspace)
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(PathBuf::from)
            .collect(),
        _ => Vec::new(),
    }
}
