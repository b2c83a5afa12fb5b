//! SymphonyExecutor - the top-level engine flow
//!
//! Analyze, route by intent and complexity, then either run the task
//! directly through the conductor or decompose it into movements and
//! conduct each in order, persisting symphony state between them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{AgentKind, AgentRunner, ResearchProvider};
use crate::cancel::CancellationToken;
use crate::classify::{ComplexityClassifier, Intent, IntentClassifier, obvious_query};
use crate::conductor::{Conductor, ConductorError, ErrorKind};
use crate::config::Setup;
use crate::events::{EventEmitter, Observer};
use crate::history::HistoryStore;
use crate::llm::{LlmClient, LlmError, Message, create_client};
use crate::planner::SymphonyPlanner;
use crate::selector::{ModelSelector, Recommendation};
use crate::tools::ToolContext;

use super::types::{
    Movement, MovementStatus, Symphony, SymphonyStatus, collapse_display, goals_read_only,
};

/// One user request against one workspace
#[derive(Debug, Clone)]
pub struct Task {
    pub text: String,
    pub workspace: PathBuf,
}

impl Task {
    pub fn new(text: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            workspace: workspace.into(),
        }
    }
}

/// What the analyzer and classifiers concluded about a task
#[derive(Debug, Clone)]
pub struct TaskAnalysis {
    pub intent: Intent,
    pub complexity: u8,
    pub rationale: String,
    pub movements: Vec<Movement>,
}

/// Errors surfaced to the driver, with the error kind attached
#[derive(Debug, Error)]
pub enum EngineError {
    /// The current pair keeps failing transiently; the driver should
    /// restart with one of the recommended pairs
    #[error("model switch required ({kind}): {message}")]
    ModelSwitch {
        kind: ErrorKind,
        message: String,
        recommendations: Vec<Recommendation>,
    },

    #[error("task failed ({kind}): {message}")]
    TaskFailed { kind: ErrorKind, message: String },

    #[error("task cancelled")]
    Cancelled,

    #[error(transparent)]
    Internal(#[from] eyre::Report),
}

/// The engine's answer to one task
#[derive(Debug)]
pub struct RunOutcome {
    pub intent: Intent,
    pub complexity: u8,
    pub summary: String,
    pub symphony: Option<Symphony>,
}

/// Top-level executor composing analyzer, planner, conductor and selector
pub struct SymphonyExecutor {
    setup: Setup,
    clients: HashMap<String, Arc<dyn LlmClient>>,
    observer: Arc<Observer>,
    research: Option<Arc<dyn ResearchProvider>>,
    cancel: CancellationToken,
    history: HistoryStore,
    selector: ModelSelector,
}

impl SymphonyExecutor {
    /// Build an executor, creating a client per configured backend
    ///
    /// Backends whose API key is absent are skipped with a warning; at
    /// least one usable backend is required at execution time.
    pub fn new(setup: Setup, observer: Arc<Observer>) -> Self {
        let mut clients: HashMap<String, Arc<dyn LlmClient>> = HashMap::new();
        for backend in &setup.backends {
            match create_client(backend) {
                Ok(client) => {
                    clients.insert(backend.name.clone(), client);
                }
                Err(e) => warn!(backend = %backend.name, error = %e, "Skipping unusable backend"),
            }
        }

        let history = HistoryStore::new(setup.storage.history_file());
        let selector = ModelSelector::new(setup.selector.clone());

        Self {
            setup,
            clients,
            observer,
            research: None,
            cancel: CancellationToken::new(),
            history,
            selector,
        }
    }

    /// Register a client for a backend (tests, pre-built clients)
    pub fn insert_client(&mut self, backend: impl Into<String>, client: Arc<dyn LlmClient>) {
        self.clients.insert(backend.into(), client);
    }

    /// Attach a research provider
    pub fn with_research(mut self, research: Arc<dyn ResearchProvider>) -> Self {
        self.research = Some(research);
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute one task end to end
    pub async fn execute(&self, task: &Task) -> Result<RunOutcome, EngineError> {
        let run_id = Uuid::now_v7().to_string();
        let emitter = self.observer.emitter_for(&run_id);
        info!(%run_id, task = %task.text, "Executing task");

        let mut analysis = self.analyze(task, &emitter).await?;

        // Hard override: obvious questions never enter decomposition
        if obvious_query(&task.text) {
            analysis.intent = Intent::Query;
        }

        match analysis.intent {
            Intent::Query => return self.execute_query(task, &analysis, &emitter, &run_id).await,
            Intent::Research => return self.execute_research(task, &analysis).await,
            Intent::Review => return self.execute_review(task, &analysis, &emitter, &run_id).await,
            Intent::Edit | Intent::Test => {}
        }

        if analysis.complexity <= 5 {
            debug!(complexity = analysis.complexity, "Task is simple enough for direct execution");
            return self.execute_direct(task, &analysis, &emitter, &run_id).await;
        }

        // Complex: decompose into movements
        let movements = match self.plan_movements(task, &analysis).await {
            Ok(movements) => collapse_display(movements),
            Err(e) => {
                warn!(error = %e, "Decomposition failed, falling back to direct execution");
                return self.execute_direct(task, &analysis, &emitter, &run_id).await;
            }
        };

        if movements.is_empty() {
            warn!("Decomposition produced no movements, falling back to direct execution");
            return self.execute_direct(task, &analysis, &emitter, &run_id).await;
        }

        // A plan that only reads is a question, whatever the classifier said
        if goals_read_only(&movements) {
            debug!("All movement goals are read-only, treating task as query");
            return self.execute_query(task, &analysis, &emitter, &run_id).await;
        }

        analysis.movements = movements.clone();
        self.execute_symphony(task, &analysis, movements, &emitter, &run_id).await
    }

    /// Run the analyzer agent and both classifiers
    async fn analyze(&self, task: &Task, emitter: &EventEmitter) -> Result<TaskAnalysis, EngineError> {
        let (_, model, client) = self.resolve_role("analyzer")?;

        let ctx = ToolContext::new(task.workspace.clone(), emitter.run_id().to_string())
            .with_emitter(emitter.clone())
            .with_cancel(self.cancel.clone());
        let runner = AgentRunner::new(AgentKind::Analyzer, Arc::clone(&client), &model, ctx)
            .with_emitter(emitter.clone());

        let mut messages = vec![Message::user(format!(
            "Task: {}\n\nSummarize the facts about this workspace that matter for the task.",
            task.text
        ))];
        let rationale = match runner.run(&mut messages).await {
            Ok(text) => text,
            Err(LlmError::Cancelled) => return Err(EngineError::Cancelled),
            Err(e) => {
                warn!(error = %e, "Analyzer failed, classifying without a workspace summary");
                String::new()
            }
        };

        let intent_decision = IntentClassifier::new(
            Some(Arc::clone(&client)),
            &model,
            self.setup.classifier.intent_threshold,
        )
        .classify(&task.text)
        .await;

        let complexity = ComplexityClassifier::new(
            Some(client),
            &model,
            self.setup.classifier.complexity_threshold,
        )
        .classify(&task.text)
        .await;

        debug!(intent = %intent_decision.intent, complexity, "Task analyzed");
        Ok(TaskAnalysis {
            intent: intent_decision.intent,
            complexity,
            rationale,
            movements: Vec::new(),
        })
    }

    /// Decompose a complex task into movements
    async fn plan_movements(&self, task: &Task, analysis: &TaskAnalysis) -> eyre::Result<Vec<Movement>> {
        let (_, model, client) = self
            .resolve_role("router")
            .map_err(|e| eyre::eyre!(e.to_string()))?;
        let planner = SymphonyPlanner::new(client, model);
        planner.plan(&task.text, &analysis.rationale).await
    }

    /// Run every movement through the conductor, persisting state between
    async fn execute_symphony(
        &self,
        task: &Task,
        analysis: &TaskAnalysis,
        movements: Vec<Movement>,
        emitter: &EventEmitter,
        run_id: &str,
    ) -> Result<RunOutcome, EngineError> {
        let symphonies_dir = self.setup.storage.symphonies_dir();
        let mut symphony = Symphony::new(task.text.clone(), movements);
        symphony.status = SymphonyStatus::Executing;
        symphony.save(&symphonies_dir).map_err(EngineError::Internal)?;
        info!(id = %symphony.id, movements = symphony.movements.len(), "Symphony started");

        for index in 0..symphony.movements.len() {
            if self.cancel.is_cancelled() {
                symphony.save(&symphonies_dir).map_err(EngineError::Internal)?;
                return Err(EngineError::Cancelled);
            }

            symphony.current_movement_index = index;
            symphony.movements[index].status = MovementStatus::Executing;
            symphony.save(&symphonies_dir).map_err(EngineError::Internal)?;

            let name = symphony.movements[index].name.clone();
            let goal = symphony.movements[index].goal.clone();
            emitter.movement_started(index, &name);

            match self.conduct(task, &goal, emitter, run_id).await {
                Ok(_) => {
                    symphony.movements[index].status = MovementStatus::Completed;
                    symphony.save(&symphonies_dir).map_err(EngineError::Internal)?;
                    emitter.movement_completed(index, &name, true);
                }
                Err(e) => {
                    // A failed movement aborts the symphony; partial
                    // progress stays on disk, documented in the state file.
                    symphony.movements[index].status = MovementStatus::Failed;
                    symphony.status = SymphonyStatus::Failed;
                    symphony.save(&symphonies_dir).map_err(EngineError::Internal)?;
                    emitter.movement_completed(index, &name, false);
                    return Err(e);
                }
            }
        }

        symphony.status = SymphonyStatus::Completed;
        symphony.completed_at = Some(chrono::Utc::now());
        symphony.save(&symphonies_dir).map_err(EngineError::Internal)?;

        Ok(RunOutcome {
            intent: analysis.intent,
            complexity: analysis.complexity,
            summary: format!("Completed {} movements", symphony.movements.len()),
            symphony: Some(symphony),
        })
    }

    /// Run the task through the conductor without decomposition
    async fn execute_direct(
        &self,
        task: &Task,
        analysis: &TaskAnalysis,
        emitter: &EventEmitter,
        run_id: &str,
    ) -> Result<RunOutcome, EngineError> {
        let outcome = self.conduct(task, &task.text, emitter, run_id).await?;
        Ok(RunOutcome {
            intent: analysis.intent,
            complexity: analysis.complexity,
            summary: outcome.summary,
            symphony: None,
        })
    }

    /// One conductor step, with a single model-switch restart on
    /// transient failure
    async fn conduct(
        &self,
        task: &Task,
        goal: &str,
        emitter: &EventEmitter,
        run_id: &str,
    ) -> Result<crate::conductor::StepOutcome, EngineError> {
        let records = self.history.load().unwrap_or_default();
        let selection = self.selector.select_for_agent(&self.setup, &records, "editor");
        let (backend, model, client) = self.resolve_pair(&selection)?;
        debug!(%backend, %model, reason = %selection.reason, "Selected editor pair");

        match self
            .run_conductor(client, &backend, &model, task, goal, emitter, run_id)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(ConductorError::Escalate { kind, message }) => {
                let records = self.history.load().unwrap_or_default();
                let recommendations =
                    self.selector
                        .recommend_for_retry(&self.setup, &records, "editor", &backend, &model, goal);

                // Restart once when a recommended backend is actually servable
                if let Some(rec) = recommendations.iter().find(|r| self.clients.contains_key(&r.backend)) {
                    info!(backend = %rec.backend, model = %rec.model, reason = %rec.reason, "Switching model after {kind}");
                    let client = Arc::clone(&self.clients[&rec.backend]);
                    return match self
                        .run_conductor(client, &rec.backend, &rec.model, task, goal, emitter, run_id)
                        .await
                    {
                        Ok(outcome) => Ok(outcome),
                        Err(ConductorError::Escalate { kind, message }) => Err(EngineError::ModelSwitch {
                            kind,
                            message,
                            recommendations,
                        }),
                        Err(other) => Err(map_conductor_error(other)),
                    };
                }

                Err(EngineError::ModelSwitch {
                    kind,
                    message,
                    recommendations,
                })
            }
            Err(other) => Err(map_conductor_error(other)),
        }
    }

    async fn run_conductor(
        &self,
        client: Arc<dyn LlmClient>,
        backend: &str,
        model: &str,
        task: &Task,
        goal: &str,
        emitter: &EventEmitter,
        run_id: &str,
    ) -> Result<crate::conductor::StepOutcome, ConductorError> {
        Conductor::new(client, backend, model, task.workspace.clone())
            .with_config(self.setup.conductor.clone())
            .with_verify_config(self.setup.verify.clone())
            .with_history(self.history.clone())
            .with_emitter(emitter.clone())
            .with_cancel(self.cancel.clone())
            .with_run_id(run_id)
            .execute(goal)
            .await
    }

    /// Answer a read-only task with the query agent
    async fn execute_query(
        &self,
        task: &Task,
        analysis: &TaskAnalysis,
        emitter: &EventEmitter,
        run_id: &str,
    ) -> Result<RunOutcome, EngineError> {
        let (_, model, client) = self.resolve_role("query")?;

        let ctx = ToolContext::new(task.workspace.clone(), run_id.to_string())
            .with_emitter(emitter.clone())
            .with_cancel(self.cancel.clone());
        let runner = AgentRunner::new(AgentKind::Query, client, &model, ctx).with_emitter(emitter.clone());

        let mut messages = vec![Message::user(task.text.clone())];
        let summary = runner.run(&mut messages).await.map_err(map_llm_error)?;

        Ok(RunOutcome {
            intent: Intent::Query,
            complexity: analysis.complexity,
            summary,
            symphony: None,
        })
    }

    /// Validate the workspace with the reviewer agent
    async fn execute_review(
        &self,
        task: &Task,
        analysis: &TaskAnalysis,
        emitter: &EventEmitter,
        run_id: &str,
    ) -> Result<RunOutcome, EngineError> {
        let (_, model, client) = self.resolve_role("editor")?;

        let ctx = ToolContext::new(task.workspace.clone(), run_id.to_string())
            .with_emitter(emitter.clone())
            .with_cancel(self.cancel.clone());
        let runner = AgentRunner::new(AgentKind::Reviewer, client, &model, ctx).with_emitter(emitter.clone());

        let mut messages = vec![Message::user(task.text.clone())];
        let summary = runner.run(&mut messages).await.map_err(map_llm_error)?;

        Ok(RunOutcome {
            intent: Intent::Review,
            complexity: analysis.complexity,
            summary,
            symphony: None,
        })
    }

    /// Delegate to the research provider
    async fn execute_research(&self, task: &Task, analysis: &TaskAnalysis) -> Result<RunOutcome, EngineError> {
        let Some(research) = &self.research else {
            return Err(EngineError::Internal(eyre::eyre!("no research provider configured")));
        };

        let summary = research.research(&task.text).await.map_err(EngineError::Internal)?;
        Ok(RunOutcome {
            intent: Intent::Research,
            complexity: analysis.complexity,
            summary,
            symphony: None,
        })
    }

    /// The (backend, model, client) serving an agent role
    fn resolve_role(&self, role: &str) -> Result<(String, String, Arc<dyn LlmClient>), EngineError> {
        let records = self.history.load().unwrap_or_default();
        let selection = self.selector.select_for_agent(&self.setup, &records, role);
        self.resolve_pair(&selection)
    }

    /// A servable client for a recommendation, falling back to any backend
    fn resolve_pair(&self, rec: &Recommendation) -> Result<(String, String, Arc<dyn LlmClient>), EngineError> {
        if let Some(client) = self.clients.get(&rec.backend) {
            return Ok((rec.backend.clone(), rec.model.clone(), Arc::clone(client)));
        }

        // The recommended backend is not servable (missing key); use any
        // configured client with its default model.
        if let Some((name, client)) = self.clients.iter().next() {
            let model = self
                .setup
                .backend(name)
                .map(|b| b.default_model.clone())
                .unwrap_or_else(|| rec.model.clone());
            warn!(wanted = %rec.backend, using = %name, "Recommended backend unavailable");
            return Ok((name.clone(), model, Arc::clone(client)));
        }

        Err(EngineError::Internal(eyre::eyre!("no usable LLM backends configured")))
    }
}

fn map_conductor_error(e: ConductorError) -> EngineError {
    match e {
        ConductorError::Escalate { kind, message } => EngineError::ModelSwitch {
            kind,
            message,
            recommendations: Vec::new(),
        },
        ConductorError::Failed { kind, message, .. } => EngineError::TaskFailed { kind, message },
        ConductorError::Cancelled => EngineError::Cancelled,
        ConductorError::Internal(e) => EngineError::Internal(e),
    }
}

fn map_llm_error(e: LlmError) -> EngineError {
    match e {
        LlmError::Cancelled => EngineError::Cancelled,
        other => EngineError::TaskFailed {
            kind: ErrorKind::from(&other),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::events::create_observer;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use tempfile::tempdir;

    fn setup_with_home(home: &std::path::Path) -> Setup {
        use crate::config::BackendConfig;
        Setup {
            backends: vec![
                BackendConfig::default(),
                BackendConfig {
                    name: "local".to_string(),
                    provider: "openai".to_string(),
                    base_url: "http://localhost:8080".to_string(),
                    api_key_env: "LOCAL_API_KEY_UNSET".to_string(),
                    default_model: "qwen-coder".to_string(),
                    models: vec![],
                    ..BackendConfig::default()
                },
            ],
            storage: StorageConfig {
                home_dir: Some(home.to_path_buf()),
            },
            ..Setup::default()
        }
    }

    fn executor_with(replies: Vec<MockReply>, home: &std::path::Path) -> SymphonyExecutor {
        let mut executor = SymphonyExecutor::new(setup_with_home(home), create_observer());
        executor.insert_client("anthropic", Arc::new(MockLlmClient::new(replies)));
        executor
    }

    #[tokio::test]
    async fn test_obvious_query_skips_decomposition() {
        let home = tempdir().unwrap();
        let ws = tempdir().unwrap();
        std::fs::write(ws.path().join("a.go"), "package a\n").unwrap();

        // Analyzer reply, the complexity fallback, then the query agent's
        // tool call and answer. No planner call ever happens.
        let executor = executor_with(
            vec![
                MockReply::text("workspace has one go file"),
                MockReply::text("2"),
                MockReply::tool_call("call_1", "list_files", serde_json::json!({"pattern": "*.go"})),
                MockReply::text("There is one go file: a.go"),
            ],
            home.path(),
        );

        let task = Task::new("list go files", ws.path());
        let outcome = executor.execute(&task).await.unwrap();

        assert_eq!(outcome.intent, Intent::Query);
        assert!(outcome.summary.contains("a.go"));
        assert!(outcome.symphony.is_none());
        // No checkpoint was created by a read-only run
        assert!(!ws.path().join(".chuchu/checkpoints").exists());
    }

    #[tokio::test]
    async fn test_simple_edit_runs_direct() {
        let home = tempdir().unwrap();
        let ws = tempdir().unwrap();

        let executor = executor_with(
            vec![
                // Analyzer
                MockReply::text("empty workspace"),
                // Intent fallback (the embedded model is unsure here)
                MockReply::text("edit"),
                // Editor
                MockReply::tool_call(
                    "call_1",
                    "write_file",
                    serde_json::json!({"path": "hello.txt", "content": "Hi"}),
                ),
                MockReply::text("Created hello.txt"),
            ],
            home.path(),
        );

        let task = Task::new("create hello.txt with content 'Hi'", ws.path());
        let outcome = executor.execute(&task).await.unwrap();

        assert_eq!(std::fs::read_to_string(ws.path().join("hello.txt")).unwrap(), "Hi");
        assert!(outcome.symphony.is_none());
        assert_eq!(outcome.summary, "Created hello.txt");

        // One terminal history record was appended
        let history = HistoryStore::new(home.path().join("history.jsonl"));
        let records = history.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].success);
    }

    #[tokio::test]
    async fn test_escalation_surfaces_model_switch_with_recommendations() {
        let home = tempdir().unwrap();
        let ws = tempdir().unwrap();

        // The editor rate-limits on the selected pair, then again on the
        // switched pair, so the run ends with a model-switch request.
        let executor = executor_with(
            vec![
                // Analyzer
                MockReply::text("empty workspace"),
                // Intent fallback
                MockReply::text("edit"),
                // Editor on the initial pair
                MockReply::RateLimited,
                // Editor on the switched pair
                MockReply::RateLimited,
            ],
            home.path(),
        );

        let task = Task::new("create hello.txt with content 'Hi'", ws.path());
        let err = executor.execute(&task).await.unwrap_err();

        match err {
            EngineError::ModelSwitch {
                kind, recommendations, ..
            } => {
                assert_eq!(kind, ErrorKind::RateLimit);
                assert!(!recommendations.is_empty());
                // The failing pair is not recommended again
                assert!(
                    !recommendations
                        .iter()
                        .any(|r| r.backend == "anthropic" && r.model == "claude-sonnet-4-20250514")
                );
            }
            other => panic!("expected model switch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complex_task_runs_movements_and_persists_state() {
        let home = tempdir().unwrap();
        let ws = tempdir().unwrap();

        let executor = executor_with(
            vec![
                // Analyzer
                MockReply::text("docs folder with mixed files"),
                // Intent fallback
                MockReply::text("edit"),
                // Planner decomposition
                MockReply::tool_call(
                    "call_p",
                    "submit_movements",
                    serde_json::json!({
                        "movements": [
                            {"name": "features", "goal": "create features/ and move feature docs"},
                            {"name": "guides", "goal": "create guides/ and move guide docs"}
                        ]
                    }),
                ),
                // Movement 1 editor
                MockReply::tool_call(
                    "call_1",
                    "write_file",
                    serde_json::json!({"path": "features/.keep", "content": ""}),
                ),
                MockReply::text("created features/"),
                // Movement 2 editor
                MockReply::tool_call(
                    "call_2",
                    "write_file",
                    serde_json::json!({"path": "guides/.keep", "content": ""}),
                ),
                MockReply::text("created guides/"),
            ],
            home.path(),
        );

        let task = Task::new("reorganize the entire docs folder across multiple directories", ws.path());
        let outcome = executor.execute(&task).await.unwrap();

        let symphony = outcome.symphony.unwrap();
        assert_eq!(symphony.status, SymphonyStatus::Completed);
        assert_eq!(symphony.movements.len(), 2);
        assert!(symphony.movements.iter().all(|m| m.status == MovementStatus::Completed));

        // State file exists and parses
        let loaded = Symphony::load(&home.path().join("symphonies"), &symphony.id).unwrap();
        assert_eq!(loaded.status, SymphonyStatus::Completed);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_movement_aborts_symphony() {
        let home = tempdir().unwrap();
        let ws = tempdir().unwrap();

        let executor = executor_with(
            vec![
                // Analyzer
                MockReply::text("workspace summary"),
                // Intent fallback
                MockReply::text("edit"),
                // Planner decomposition: two movements
                MockReply::tool_call(
                    "call_p",
                    "submit_movements",
                    serde_json::json!({
                        "movements": [
                            {"name": "one", "goal": "create the first file"},
                            {"name": "two", "goal": "create the second file"}
                        ]
                    }),
                ),
                // Movement 1 editor fails hard (invalid response is permanent)
                MockReply::tool_call("call_1", "write_file", serde_json::json!({"path": "a.txt", "content": "x"})),
                // Editor never stops calling tools, exhausting replies is
                // a permanent InvalidResponse failure
            ],
            home.path(),
        );

        let task = Task::new("reorganize the entire docs folder across multiple directories", ws.path());
        let err = executor.execute(&task).await.unwrap_err();
        assert!(matches!(err, EngineError::TaskFailed { .. }));

        // The state file records the aborted symphony
        let dir = home.path().join("symphonies");
        let entries: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
            .collect();
        assert_eq!(entries.len(), 1);
        let id = entries[0].path().file_stem().unwrap().to_string_lossy().to_string();
        let symphony = Symphony::load(&dir, &id).unwrap();
        assert_eq!(symphony.status, SymphonyStatus::Failed);
        assert_eq!(symphony.movements[0].status, MovementStatus::Failed);
        // Movement two never started
        assert_eq!(symphony.movements[1].status, MovementStatus::Pending);
    }

    #[tokio::test]
    async fn test_read_only_movements_degrade_to_query() {
        let home = tempdir().unwrap();
        let ws = tempdir().unwrap();
        std::fs::write(ws.path().join("notes.md"), "# Notes\n").unwrap();

        let executor = executor_with(
            vec![
                // Analyzer
                MockReply::text("a docs workspace"),
                // Intent fallback
                MockReply::text("edit"),
                // Planner returns read-only movements
                MockReply::tool_call(
                    "call_p",
                    "submit_movements",
                    serde_json::json!({
                        "movements": [
                            {"name": "inspect", "goal": "list the markdown files"},
                            {"name": "report", "goal": "summarize their structure"}
                        ]
                    }),
                ),
                // Query agent answers directly
                MockReply::text("There is one markdown file"),
            ],
            home.path(),
        );

        // "restructure" rates multistep, but the plan turns out read-only
        let task = Task::new("restructure report of the entire docs folder", ws.path());
        let outcome = executor.execute(&task).await.unwrap();

        assert_eq!(outcome.intent, Intent::Query);
        assert!(outcome.symphony.is_none());
    }

    #[tokio::test]
    async fn test_research_requires_provider() {
        let home = tempdir().unwrap();
        let ws = tempdir().unwrap();

        let executor = executor_with(
            vec![
                // Analyzer
                MockReply::text("workspace summary"),
                // Intent LLM fallback resolves to research
                MockReply::text("research"),
            ],
            home.path(),
        );

        let task = Task::new("dig into the upstream release notes", ws.path());
        let err = executor.execute(&task).await.unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
    }
}
