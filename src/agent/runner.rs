//! AgentRunner - the uniform bounded tool loop
//!
//! Call the LLM, execute any requested tools, append the results, repeat
//! until the model stops requesting tools or the iteration cap is hit.
//! The cap is a safety bound, not a correctness criterion.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::events::EventEmitter;
use crate::llm::{ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmError, Message};
use crate::prompts::embedded;
use crate::tools::{ToolContext, ToolRegistry};

use super::AgentKind;

/// Runs one specialist agent against the LLM
pub struct AgentRunner {
    kind: AgentKind,
    llm: Arc<dyn LlmClient>,
    model: String,
    registry: ToolRegistry,
    ctx: ToolContext,
    max_tokens: u32,
    emitter: Option<EventEmitter>,
    cancel: CancellationToken,
}

impl AgentRunner {
    /// Create a runner for an agent kind
    pub fn new(kind: AgentKind, llm: Arc<dyn LlmClient>, model: impl Into<String>, ctx: ToolContext) -> Self {
        let cancel = ctx.cancel.clone();
        Self {
            kind,
            llm,
            model: model.into(),
            registry: ToolRegistry::with_profile(kind.tool_profile()),
            ctx,
            max_tokens: 8192,
            emitter: None,
            cancel,
        }
    }

    /// Attach an event emitter
    pub fn with_emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Override the response token cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The agent kind this runner executes
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Run the loop over an accumulating conversation
    ///
    /// `history` grows in place: the caller keeps it across conductor
    /// attempts so retries see the errors and the agent's prior actions.
    /// Returns the agent's final text, or the cap sentinel when the model
    /// never stopped requesting tools.
    pub async fn run(&self, history: &mut Vec<Message>) -> Result<String, LlmError> {
        debug!(agent = %self.kind, model = %self.model, "AgentRunner::run: called");
        if let Some(emitter) = &self.emitter {
            emitter.agent_started(self.kind.role());
        }

        let result = self.run_loop(history).await;

        if let Some(emitter) = &self.emitter {
            emitter.agent_completed(self.kind.role(), result.is_ok());
        }
        result
    }

    async fn run_loop(&self, history: &mut Vec<Message>) -> Result<String, LlmError> {
        let tools = self.registry.definitions();

        for iteration in 1..=self.kind.max_iterations() {
            if self.cancel.is_cancelled() {
                return Err(LlmError::Cancelled);
            }

            debug!(agent = %self.kind, iteration, "AgentRunner::run_loop: iteration start");
            let response = self.chat(history, &tools, self.kind.system_prompt()).await?;

            if response.tool_calls.is_empty() {
                let text = response.content.unwrap_or_default();
                debug!(agent = %self.kind, iteration, "AgentRunner::run_loop: no tool calls, done");
                history.push(Message::assistant(text.clone()));
                return Ok(text);
            }

            // Record the assistant turn, then feed every tool result back
            let mut blocks = Vec::new();
            if let Some(text) = &response.content {
                blocks.push(ContentBlock::text(text));
            }
            for call in &response.tool_calls {
                blocks.push(ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.parse_arguments().unwrap_or_else(|_| serde_json::json!({})),
                });
            }
            history.push(Message::assistant_blocks(blocks));

            let mut result_blocks = Vec::new();
            for call in &response.tool_calls {
                let result = self.registry.execute(call, &self.ctx).await;
                if let Some(emitter) = &self.emitter {
                    emitter.tool_call(&call.name, &summarize_args(&call.arguments), !result.is_error);
                }
                if result.is_error {
                    debug!(agent = %self.kind, tool = %call.name, error = %result.content, "AgentRunner::run_loop: tool error fed back");
                }
                result_blocks.push(ContentBlock::tool_result(&call.id, result.feedback(), result.is_error));
            }
            history.push(Message::user_blocks(result_blocks));
        }

        warn!(agent = %self.kind, cap = self.kind.max_iterations(), "AgentRunner::run_loop: iteration cap reached");

        if self.kind == AgentKind::Query {
            // A capped read-only run still owes the user an answer:
            // one final plain chat summarizes the accumulated tool output.
            info!("Query agent capped, running final summarize pass");
            let response = self.chat(history, &[], embedded::QUERY_SUMMARY).await?;
            if let Some(text) = response.content {
                history.push(Message::assistant(text.clone()));
                return Ok(text);
            }
        }

        Ok(self.kind.cap_sentinel())
    }

    async fn chat(
        &self,
        history: &[Message],
        tools: &[crate::llm::ToolDefinition],
        system_prompt: &str,
    ) -> Result<ChatResponse, LlmError> {
        let request = ChatRequest {
            system_prompt: system_prompt.to_string(),
            messages: history.to_vec(),
            tools: tools.to_vec(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
        };

        let response = self.llm.chat(request).await?;

        if let Some(emitter) = &self.emitter {
            emitter.llm_request(
                &response.backend,
                &self.model,
                response.usage.tokens_in,
                response.usage.tokens_out,
                response.latency_ms,
            );
        }
        Ok(response)
    }
}

/// First line of the raw arguments, shortened for event payloads
fn summarize_args(arguments: &str) -> String {
    let first_line = arguments.lines().next().unwrap_or("");
    if first_line.len() > 120 {
        let mut cut = 120;
        while !first_line.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &first_line[..cut])
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use crate::llm::MessageContent;
    use tempfile::tempdir;

    fn runner_with(kind: AgentKind, replies: Vec<MockReply>, workspace: &std::path::Path) -> AgentRunner {
        let llm = Arc::new(MockLlmClient::new(replies));
        let ctx = ToolContext::new(workspace.to_path_buf(), "test-run".to_string());
        AgentRunner::new(kind, llm, "test-model", ctx)
    }

    #[tokio::test]
    async fn test_run_returns_text_when_no_tool_calls() {
        let temp = tempdir().unwrap();
        let runner = runner_with(AgentKind::Editor, vec![MockReply::text("All done")], temp.path());

        let mut history = vec![Message::user("create hello.txt")];
        let result = runner.run(&mut history).await.unwrap();

        assert_eq!(result, "All done");
        // Assistant reply appended to the accumulating history
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_run_executes_tool_and_feeds_result() {
        let temp = tempdir().unwrap();
        let runner = runner_with(
            AgentKind::Editor,
            vec![
                MockReply::tool_call("call_1", "write_file", serde_json::json!({"path": "hello.txt", "content": "Hi"})),
                MockReply::text("Created the file"),
            ],
            temp.path(),
        );

        let mut history = vec![Message::user("create hello.txt with content 'Hi'")];
        let result = runner.run(&mut history).await.unwrap();

        assert_eq!(result, "Created the file");
        assert_eq!(std::fs::read_to_string(temp.path().join("hello.txt")).unwrap(), "Hi");

        // History: user, assistant tool_use, user tool_result, assistant text
        assert_eq!(history.len(), 4);
        match &history[2].content {
            MessageContent::Blocks(blocks) => match &blocks[0] {
                ContentBlock::ToolResult { tool_use_id, .. } => assert_eq!(tool_use_id, "call_1"),
                other => panic!("expected tool result, got {:?}", other),
            },
            other => panic!("expected blocks, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tool_error_is_fed_back_and_loop_continues() {
        let temp = tempdir().unwrap();
        let runner = runner_with(
            AgentKind::Editor,
            vec![
                MockReply::tool_call("call_1", "read_file", serde_json::json!({"path": "missing.txt"})),
                MockReply::text("The file does not exist"),
            ],
            temp.path(),
        );

        let mut history = vec![Message::user("what is in missing.txt?")];
        let result = runner.run(&mut history).await.unwrap();

        assert_eq!(result, "The file does not exist");
        match &history[2].content {
            MessageContent::Blocks(blocks) => match &blocks[0] {
                ContentBlock::ToolResult { content, is_error, .. } => {
                    assert!(is_error);
                    assert!(content.starts_with("Error: "));
                }
                other => panic!("expected tool result, got {:?}", other),
            },
            other => panic!("expected blocks, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_iteration_cap_returns_sentinel() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("f.txt"), "x").unwrap();

        // The model requests a tool on every turn, forever
        let replies: Vec<MockReply> = (0..10)
            .map(|i| MockReply::tool_call(&format!("call_{}", i), "read_file", serde_json::json!({"path": "f.txt"})))
            .collect();
        let llm = Arc::new(MockLlmClient::new(replies));
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test-run".to_string());
        let runner = AgentRunner::new(AgentKind::Editor, Arc::clone(&llm) as Arc<dyn LlmClient>, "m", ctx);

        let mut history = vec![Message::user("loop forever")];
        let result = runner.run(&mut history).await.unwrap();

        assert_eq!(result, "Editor reached max iterations");
        assert_eq!(llm.call_count(), 5);
    }

    #[tokio::test]
    async fn test_query_cap_runs_final_summary() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("f.txt"), "x").unwrap();

        let mut replies: Vec<MockReply> = (0..4)
            .map(|i| MockReply::tool_call(&format!("call_{}", i), "read_file", serde_json::json!({"path": "f.txt"})))
            .collect();
        replies.push(MockReply::text("Summary of findings"));

        let llm = Arc::new(MockLlmClient::new(replies));
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test-run".to_string());
        let runner = AgentRunner::new(AgentKind::Query, Arc::clone(&llm) as Arc<dyn LlmClient>, "m", ctx);

        let mut history = vec![Message::user("describe everything")];
        let result = runner.run(&mut history).await.unwrap();

        // 4 capped iterations plus the summarize pass
        assert_eq!(result, "Summary of findings");
        assert_eq!(llm.call_count(), 5);
    }

    #[tokio::test]
    async fn test_editor_allow_list_violation_round_trip() {
        let temp = tempdir().unwrap();
        let llm = Arc::new(MockLlmClient::new(vec![
            MockReply::tool_call("call_1", "write_file", serde_json::json!({"path": "b.go", "content": "x"})),
            MockReply::text("Understood, staying within a.go"),
        ]));
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test-run".to_string())
            .with_allowed_files(vec!["a.go".to_string()]);
        let runner = AgentRunner::new(AgentKind::Editor, llm, "m", ctx);

        let mut history = vec![Message::user("edit b.go")];
        let result = runner.run(&mut history).await.unwrap();

        assert_eq!(result, "Understood, staying within a.go");
        assert!(!temp.path().join("b.go").exists());
        match &history[2].content {
            MessageContent::Blocks(blocks) => match &blocks[0] {
                ContentBlock::ToolResult { content, is_error, .. } => {
                    assert!(is_error);
                    assert!(content.contains("a.go"));
                    assert!(content.contains("not in the allowed list"));
                }
                other => panic!("expected tool result, got {:?}", other),
            },
            other => panic!("expected blocks, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_llm_error_propagates() {
        let temp = tempdir().unwrap();
        let runner = runner_with(AgentKind::Editor, vec![MockReply::RateLimited], temp.path());

        let mut history = vec![Message::user("do something")];
        let err = runner.run(&mut history).await.unwrap_err();
        assert!(err.is_rate_limit());
    }
}
