//! SymphonyPlanner - LLM-driven decomposition of a task into movements
//!
//! The planner asks the model to call a single `submit_movements` tool
//! with the full ordered list, and validates what comes back.

use std::sync::Arc;

use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::llm::{ChatRequest, LlmClient, Message, ToolDefinition};
use crate::prompts::embedded;
use crate::symphony::Movement;

/// LLM output schema for one movement
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MovementOutput {
    /// Short movement name
    name: String,
    /// The sub-task text
    goal: String,
}

/// Full decomposition output from the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecompositionOutput {
    movements: Vec<MovementOutput>,
}

/// Decomposes complex tasks into ordered movements
pub struct SymphonyPlanner {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl SymphonyPlanner {
    /// Create a planner using the given client and model
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Decompose a task into movements
    ///
    /// Returns an error when the model produces no usable decomposition;
    /// the executor degrades to direct execution in that case.
    pub async fn plan(&self, task: &str, analysis_summary: &str) -> Result<Vec<Movement>> {
        info!(task_len = task.len(), "Decomposing task into movements");

        let user_message = if analysis_summary.is_empty() {
            format!("Decompose this task into movements:\n\n{}", task)
        } else {
            format!(
                "Decompose this task into movements:\n\n{}\n\nWorkspace analysis:\n{}",
                task, analysis_summary
            )
        };

        let request = ChatRequest {
            system_prompt: embedded::PLANNER.to_string(),
            messages: vec![Message::user(user_message)],
            tools: vec![self.submit_tool()],
            model: self.model.clone(),
            max_tokens: 4096,
        };

        let response = self
            .llm
            .chat(request)
            .await
            .context("Failed to get LLM response for decomposition")?;

        let output = self.parse_response(&response)?;

        let movements: Vec<Movement> = output
            .movements
            .into_iter()
            .map(|m| Movement::new(m.name, m.goal))
            .collect();

        info!(count = movements.len(), "Task decomposed into movements");
        Ok(movements)
    }

    /// The single tool the planner model may call
    fn submit_tool(&self) -> ToolDefinition {
        ToolDefinition::new(
            "submit_movements",
            "Submit the task decomposition. Call this once with the full ordered list of movements.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "movements": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": {
                                    "type": "string",
                                    "description": "Short movement name"
                                },
                                "goal": {
                                    "type": "string",
                                    "description": "The sub-task an editing agent should execute"
                                }
                            },
                            "required": ["name", "goal"]
                        }
                    }
                },
                "required": ["movements"]
            }),
        )
    }

    /// Pull the decomposition out of the response
    fn parse_response(&self, response: &crate::llm::ChatResponse) -> Result<DecompositionOutput> {
        for call in &response.tool_calls {
            if call.name == "submit_movements" {
                debug!("SymphonyPlanner::parse_response: found submit_movements call");
                let input = call.parse_arguments().context("Malformed submit_movements arguments")?;
                let output: DecompositionOutput =
                    serde_json::from_value(input).context("Failed to parse movements from decomposition")?;
                if output.movements.is_empty() {
                    bail!("Decomposition produced zero movements");
                }
                return Ok(output);
            }
        }

        // No tool call: tolerate a model that answered with raw JSON
        if let Some(content) = &response.content
            && let Ok(output) = serde_json::from_str::<DecompositionOutput>(content)
        {
            if output.movements.is_empty() {
                bail!("Decomposition produced zero movements");
            }
            return Ok(output);
        }

        bail!("LLM did not produce a valid decomposition")
    }
}
