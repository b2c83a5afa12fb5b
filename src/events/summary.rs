//! Execution summary aggregate
//!
//! Updated on every emitted event regardless of subscribers, so the
//! end-of-run summary is correct even when nobody listened.

use serde::{Deserialize, Serialize};

use super::types::{EventKind, FileChange};

/// Aggregate counts for one engine run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub tool_calls: u64,
    pub tool_errors: u64,
    pub files_created: u64,
    pub files_modified: u64,
    pub files_deleted: u64,
    pub llm_requests: u64,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub agents_run: u64,
    pub agents_failed: u64,
    pub movements_completed: u64,
    pub movements_failed: u64,
    pub validations: u64,
    pub validations_failed: u64,
}

impl ExecutionSummary {
    /// Fold one event into the aggregate
    pub fn record(&mut self, kind: &EventKind) {
        match kind {
            EventKind::ToolCall { success, .. } => {
                self.tool_calls += 1;
                if !success {
                    self.tool_errors += 1;
                }
            }
            EventKind::FileModified { change, .. } => match change {
                FileChange::Create => self.files_created += 1,
                FileChange::Modify => self.files_modified += 1,
                FileChange::Delete => self.files_deleted += 1,
            },
            EventKind::LlmRequest {
                tokens_in, tokens_out, ..
            } => {
                self.llm_requests += 1;
                self.tokens_in += tokens_in;
                self.tokens_out += tokens_out;
            }
            EventKind::AgentStarted { .. } => {}
            EventKind::AgentCompleted { success, .. } => {
                self.agents_run += 1;
                if !success {
                    self.agents_failed += 1;
                }
            }
            EventKind::MovementStarted { .. } => {}
            EventKind::MovementCompleted { success, .. } => {
                if *success {
                    self.movements_completed += 1;
                } else {
                    self.movements_failed += 1;
                }
            }
            EventKind::Validation { success, .. } => {
                self.validations += 1;
                if !success {
                    self.validations_failed += 1;
                }
            }
        }
    }
}

impl std::fmt::Display for ExecutionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tool calls ({} errors), {} files touched, {} LLM requests ({} in / {} out tokens), {} validations ({} failed)",
            self.tool_calls,
            self.tool_errors,
            self.files_created + self.files_modified + self.files_deleted,
            self.llm_requests,
            self.tokens_in,
            self.tokens_out,
            self.validations,
            self.validations_failed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tool_calls() {
        let mut summary = ExecutionSummary::default();
        summary.record(&EventKind::ToolCall {
            tool: "read_file".to_string(),
            args_summary: String::new(),
            success: true,
        });
        summary.record(&EventKind::ToolCall {
            tool: "write_file".to_string(),
            args_summary: String::new(),
            success: false,
        });

        assert_eq!(summary.tool_calls, 2);
        assert_eq!(summary.tool_errors, 1);
    }

    #[test]
    fn test_record_file_changes() {
        let mut summary = ExecutionSummary::default();
        summary.record(&EventKind::FileModified {
            path: "a.go".to_string(),
            change: FileChange::Create,
        });
        summary.record(&EventKind::FileModified {
            path: "a.go".to_string(),
            change: FileChange::Modify,
        });

        assert_eq!(summary.files_created, 1);
        assert_eq!(summary.files_modified, 1);
        assert_eq!(summary.files_deleted, 0);
    }

    #[test]
    fn test_record_llm_usage() {
        let mut summary = ExecutionSummary::default();
        summary.record(&EventKind::LlmRequest {
            backend: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            tokens_in: 100,
            tokens_out: 50,
            latency_ms: 900,
        });

        assert_eq!(summary.llm_requests, 1);
        assert_eq!(summary.tokens_in, 100);
        assert_eq!(summary.tokens_out, 50);
    }

    #[test]
    fn test_display_is_human_readable() {
        let summary = ExecutionSummary::default();
        let text = summary.to_string();
        assert!(text.contains("0 tool calls"));
        assert!(text.contains("0 LLM requests"));
    }
}
