//! Embedded prompts
//!
//! Compiled into the binary from .pmt files.

/// Analyzer agent system prompt
pub const ANALYZER: &str = include_str!("../../prompts/analyzer.pmt");

/// Editor agent system prompt
pub const EDITOR: &str = include_str!("../../prompts/editor.pmt");

/// Query agent system prompt
pub const QUERY: &str = include_str!("../../prompts/query.pmt");

/// Query final-summary system prompt (used after an iteration-capped run)
pub const QUERY_SUMMARY: &str = include_str!("../../prompts/query-summary.pmt");

/// Reviewer agent system prompt
pub const REVIEWER: &str = include_str!("../../prompts/reviewer.pmt");

/// Research summarization system prompt
pub const RESEARCH: &str = include_str!("../../prompts/research.pmt");

/// Movement decomposition system prompt
pub const PLANNER: &str = include_str!("../../prompts/planner.pmt");

/// LLM-fallback intent categorizer prompt
pub const INTENT: &str = include_str!("../../prompts/intent.pmt");

/// LLM-fallback complexity rating prompt
pub const COMPLEXITY: &str = include_str!("../../prompts/complexity.pmt");

/// Recovery seed after a build failure ({{output}} slot)
pub const RECOVERY_BUILD: &str = include_str!("../../prompts/recovery-build.pmt");

/// Recovery seed after a test failure ({{output}} slot)
pub const RECOVERY_TEST: &str = include_str!("../../prompts/recovery-test.pmt");

/// Generic recovery seed ({{output}} slot)
pub const RECOVERY_GENERIC: &str = include_str!("../../prompts/recovery-generic.pmt");
