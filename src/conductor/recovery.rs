//! Error classification and recovery prompts
//!
//! A keyword classifier maps verifier and provider output onto a closed
//! set of error kinds; the recovery strategy turns a kind into the prompt
//! that seeds the next attempt, or signals escalation to a model switch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::llm::LlmError;
use crate::prompts::{self, embedded};

/// Closed set of failure kinds driving recovery policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Build,
    Test,
    ToolUnsupported,
    RateLimit,
    Timeout,
    Provider5xx,
    Parse,
    Unknown,
}

impl ErrorKind {
    /// Kinds that escalate to a model switch instead of burning an attempt
    pub fn should_escalate(&self) -> bool {
        matches!(
            self,
            ErrorKind::ToolUnsupported | ErrorKind::RateLimit | ErrorKind::Timeout | ErrorKind::Provider5xx | ErrorKind::Parse
        )
    }

    /// Kinds that roll the workspace back to the last checkpoint
    pub fn should_rollback(&self) -> bool {
        matches!(self, ErrorKind::Build)
    }

    /// Lowercase name for records and messages
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Build => "build",
            ErrorKind::Test => "test",
            ErrorKind::ToolUnsupported => "tool_unsupported",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Provider5xx => "provider_5xx",
            ErrorKind::Parse => "parse",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<&LlmError> for ErrorKind {
    fn from(e: &LlmError) -> Self {
        match e {
            LlmError::RateLimited { .. } => ErrorKind::RateLimit,
            LlmError::Timeout(_) => ErrorKind::Timeout,
            LlmError::ToolUnsupported(_) => ErrorKind::ToolUnsupported,
            LlmError::ApiError { status, .. } if *status >= 500 => ErrorKind::Provider5xx,
            LlmError::Network(_) => ErrorKind::Timeout,
            LlmError::Json(_) | LlmError::InvalidResponse(_) => ErrorKind::Parse,
            _ => ErrorKind::Unknown,
        }
    }
}

/// Compiler error markers across the verified languages
const BUILD_MARKERS: &[&str] = &[
    "cannot find package",
    "undefined: ",
    "syntax error",
    "syntaxerror",
    "compileerror",
    "compilation error",
    "error ts",
    "error[e",
    "expected ';'",
    "cannot use ",
    "undeclared name",
];

/// Classify verifier or provider output into an error kind
pub fn classify_error(output: &str) -> ErrorKind {
    let lower = output.to_lowercase();

    if lower.contains("rate limit") || lower.contains("429") {
        return ErrorKind::RateLimit;
    }
    if lower.contains("timeout") || lower.contains("context deadline exceeded") || lower.contains("connection reset") {
        return ErrorKind::Timeout;
    }
    if lower.contains("5xx") || lower.contains("internal server error") || lower.contains("provider returned error") {
        return ErrorKind::Provider5xx;
    }
    if lower.contains("no endpoints found that support tool use")
        || (lower.contains("tool") && lower.contains("not supported"))
    {
        return ErrorKind::ToolUnsupported;
    }
    if BUILD_MARKERS.iter().any(|m| lower.contains(m)) {
        return ErrorKind::Build;
    }
    if output.contains("FAIL") || lower.contains("test failed") || lower.contains("failing") {
        return ErrorKind::Test;
    }
    ErrorKind::Unknown
}

/// Tail kept when seeding a prompt with test output
const OUTPUT_TAIL_CHARS: usize = 4000;

/// Maps error kinds to next-attempt prompts and counts attempts
pub struct RecoveryStrategy {
    attempts: u32,
}

impl RecoveryStrategy {
    pub fn new() -> Self {
        Self { attempts: 0 }
    }

    /// Attempts recorded so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record a failed attempt
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// The prompt that seeds the next attempt
    ///
    /// `None` means the kind is not retryable at this level: the caller
    /// escalates to a model switch.
    pub fn fix_prompt(&self, kind: ErrorKind, output: &str) -> Option<String> {
        if kind.should_escalate() {
            debug!(%kind, "RecoveryStrategy::fix_prompt: escalating");
            return None;
        }

        let template = match kind {
            ErrorKind::Build => embedded::RECOVERY_BUILD,
            ErrorKind::Test => embedded::RECOVERY_TEST,
            _ => embedded::RECOVERY_GENERIC,
        };

        let seed = match kind {
            ErrorKind::Test => tail(output, OUTPUT_TAIL_CHARS),
            _ => output.to_string(),
        };

        let mut ctx = HashMap::new();
        ctx.insert("output", seed);
        prompts::render(template, &ctx).ok()
    }
}

impl Default for RecoveryStrategy {
    fn default() -> Self {
        Self::new()
    }
}

/// Last `chars` of a string, on a char boundary
fn tail(s: &str, chars: usize) -> String {
    if s.len() <= chars {
        return s.to_string();
    }
    let mut start = s.len() - chars;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}
