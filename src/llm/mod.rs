//! LLM client module
//!
//! Provides the provider-agnostic chat types, the `LlmClient` trait, and
//! concrete clients for Anthropic and OpenAI-compatible backends.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{
    ChatRequest, ChatResponse, ContentBlock, Message, MessageContent, Role, StopReason, StreamChunk, TokenUsage,
    ToolCall, ToolDefinition,
};

use crate::config::BackendConfig;

/// Create an LLM client for a configured backend
///
/// Supports "anthropic" and "openai" providers; anything OpenAI-compatible
/// (a router, a local inference server) uses the "openai" provider with its
/// own base URL.
pub fn create_client(config: &BackendConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(backend = %config.name, provider = %config.provider, "create_client: called");
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::from_config(config)?)),
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config)?)),
        other => Err(LlmError::InvalidResponse(format!(
            "Unknown LLM provider: '{}'. Supported: anthropic, openai",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_unknown_provider() {
        let config = BackendConfig {
            name: "weird".to_string(),
            provider: "weird".to_string(),
            ..BackendConfig::default()
        };
        assert!(create_client(&config).is_err());
    }
}
