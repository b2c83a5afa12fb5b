//! LlmClient trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatRequest, ChatResponse, LlmError, StreamChunk};

/// Stateless LLM client - each call is independent
///
/// The agent loop owns the conversation; a client only turns one request
/// into one response. The model is part of the request so the selector can
/// switch models between attempts without rebuilding the client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Name of the backend this client talks to (from setup)
    fn backend_name(&self) -> &str;

    /// Send a single chat request (blocking until complete)
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Streaming chat for drivers that want token-level progress
    ///
    /// Sends chunks to the provided channel as they arrive and returns the
    /// final complete response.
    async fn stream(
        &self,
        request: ChatRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatResponse, LlmError>;
}
