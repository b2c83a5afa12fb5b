//! OpenAI-compatible chat-completions client
//!
//! Covers the OpenAI API itself and any OpenAI-compatible router or local
//! inference server configured as a backend.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{
    ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmError, Message, MessageContent, Role, StopReason,
    StreamChunk, TokenUsage, ToolCall,
};
use crate::config::BackendConfig;

/// Maximum number of in-client retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Check if an HTTP status code is retryable in-client
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504)
}

/// OpenAI-compatible API client
pub struct OpenAIClient {
    backend: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new client from a backend configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| LlmError::InvalidResponse(format!("Environment variable {} not set", config.api_key_env)))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            backend: config.name.clone(),
            api_key,
            base_url: config.base_url.clone(),
            http,
            timeout,
        })
    }

    /// Build the request body for the chat-completions API
    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        messages.extend(self.convert_messages(&request.messages));

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(request.tools.iter().map(|t| t.to_openai_schema()).collect::<Vec<_>>());
            body["tool_choice"] = serde_json::json!("auto");
        }

        body
    }

    /// Convert internal Message types to OpenAI API format
    ///
    /// OpenAI requires one message per tool result, so a single internal
    /// message with multiple tool results becomes multiple API messages.
    fn convert_messages(&self, messages: &[Message]) -> Vec<serde_json::Value> {
        let mut result = Vec::new();

        for msg in messages {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };

            match &msg.content {
                MessageContent::Text(text) => {
                    result.push(serde_json::json!({
                        "role": role,
                        "content": text,
                    }));
                }
                MessageContent::Blocks(blocks) => {
                    let mut tool_calls = Vec::new();
                    let mut tool_results = Vec::new();
                    let mut text_content = String::new();

                    for block in blocks {
                        match block {
                            ContentBlock::Text { text } => {
                                text_content.push_str(text);
                            }
                            ContentBlock::ToolUse { id, name, input } => {
                                tool_calls.push(serde_json::json!({
                                    "id": id,
                                    "type": "function",
                                    "function": {
                                        "name": name,
                                        "arguments": input.to_string(),
                                    }
                                }));
                            }
                            ContentBlock::ToolResult {
                                tool_use_id, content, ..
                            } => {
                                tool_results.push((tool_use_id.clone(), content.clone()));
                            }
                        }
                    }

                    if !tool_results.is_empty() {
                        for (tool_call_id, content) in tool_results {
                            result.push(serde_json::json!({
                                "role": "tool",
                                "tool_call_id": tool_call_id,
                                "content": content,
                            }));
                        }
                        continue;
                    }

                    if !tool_calls.is_empty() {
                        let mut msg = serde_json::json!({
                            "role": "assistant",
                            "tool_calls": tool_calls,
                        });
                        if !text_content.is_empty() {
                            msg["content"] = serde_json::json!(text_content);
                        }
                        result.push(msg);
                        continue;
                    }

                    result.push(serde_json::json!({
                        "role": role,
                        "content": text_content,
                    }));
                }
            }
        }

        result
    }

    /// Parse the API response
    fn parse_response(&self, api_response: OpenAIResponse, latency_ms: u64) -> ChatResponse {
        let choice = api_response.choices.into_iter().next();

        let (content, tool_calls, stop_reason) = match choice {
            Some(c) => {
                let content = c.message.content;
                let tool_calls = c
                    .message
                    .tool_calls
                    .unwrap_or_default()
                    .into_iter()
                    .map(|tc| ToolCall {
                        id: tc.id,
                        name: tc.function.name,
                        arguments: tc.function.arguments,
                    })
                    .collect();
                let stop_reason = c
                    .finish_reason
                    .as_deref()
                    .map(StopReason::from_api)
                    .unwrap_or(StopReason::EndTurn);
                (content, tool_calls, stop_reason)
            }
            None => (None, vec![], StopReason::EndTurn),
        };

        ChatResponse {
            content,
            tool_calls,
            stop_reason,
            usage: TokenUsage {
                tokens_in: api_response.usage.prompt_tokens,
                tokens_out: api_response.usage.completion_tokens,
                cached_tokens: 0,
            },
            backend: self.backend.clone(),
            latency_ms,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Network(e)
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn backend_name(&self) -> &str {
        &self.backend
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);
        let start = Instant::now();

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, backoff_ms = backoff, "chat: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self
                .http
                .post(url.clone())
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "chat: network error");
                    last_error = Some(self.map_send_error(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);

                return Err(LlmError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                });
            }

            if is_retryable_status(status) && attempt < MAX_RETRIES {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "chat: retryable error");
                last_error = Some(LlmError::ApiError { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::from_status(status, text));
            }

            let api_response: OpenAIResponse = response.json().await?;
            return Ok(self.parse_response(api_response, start.elapsed().as_millis() as u64));
        }

        Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
    }

    async fn stream(
        &self,
        request: ChatRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut body = self.build_request_body(&request);
        body["stream"] = serde_json::json!(true);
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status, text));
        }

        let mut stream = response.bytes_stream();
        let mut full_content = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut current_tool_calls: std::collections::HashMap<usize, (String, String, String)> =
            std::collections::HashMap::new(); // index -> (id, name, args)
        let mut stop_reason = StopReason::EndTurn;
        let mut usage = TokenUsage::default();
        let mut buffer = String::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(LlmError::Network)?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Process complete SSE lines
            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].trim().to_string();
                buffer = buffer[line_end + 1..].to_string();

                if line.is_empty() || line == "data: [DONE]" {
                    continue;
                }

                if let Some(data) = line.strip_prefix("data: ")
                    && let Ok(chunk_data) = serde_json::from_str::<OpenAIStreamChunk>(data)
                {
                    if let Some(choice) = chunk_data.choices.first() {
                        if let Some(content) = &choice.delta.content {
                            full_content.push_str(content);
                            let _ = chunk_tx.send(StreamChunk::TextDelta(content.clone())).await;
                        }

                        if let Some(tcs) = &choice.delta.tool_calls {
                            for tc in tcs {
                                let entry = current_tool_calls
                                    .entry(tc.index)
                                    .or_insert_with(|| (String::new(), String::new(), String::new()));

                                if let Some(id) = &tc.id {
                                    entry.0 = id.clone();
                                }
                                if let Some(func) = &tc.function {
                                    if let Some(name) = &func.name {
                                        entry.1 = name.clone();
                                        let _ = chunk_tx
                                            .send(StreamChunk::ToolUseStart {
                                                id: entry.0.clone(),
                                                name: name.clone(),
                                            })
                                            .await;
                                    }
                                    if let Some(args) = &func.arguments {
                                        entry.2.push_str(args);
                                        let _ = chunk_tx
                                            .send(StreamChunk::ToolUseDelta {
                                                id: entry.0.clone(),
                                                json_delta: args.clone(),
                                            })
                                            .await;
                                    }
                                }
                            }
                        }

                        if let Some(reason) = &choice.finish_reason {
                            stop_reason = StopReason::from_api(reason);
                        }
                    }

                    if let Some(u) = chunk_data.usage {
                        usage.tokens_in = u.prompt_tokens;
                        usage.tokens_out = u.completion_tokens;
                    }
                }
            }
        }

        for (_, (id, name, args)) in current_tool_calls {
            tool_calls.push(ToolCall {
                id: id.clone(),
                name,
                arguments: if args.is_empty() { "{}".to_string() } else { args },
            });
            let _ = chunk_tx.send(StreamChunk::ToolUseEnd { id }).await;
        }

        let _ = chunk_tx
            .send(StreamChunk::MessageDone {
                stop_reason: stop_reason.clone(),
                usage: usage.clone(),
            })
            .await;

        Ok(ChatResponse {
            content: if full_content.is_empty() { None } else { Some(full_content) },
            tool_calls,
            stop_reason,
            usage,
            backend: self.backend.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

// Streaming types

#[derive(Debug, Deserialize)]
struct OpenAIStreamChunk {
    choices: Vec<OpenAIStreamChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIStreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamToolCall {
    index: usize,
    id: Option<String>,
    function: Option<OpenAIStreamFunction>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> OpenAIClient {
        OpenAIClient {
            backend: "openai".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.openai.com".to_string(),
            http: Client::new(),
            timeout: Duration::from_secs(120),
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = test_client();
        let request = ChatRequest {
            system_prompt: "You are helpful".to_string(),
            messages: vec![Message::user("Hello")],
            tools: vec![],
            model: "gpt-4o".to_string(),
            max_tokens: 1000,
        };

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_convert_tool_results_split_into_messages() {
        let client = test_client();
        let messages = vec![Message::user_blocks(vec![
            ContentBlock::tool_result("call_1", "ok", false),
            ContentBlock::tool_result("call_2", "Error: nope", true),
        ])];

        let converted = client.convert_messages(&messages);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0]["role"], "tool");
        assert_eq!(converted[0]["tool_call_id"], "call_1");
        assert_eq!(converted[1]["tool_call_id"], "call_2");
    }

    #[test]
    fn test_convert_assistant_tool_use() {
        let client = test_client();
        let messages = vec![Message::assistant_blocks(vec![
            ContentBlock::text("Writing now"),
            ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "write_file".to_string(),
                input: serde_json::json!({"path": "a.txt", "content": "x"}),
            },
        ])];

        let converted = client.convert_messages(&messages);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0]["role"], "assistant");
        assert_eq!(converted[0]["tool_calls"][0]["function"]["name"], "write_file");
        assert_eq!(converted[0]["content"], "Writing now");
    }

    #[test]
    fn test_parse_response_keeps_raw_arguments() {
        let client = test_client();
        let api_response = OpenAIResponse {
            choices: vec![OpenAIChoice {
                message: OpenAIMessage {
                    content: None,
                    tool_calls: Some(vec![OpenAIToolCall {
                        id: "call_1".to_string(),
                        function: OpenAIFunction {
                            name: "read_file".to_string(),
                            arguments: r#"{"path":"a.go"}"#.to_string(),
                        },
                    }]),
                },
                finish_reason: Some("tool_calls".to_string()),
            }],
            usage: OpenAIUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            },
        };

        let response = client.parse_response(api_response, 7);
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.tool_calls[0].arguments, r#"{"path":"a.go"}"#);
        assert_eq!(response.tool_calls[0].parse_arguments().unwrap()["path"], "a.go");
    }
}
