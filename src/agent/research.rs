//! Research provider
//!
//! Research is a black box to the engine: a provider takes a question and
//! returns a summary string. The web implementation fetches any URLs named
//! in the question, converts the pages to markdown, and summarizes through
//! the LLM.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::{Context, Result};
use tracing::{debug, warn};

use crate::llm::{ChatRequest, LlmClient, Message};
use crate::prompts::embedded;

/// Fetched page size kept before truncation
const MAX_PAGE_CHARS: usize = 40_000;

/// External lookup capability consumed by the engine
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Answer a research question with a summary string
    async fn research(&self, question: &str) -> Result<String>;
}

/// Research provider that fetches web pages and summarizes via the LLM
pub struct WebResearchProvider {
    llm: Arc<dyn LlmClient>,
    model: String,
    http: reqwest::Client,
}

impl WebResearchProvider {
    /// Create a provider using the given client and model
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("chuchu/0.1 (research)")
            .build()
            .unwrap_or_default();
        Self {
            llm,
            model: model.into(),
            http,
        }
    }

    /// Fetch a URL and convert HTML responses to markdown
    async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!(%url, "WebResearchProvider::fetch_page: called");
        let response = self.http.get(url).send().await.context("Failed to fetch URL")?;

        if !response.status().is_success() {
            eyre::bail!("HTTP error {} fetching {}", response.status(), url);
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.context("Failed to read response body")?;

        let text = if content_type.contains("text/html") {
            html2md::rewrite_html(&body, false)
        } else {
            body
        };

        if text.len() > MAX_PAGE_CHARS {
            let mut cut = MAX_PAGE_CHARS;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            Ok(format!("{}\n[content truncated]", &text[..cut]))
        } else {
            Ok(text)
        }
    }
}

#[async_trait]
impl ResearchProvider for WebResearchProvider {
    async fn research(&self, question: &str) -> Result<String> {
        let mut material = String::new();
        for url in extract_urls(question) {
            match self.fetch_page(&url).await {
                Ok(page) => {
                    material.push_str(&format!("## Source: {}\n\n{}\n\n", url, page));
                }
                Err(e) => {
                    warn!(%url, error = %e, "Failed to fetch research source");
                    material.push_str(&format!("## Source: {} (fetch failed: {})\n\n", url, e));
                }
            }
        }

        let user_message = if material.is_empty() {
            format!("Question: {}", question)
        } else {
            format!("Question: {}\n\nFetched material:\n\n{}", question, material)
        };

        let request = ChatRequest {
            system_prompt: embedded::RESEARCH.to_string(),
            messages: vec![Message::user(user_message)],
            tools: vec![],
            model: self.model.clone(),
            max_tokens: 4096,
        };

        let response = self.llm.chat(request).await.context("Research summarization failed")?;
        Ok(response.content.unwrap_or_else(|| "No research findings".to_string()))
    }
}

/// Pull http(s) URLs out of free text
fn extract_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|w| w.starts_with("http://") || w.starts_with("https://"))
        .map(|w| w.trim_end_matches([',', '.', ')', ']', ';']).to_string())
        .collect()
}
