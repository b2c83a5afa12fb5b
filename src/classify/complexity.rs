//! Complexity classification
//!
//! The embedded model emits ordinal classes which map to a numeric score;
//! the score is the only signal the executor uses for decomposition.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::{ChatRequest, LlmClient, Message};
use crate::prompts::embedded as prompts;

use super::embedded::{EmbeddedModel, LexicalModel};

/// Score assigned when every stage of the chain fails
pub const DEFAULT_COMPLEXITY: u8 = 3;

/// Ordinal class to numeric score
fn class_score(label: &str) -> Option<u8> {
    match label {
        "simple" => Some(3),
        "complex" => Some(7),
        "multistep" => Some(9),
        _ => None,
    }
}

/// Embedded-first complexity classifier with an LLM fallback
pub struct ComplexityClassifier {
    embedded: Box<dyn EmbeddedModel>,
    llm: Option<Arc<dyn LlmClient>>,
    model: String,
    threshold: f32,
}

impl ComplexityClassifier {
    /// Create a classifier with the built-in lexical model
    pub fn new(llm: Option<Arc<dyn LlmClient>>, model: impl Into<String>, threshold: f32) -> Self {
        Self {
            embedded: Box::new(LexicalModel::complexity()),
            llm,
            model: model.into(),
            threshold,
        }
    }

    /// Swap the embedded model (tests, alternative inference)
    pub fn with_embedded(mut self, embedded: Box<dyn EmbeddedModel>) -> Self {
        self.embedded = embedded;
        self
    }

    /// Score a task 1-10
    pub async fn classify(&self, task: &str) -> u8 {
        let result = self.embedded.classify(task);
        let confidence = result.confidence();
        if confidence >= self.threshold
            && let Some(score) = class_score(&result.label)
        {
            debug!(label = %result.label, confidence, score, "ComplexityClassifier::classify: embedded model confident");
            return score;
        }

        debug!(confidence, threshold = self.threshold, "ComplexityClassifier::classify: falling back to LLM");
        match self.classify_via_llm(task).await {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, default = DEFAULT_COMPLEXITY, "Complexity classification fell through to default");
                DEFAULT_COMPLEXITY
            }
        }
    }

    async fn classify_via_llm(&self, task: &str) -> Result<u8, String> {
        let llm = self.llm.as_ref().ok_or_else(|| "no LLM configured".to_string())?;

        let request = ChatRequest {
            system_prompt: prompts::COMPLEXITY.to_string(),
            messages: vec![Message::user(task.to_string())],
            tools: vec![],
            model: self.model.clone(),
            max_tokens: 8,
        };

        let response = llm.chat(request).await.map_err(|e| e.to_string())?;
        let reply = response.content.unwrap_or_default();
        let score: u8 = reply
            .trim()
            .parse()
            .map_err(|_| format!("unparseable complexity reply: '{}'", reply.trim()))?;
        Ok(score.clamp(1, 10))
    }
}
