//! Intent classification
//!
//! The fallback chain is explicit: hard query heuristics, then the
//! embedded model above its confidence threshold, then a strict LLM
//! categorizer, then the query default.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::{ChatRequest, LlmClient, Message};
use crate::prompts::embedded as prompts;

use super::embedded::{EmbeddedModel, LexicalModel};

/// Task intent labels (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Query,
    Edit,
    Research,
    Test,
    Review,
}

impl Intent {
    /// Lowercase label
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Query => "query",
            Intent::Edit => "edit",
            Intent::Research => "research",
            Intent::Test => "test",
            Intent::Review => "review",
        }
    }
}

impl FromStr for Intent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "query" => Ok(Intent::Query),
            "edit" => Ok(Intent::Edit),
            "research" => Ok(Intent::Research),
            "test" => Ok(Intent::Test),
            "review" => Ok(Intent::Review),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where the decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentSource {
    Heuristic,
    Embedded,
    Llm,
    Default,
}

/// The classification outcome
#[derive(Debug, Clone)]
pub struct IntentDecision {
    pub intent: Intent,
    pub confidence: f32,
    pub source: IntentSource,
    /// Error recorded when a fallback stage failed
    pub error: Option<String>,
}

/// Query phrases that override any classifier output
const QUERY_PREFIXES: &[&str] = &[
    "what", "show", "list", "tell", "which", "how many", "where", "when", "who",
];
const QUERY_MARKERS: &[&str] = &[
    "git status",
    "git log",
    "git diff",
    "git branch",
    "what changes",
    "show me",
    "list all",
];

/// Whether a task is an obvious read-only question
pub fn obvious_query(task: &str) -> bool {
    let lower = task.trim().to_lowercase();
    QUERY_PREFIXES.iter().any(|p| lower.starts_with(p)) || QUERY_MARKERS.iter().any(|m| lower.contains(m))
}

/// Embedded-first intent classifier with an LLM fallback
pub struct IntentClassifier {
    embedded: Box<dyn EmbeddedModel>,
    llm: Option<Arc<dyn LlmClient>>,
    model: String,
    threshold: f32,
}

impl IntentClassifier {
    /// Create a classifier with the built-in lexical model
    pub fn new(llm: Option<Arc<dyn LlmClient>>, model: impl Into<String>, threshold: f32) -> Self {
        Self {
            embedded: Box::new(LexicalModel::intent()),
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

    /// Classify a task through the fallback chain
    pub async fn classify(&self, task: &str) -> IntentDecision {
        if obvious_query(task) {
            debug!("IntentClassifier::classify: query heuristic hit");
            return IntentDecision {
                intent: Intent::Query,
                confidence: 1.0,
                source: IntentSource::Heuristic,
                error: None,
            };
        }

        let result = self.embedded.classify(task);
        let confidence = result.confidence();
        if confidence >= self.threshold
            && let Ok(intent) = Intent::from_str(&result.label)
        {
            debug!(label = %result.label, confidence, "IntentClassifier::classify: embedded model confident");
            return IntentDecision {
                intent,
                confidence,
                source: IntentSource::Embedded,
                error: None,
            };
        }

        debug!(confidence, threshold = self.threshold, "IntentClassifier::classify: falling back to LLM");
        match self.classify_via_llm(task).await {
            Ok(intent) => IntentDecision {
                intent,
                confidence: 0.0,
                source: IntentSource::Llm,
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "Intent classification fell through to default");
                IntentDecision {
                    intent: Intent::Query,
                    confidence: 0.0,
                    source: IntentSource::Default,
                    error: Some(e),
                }
            }
        }
    }

    async fn classify_via_llm(&self, task: &str) -> Result<Intent, String> {
        let llm = self.llm.as_ref().ok_or_else(|| "no LLM configured".to_string())?;

        let request = ChatRequest {
            system_prompt: prompts::INTENT.to_string(),
            messages: vec![Message::user(task.to_string())],
            tools: vec![],
            model: self.model.clone(),
            max_tokens: 16,
        };

        let response = llm.chat(request).await.map_err(|e| e.to_string())?;
        let reply = response.content.unwrap_or_default();
        Intent::from_str(&reply).map_err(|_| format!("unknown intent label: '{}'", reply.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};

    #[test]
    fn test_obvious_query_prefixes() {
        assert!(obvious_query("what is in main.go"));
        assert!(obvious_query("show me git status"));
        assert!(obvious_query("list all endpoints"));
        assert!(obvious_query("How many tests are there?"));
        assert!(!obvious_query("add a Divide function"));
    }

    #[test]
    fn test_obvious_query_git_markers() {
        assert!(obvious_query("run git diff against main"));
        assert!(obvious_query("print git log for last week"));
    }

    #[tokio::test]
    async fn test_heuristic_overrides_everything() {
        // No LLM configured at all, heuristic still answers
        let classifier = IntentClassifier::new(None, "m", 0.7);
        let decision = classifier.classify("show me git status").await;
        assert_eq!(decision.intent, Intent::Query);
        assert_eq!(decision.source, IntentSource::Heuristic);
    }

    #[tokio::test]
    async fn test_embedded_confident_skips_llm() {
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let classifier = IntentClassifier::new(Some(Arc::clone(&llm) as Arc<dyn LlmClient>), "m", 0.5);

        let decision = classifier.classify("refactor and fix the parser, update the tests").await;
        assert_eq!(decision.source, IntentSource::Embedded);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_llm_fallback_on_low_confidence() {
        let llm = Arc::new(MockLlmClient::new(vec![MockReply::text("edit")]));
        let classifier = IntentClassifier::new(Some(Arc::clone(&llm) as Arc<dyn LlmClient>), "m", 0.99);

        let decision = classifier.classify("frobnicate the doohickey").await;
        assert_eq!(decision.intent, Intent::Edit);
        assert_eq!(decision.source, IntentSource::Llm);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_llm_label_defaults_to_query_with_error() {
        let llm = Arc::new(MockLlmClient::new(vec![MockReply::text("banana")]));
        let classifier = IntentClassifier::new(Some(llm), "m", 0.99);

        let decision = classifier.classify("frobnicate the doohickey").await;
        assert_eq!(decision.intent, Intent::Query);
        assert_eq!(decision.source, IntentSource::Default);
        assert!(decision.error.unwrap().contains("banana"));
    }

    #[tokio::test]
    async fn test_llm_error_defaults_to_query_with_error() {
        let llm = Arc::new(MockLlmClient::new(vec![MockReply::ServerError]));
        let classifier = IntentClassifier::new(Some(llm), "m", 0.99);

        let decision = classifier.classify("frobnicate the doohickey").await;
        assert_eq!(decision.intent, Intent::Query);
        assert_eq!(decision.source, IntentSource::Default);
        assert!(decision.error.is_some());
    }

    #[test]
    fn test_intent_round_trip() {
        for intent in [Intent::Query, Intent::Edit, Intent::Research, Intent::Test, Intent::Review] {
            assert_eq!(Intent::from_str(intent.label()).unwrap(), intent);
        }
        assert!(Intent::from_str("unknown").is_err());
    }
}
