//! Task classification
//!
//! Intent and complexity are each an explicit fallback chain:
//! embedded model, then LLM categorizer, then a safe default.

mod complexity;
mod embedded;
mod intent;

pub use complexity::{ComplexityClassifier, DEFAULT_COMPLEXITY};
pub use embedded::{Classification, EmbeddedModel, LexicalModel};
pub use intent::{Intent, IntentClassifier, IntentDecision, IntentSource, obvious_query};
