//! Embedded classification models
//!
//! A tiny linear scorer over lexical features, hand-weighted and compiled
//! in. Inference only - the trait keeps the door open for a real embedded
//! model without touching the fallback chain built on top.

use std::collections::HashMap;

/// Output of an embedded model: the top label and the full distribution
#[derive(Debug, Clone)]
pub struct Classification {
    pub label: String,
    pub probs: HashMap<String, f32>,
}

impl Classification {
    /// Confidence of the top label
    pub fn confidence(&self) -> f32 {
        self.probs.get(&self.label).copied().unwrap_or(0.0)
    }
}

/// A small classifier embedded in the binary
pub trait EmbeddedModel: Send + Sync {
    /// Classify free text into this model's label set
    fn classify(&self, text: &str) -> Classification;
}

/// Per-class lexical weights
struct ClassWeights {
    label: &'static str,
    bias: f32,
    keywords: &'static [(&'static str, f32)],
}

/// Linear model over keyword presence, normalized with a softmax
pub struct LexicalModel {
    classes: Vec<ClassWeights>,
}

impl LexicalModel {
    /// Intent model over {query, edit, research, test, review}
    pub fn intent() -> Self {
        Self {
            classes: vec![
                ClassWeights {
                    label: "query",
                    bias: 0.2,
                    keywords: &[
                        ("what", 1.2),
                        ("show", 1.2),
                        ("list", 1.2),
                        ("tell", 1.0),
                        ("which", 1.0),
                        ("how many", 1.4),
                        ("where", 1.0),
                        ("when", 0.8),
                        ("who", 0.8),
                        ("display", 1.0),
                        ("explain", 1.0),
                        ("status", 0.8),
                    ],
                },
                ClassWeights {
                    label: "edit",
                    bias: 0.0,
                    keywords: &[
                        ("add", 1.0),
                        ("create", 1.0),
                        ("write", 0.9),
                        ("modify", 1.2),
                        ("update", 1.0),
                        ("fix", 1.1),
                        ("refactor", 1.2),
                        ("implement", 1.2),
                        ("remove", 1.0),
                        ("delete", 1.0),
                        ("rename", 1.0),
                        ("change", 0.9),
                    ],
                },
                ClassWeights {
                    label: "research",
                    bias: -0.3,
                    keywords: &[
                        ("research", 1.6),
                        ("look up", 1.4),
                        ("compare", 0.9),
                        ("latest", 0.9),
                        ("documentation for", 1.1),
                        ("http://", 1.2),
                        ("https://", 1.2),
                    ],
                },
                ClassWeights {
                    label: "test",
                    bias: -0.2,
                    keywords: &[
                        ("test", 1.3),
                        ("tests", 1.3),
                        ("pytest", 1.5),
                        ("rspec", 1.5),
                        ("coverage", 1.2),
                    ],
                },
                ClassWeights {
                    label: "review",
                    bias: -0.2,
                    keywords: &[
                        ("review", 1.6),
                        ("validate", 1.2),
                        ("verify", 1.0),
                        ("audit", 1.4),
                        ("lgtm", 1.0),
                    ],
                },
            ],
        }
    }

    /// Complexity model over ordinal classes {simple, complex, multistep}
    pub fn complexity() -> Self {
        Self {
            classes: vec![
                ClassWeights {
                    label: "simple",
                    bias: 0.6,
                    keywords: &[
                        ("typo", 1.2),
                        ("rename", 0.8),
                        ("small", 0.9),
                        ("single", 0.8),
                        ("one line", 1.2),
                        ("hello", 0.6),
                    ],
                },
                ClassWeights {
                    label: "complex",
                    bias: -0.1,
                    keywords: &[
                        ("refactor", 1.2),
                        ("implement", 1.1),
                        ("feature", 1.0),
                        ("integrate", 1.2),
                        ("migrate", 1.2),
                        ("endpoint", 0.8),
                    ],
                },
                ClassWeights {
                    label: "multistep",
                    bias: -0.4,
                    keywords: &[
                        ("reorganize", 1.8),
                        ("restructure", 1.8),
                        ("across", 1.0),
                        ("entire", 1.1),
                        ("all the", 0.9),
                        ("multiple", 1.0),
                        ("pipeline", 1.0),
                        ("rewrite", 1.3),
                        (" and then ", 1.2),
                    ],
                },
            ],
        }
    }
}

impl EmbeddedModel for LexicalModel {
    fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();

        let scores: Vec<(String, f32)> = self
            .classes
            .iter()
            .map(|class| {
                let mut score = class.bias;
                for (keyword, weight) in class.keywords {
                    if lower.contains(keyword) {
                        score += weight;
                    }
                }
                (class.label.to_string(), score)
            })
            .collect();

        // Softmax over class scores
        let max = scores.iter().map(|(_, s)| *s).fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<(String, f32)> = scores.into_iter().map(|(l, s)| (l, (s - max).exp())).collect();
        let sum: f32 = exp.iter().map(|(_, e)| *e).sum();

        let probs: HashMap<String, f32> = exp.into_iter().map(|(l, e)| (l, e / sum)).collect();
        let label = probs
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(l, _)| l.clone())
            .unwrap_or_default();

        Classification { label, probs }
    }
}
