//! Model selection
//!
//! Scores (backend, model) pairs from the execution history - success
//! rate dominant, then cost, latency, and catalog throughput - and
//! recommends a pair for an agent role, or a different pair after a
//! transient failure.

mod catalog;

pub use catalog::{CATALOG, ModelSpec, lookup};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::{ModelRef, SelectorConfig, Setup};
use crate::history::ExecutionRecord;

/// A scored (backend, model) suggestion
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub backend: String,
    pub model: String,
    pub score: f64,
    /// Short human-readable rationale for verbose logs
    pub reason: String,
}

/// Recommends (backend, model) pairs from history and the static catalog
pub struct ModelSelector {
    config: SelectorConfig,
}

impl ModelSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Initial selection for an agent role
    ///
    /// Falls back to the configured default pair when no history exists
    /// for any candidate.
    pub fn select_for_agent(&self, setup: &Setup, history: &[ExecutionRecord], role: &str) -> Recommendation {
        let role_records: Vec<&ExecutionRecord> = history.iter().filter(|r| r.agent_role == role).collect();

        let mut best: Option<(Recommendation, Option<DateTime<Utc>>)> = None;

        for pair in candidate_pairs(setup) {
            let records: Vec<&ExecutionRecord> = role_records
                .iter()
                .filter(|r| r.backend == pair.backend && r.model == pair.model)
                .copied()
                .collect();
            if records.is_empty() {
                continue;
            }

            let (score, reason) = self.score_pair(&records, &pair.model);
            let last_success = records.iter().filter(|r| r.success).map(|r| r.timestamp).max();
            debug!(backend = %pair.backend, model = %pair.model, score, "ModelSelector::select_for_agent: scored pair");

            let candidate = (
                Recommendation {
                    backend: pair.backend,
                    model: pair.model,
                    score,
                    reason,
                },
                last_success,
            );

            best = match best {
                None => Some(candidate),
                Some(current) => {
                    // Ties broken by most recent success
                    let newer = candidate.0.score > current.0.score
                        || (candidate.0.score == current.0.score && candidate.1 > current.1);
                    if newer { Some(candidate) } else { Some(current) }
                }
            };
        }

        match best {
            Some((recommendation, _)) => recommendation,
            None => {
                let pair = setup.default_pair_for(role);
                Recommendation {
                    backend: pair.backend,
                    model: pair.model,
                    score: 0.0,
                    reason: format!("no execution history for {}; backend default", role),
                }
            }
        }
    }

    /// Retry selection after the current pair failed
    ///
    /// Excludes the failing pair and any pair that failed for this task
    /// within the recent attempt window, and boosts a backend change.
    pub fn recommend_for_retry(
        &self,
        setup: &Setup,
        history: &[ExecutionRecord],
        role: &str,
        current_backend: &str,
        current_model: &str,
        task: &str,
    ) -> Vec<Recommendation> {
        let recent_task_failures: Vec<(&str, &str)> = history
            .iter()
            .filter(|r| r.task == task && !r.success)
            .rev()
            .take(self.config.retry_window)
            .map(|r| (r.backend.as_str(), r.model.as_str()))
            .collect();

        let role_records: Vec<&ExecutionRecord> = history.iter().filter(|r| r.agent_role == role).collect();

        let mut recommendations = Vec::new();
        for pair in candidate_pairs(setup) {
            if pair.backend == current_backend && pair.model == current_model {
                continue;
            }
            if recent_task_failures
                .iter()
                .any(|(b, m)| *b == pair.backend && *m == pair.model)
            {
                debug!(backend = %pair.backend, model = %pair.model, "ModelSelector::recommend_for_retry: excluded, failed this task recently");
                continue;
            }

            let records: Vec<&ExecutionRecord> = role_records
                .iter()
                .filter(|r| r.backend == pair.backend && r.model == pair.model)
                .copied()
                .collect();

            let (mut score, mut reason) = if records.is_empty() {
                (self.score_without_history(&pair.model), "untried pair".to_string())
            } else {
                self.score_pair(&records, &pair.model)
            };

            if pair.backend != current_backend {
                score += self.config.different_backend_boost;
                reason = format!("{}; different backend", reason);
            }

            recommendations.push(Recommendation {
                backend: pair.backend,
                model: pair.model,
                score,
                reason,
            });
        }

        recommendations.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        recommendations
    }

    /// Weighted score from history plus the static catalog
    fn score_pair(&self, records: &[&ExecutionRecord], model: &str) -> (f64, String) {
        let total = records.len() as f64;
        let successes = records.iter().filter(|r| r.success).count() as f64;
        let success_rate = successes / total;

        let p50 = percentile_latency(records, 0.5);
        let latency_score = 1.0 / (1.0 + p50 as f64 / 1000.0);

        let spec = lookup(model);
        let throughput_score = (spec.tokens_per_sec / 150.0).min(1.0);
        let cost_score = 1.0 / (1.0 + spec.cost_out_per_mtok / 10.0);

        let score = self.config.success_weight * success_rate
            + self.config.latency_weight * latency_score
            + self.config.throughput_weight * throughput_score
            + self.config.cost_weight * cost_score;

        let reason = format!(
            "{:.0}% success over {} runs, p50 {}ms",
            success_rate * 100.0,
            records.len(),
            p50
        );
        (score, reason)
    }

    /// Catalog-only score with a neutral success rate, for untried pairs
    fn score_without_history(&self, model: &str) -> f64 {
        let spec = lookup(model);
        let throughput_score = (spec.tokens_per_sec / 150.0).min(1.0);
        let cost_score = 1.0 / (1.0 + spec.cost_out_per_mtok / 10.0);

        self.config.success_weight * 0.5
            + self.config.latency_weight * 0.5
            + self.config.throughput_weight * throughput_score
            + self.config.cost_weight * cost_score
    }
}

/// Every (backend, model) pair a setup can serve, defaults first
fn candidate_pairs(setup: &Setup) -> Vec<ModelRef> {
    let mut pairs = Vec::new();
    for backend in &setup.backends {
        let mut models = vec![backend.default_model.clone()];
        for model in &backend.models {
            if !models.contains(model) {
                models.push(model.clone());
            }
        }
        for model in models {
            pairs.push(ModelRef {
                backend: backend.name.clone(),
                model,
            });
        }
    }
    if pairs.is_empty() {
        let backend = setup.default_backend();
        pairs.push(ModelRef {
            backend: backend.name.clone(),
            model: backend.default_model.clone(),
        });
    }
    pairs
}

/// Latency percentile over a record set, zero when empty
fn percentile_latency(records: &[&ExecutionRecord], p: f64) -> u64 {
    if records.is_empty() {
        return 0;
    }
    let mut latencies: Vec<u64> = records.iter().map(|r| r.latency_ms).collect();
    latencies.sort_unstable();
    let idx = ((latencies.len() as f64 - 1.0) * p).round() as usize;
    latencies[idx]
}
