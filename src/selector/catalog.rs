//! Static model catalog
//!
//! Reported throughput and pricing for known model families, used as
//! scoring inputs alongside the execution history. Entries match by
//! substring so dated model ids resolve to their family.

/// Catalog entry for a model family
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    /// Substring matched against the model id
    pub family: &'static str,

    /// Reported output tokens per second
    pub tokens_per_sec: f64,

    /// USD per million input tokens
    pub cost_in_per_mtok: f64,

    /// USD per million output tokens
    pub cost_out_per_mtok: f64,
}

/// Known model families, most specific first
pub const CATALOG: &[ModelSpec] = &[
    ModelSpec {
        family: "opus",
        tokens_per_sec: 40.0,
        cost_in_per_mtok: 15.0,
        cost_out_per_mtok: 75.0,
    },
    ModelSpec {
        family: "sonnet",
        tokens_per_sec: 70.0,
        cost_in_per_mtok: 3.0,
        cost_out_per_mtok: 15.0,
    },
    ModelSpec {
        family: "haiku",
        tokens_per_sec: 120.0,
        cost_in_per_mtok: 0.8,
        cost_out_per_mtok: 4.0,
    },
    ModelSpec {
        family: "gpt-4o-mini",
        tokens_per_sec: 110.0,
        cost_in_per_mtok: 0.15,
        cost_out_per_mtok: 0.6,
    },
    ModelSpec {
        family: "gpt-4o",
        tokens_per_sec: 80.0,
        cost_in_per_mtok: 2.5,
        cost_out_per_mtok: 10.0,
    },
    ModelSpec {
        family: "qwen",
        tokens_per_sec: 60.0,
        cost_in_per_mtok: 0.0,
        cost_out_per_mtok: 0.0,
    },
    ModelSpec {
        family: "llama",
        tokens_per_sec: 55.0,
        cost_in_per_mtok: 0.0,
        cost_out_per_mtok: 0.0,
    },
];

/// Spec used when a model is not in the catalog
pub const UNKNOWN_SPEC: ModelSpec = ModelSpec {
    family: "",
    tokens_per_sec: 50.0,
    cost_in_per_mtok: 3.0,
    cost_out_per_mtok: 15.0,
};

/// Look up a model id, falling back to sensible middle-ground numbers
pub fn lookup(model: &str) -> &'static ModelSpec {
    let lower = model.to_lowercase();
    CATALOG
        .iter()
        .find(|spec| lower.contains(spec.family))
        .unwrap_or(&UNKNOWN_SPEC)
}
