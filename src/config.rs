//! Setup types and loading
//!
//! The setup is loaded once by the driver and passed into the engine by
//! value; nothing in the engine reaches back into a global store.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main setup, persisted at `~/.chuchu/setup.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Setup {
    /// Configured LLM backends; the first is the default
    pub backends: Vec<BackendConfig>,

    /// Per-agent-role model overrides (role -> backend/model pair)
    pub agent_models: HashMap<String, ModelRef>,

    /// Classifier thresholds
    pub classifier: ClassifierConfig,

    /// Conductor retry behavior
    pub conductor: ConductorConfig,

    /// Verification behavior
    pub verify: VerifyConfig,

    /// Model selection scoring
    pub selector: SelectorConfig,

    /// Persisted state locations
    pub storage: StorageConfig,
}

impl Setup {
    /// Load setup with fallback chain: explicit path, project-local
    /// `.chuchu.yaml`, then `~/.chuchu/setup.yaml`, then defaults.
    pub fn load(setup_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = setup_path {
            return Self::load_from_file(path).context(format!("Failed to load setup from {}", path.display()));
        }

        let local = PathBuf::from(".chuchu.yaml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(setup) => return Ok(setup),
                Err(e) => {
                    tracing::warn!("Failed to load setup from {}: {}", local.display(), e);
                }
            }
        }

        if let Some(home) = dirs::home_dir() {
            let user = home.join(".chuchu").join("setup.yaml");
            if user.exists() {
                match Self::load_from_file(&user) {
                    Ok(setup) => return Ok(setup),
                    Err(e) => {
                        tracing::warn!("Failed to load setup from {}: {}", user.display(), e);
                    }
                }
            }
        }

        tracing::info!("No setup file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read setup file")?;
        let setup: Self = serde_yaml::from_str(&content).context("Failed to parse setup file")?;
        tracing::info!("Loaded setup from: {}", path.as_ref().display());
        Ok(setup)
    }

    /// The default backend (first configured, or the built-in Anthropic one)
    pub fn default_backend(&self) -> BackendConfig {
        self.backends.first().cloned().unwrap_or_default()
    }

    /// Find a backend by name
    pub fn backend(&self, name: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// The configured default (backend, model) pair for an agent role
    pub fn default_pair_for(&self, role: &str) -> ModelRef {
        if let Some(pair) = self.agent_models.get(role) {
            return pair.clone();
        }
        let backend = self.default_backend();
        ModelRef {
            backend: backend.name.clone(),
            model: backend.default_model.clone(),
        }
    }
}

/// A (backend, model) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub backend: String,
    pub model: String,
}

/// One configured LLM backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackendConfig {
    /// Backend name used in history records and recommendations
    pub name: String,

    /// Provider kind: "anthropic" or "openai" (-compatible)
    pub provider: String,

    /// API base URL
    pub base_url: String,

    /// Environment variable containing the API key
    pub api_key_env: String,

    /// Default model when no history or override applies
    pub default_model: String,

    /// Models available on this backend (for retry recommendations)
    pub models: Vec<String>,

    /// Maximum tokens per response
    pub max_tokens: u32,

    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: "anthropic".to_string(),
            provider: "anthropic".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            default_model: "claude-sonnet-4-20250514".to_string(),
            models: vec![
                "claude-sonnet-4-20250514".to_string(),
                "claude-3-5-haiku-20241022".to_string(),
            ],
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }
}

/// Classifier thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClassifierConfig {
    /// Minimum embedded-model confidence to skip the LLM fallback (intent)
    pub intent_threshold: f32,

    /// Minimum embedded-model confidence to skip the LLM fallback (complexity)
    pub complexity_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            intent_threshold: 0.7,
            complexity_threshold: 0.55,
        }
    }
}

/// Conductor retry behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConductorConfig {
    /// Verified attempts per step before giving up
    pub max_attempts: u32,

    /// Soft cap per conductor attempt in milliseconds
    pub attempt_timeout_ms: u64,

    /// Timeout for a single shell command run by the editor
    pub command_timeout_ms: u64,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_ms: 300_000,
            command_timeout_ms: 600_000,
        }
    }
}

/// Verification behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VerifyConfig {
    /// Per-verifier timeout in milliseconds
    pub timeout_ms: u64,

    /// Lint command; lint never runs unless this is set
    pub lint_command: Option<String>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 600_000,
            lint_command: None,
        }
    }
}

/// Model selection scoring weights and retry behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// Weight of historical success rate (dominant)
    pub success_weight: f64,

    /// Weight of cost per million tokens (secondary)
    pub cost_weight: f64,

    /// Weight of observed p50 latency
    pub latency_weight: f64,

    /// Weight of catalog tokens-per-second
    pub throughput_weight: f64,

    /// Score boost for switching backends on retry
    pub different_backend_boost: f64,

    /// How many recent attempts of the same task exclude a failing pair
    pub retry_window: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            success_weight: 0.55,
            cost_weight: 0.20,
            latency_weight: 0.15,
            throughput_weight: 0.10,
            different_backend_boost: 0.1,
            retry_window: 5,
        }
    }
}

/// Persisted state locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Override for the state directory (defaults to `~/.chuchu`)
    pub home_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// The state directory under the user home
    pub fn home(&self) -> PathBuf {
        if let Some(dir) = &self.home_dir {
            return dir.clone();
        }
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".chuchu")
    }

    /// Path of the execution history log
    pub fn history_file(&self) -> PathBuf {
        self.home().join("history.jsonl")
    }

    /// Directory holding symphony state files
    pub fn symphonies_dir(&self) -> PathBuf {
        self.home().join("symphonies")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_setup() {
        let setup = Setup::default();

        assert!(setup.backends.is_empty());
        assert_eq!(setup.classifier.intent_threshold, 0.7);
        assert_eq!(setup.classifier.complexity_threshold, 0.55);
        assert_eq!(setup.conductor.max_attempts, 3);
        assert!(setup.verify.lint_command.is_none());
    }

    #[test]
    fn test_default_backend_when_unconfigured() {
        let setup = Setup::default();
        let backend = setup.default_backend();
        assert_eq!(backend.name, "anthropic");
        assert_eq!(backend.provider, "anthropic");
    }

    #[test]
    fn test_default_pair_for_respects_overrides() {
        let mut setup = Setup::default();
        setup.agent_models.insert(
            "editor".to_string(),
            ModelRef {
                backend: "local".to_string(),
                model: "qwen-coder".to_string(),
            },
        );

        let pair = setup.default_pair_for("editor");
        assert_eq!(pair.backend, "local");
        assert_eq!(pair.model, "qwen-coder");

        let pair = setup.default_pair_for("query");
        assert_eq!(pair.backend, "anthropic");
    }

    #[test]
    fn test_deserialize_setup() {
        let yaml = r#"
backends:
  - name: anthropic
    provider: anthropic
    base-url: https://api.anthropic.com
    api-key-env: ANTHROPIC_API_KEY
    default-model: claude-sonnet-4-20250514
  - name: local
    provider: openai
    base-url: http://localhost:8080
    api-key-env: LOCAL_API_KEY
    default-model: qwen-coder

classifier:
  intent-threshold: 0.8

conductor:
  max-attempts: 5
"#;

        let setup: Setup = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(setup.backends.len(), 2);
        assert_eq!(setup.backends[1].name, "local");
        assert_eq!(setup.backends[1].provider, "openai");
        assert_eq!(setup.classifier.intent_threshold, 0.8);
        // Unset fields keep defaults
        assert_eq!(setup.classifier.complexity_threshold, 0.55);
        assert_eq!(setup.conductor.max_attempts, 5);
        assert_eq!(setup.selector.retry_window, 5);
    }

    #[test]
    fn test_storage_paths() {
        let storage = StorageConfig {
            home_dir: Some(PathBuf::from("/tmp/chuchu-test")),
        };
        assert_eq!(storage.history_file(), PathBuf::from("/tmp/chuchu-test/history.jsonl"));
        assert_eq!(storage.symphonies_dir(), PathBuf::from("/tmp/chuchu-test/symphonies"));
    }
}
