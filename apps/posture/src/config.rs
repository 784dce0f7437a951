//! # Configuration
//!
//! `posture.toml` loading and environment overrides.
//!
//! ```toml
//! [scoring]
//! clamp = false
//!
//! [scoring.weights]
//! "Access Control" = 1.25
//!
//! [generative]
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-4o-mini"
//! max_tokens = 200
//! timeout_secs = 30
//! max_retries = 2
//! backoff_ms = 250
//! concurrency = 4
//! breaker_threshold = 5
//! breaker_cooldown_secs = 30
//! cache_capacity = 1024
//! ```
//!
//! Every section and key is optional. Weights may be written as numbers or
//! strings and are converted to per-mille without float arithmetic.
//!
//! ## Environment
//!
//! - `POSTURE_LLM_API_KEY`: bearer token for the completion service
//!   (takes precedence over `generative.api_key`)

use posture_core::{Domain, PostureError, RiskWeight, RiskWeights, ScoreEngine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "posture.toml";

/// Environment variable holding the completion-service API key.
pub const LLM_API_KEY_ENV: &str = "POSTURE_LLM_API_KEY";

// =============================================================================
// TOP-LEVEL CONFIG
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    pub scoring: ScoringConfig,
    pub generative: GenerativeConfig,
}

impl PostureConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, PostureError> {
        toml::from_str(content)
            .map_err(|e| PostureError::SerializationError(format!("Invalid config: {e}")))
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, PostureError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PostureError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `posture.toml` in the
    /// working directory is used if present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, PostureError> {
        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "Loading config");
            return Self::from_file(path);
        }

        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            tracing::debug!(path = DEFAULT_CONFIG_FILE, "Loading config");
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Score engine with configured weight overrides and clamping.
    pub fn score_engine(&self) -> Result<ScoreEngine, PostureError> {
        Ok(ScoreEngine::new(self.scoring.risk_weights()?).with_clamp(self.scoring.clamp))
    }
}

// =============================================================================
// SCORING
// =============================================================================

/// A weight as written in TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightSetting {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl WeightSetting {
    fn to_text(&self) -> String {
        match self {
            WeightSetting::Integer(i) => i.to_string(),
            // Shortest round-trip formatting: 1.25 stays "1.25"
            WeightSetting::Float(f) => f.to_string(),
            WeightSetting::Text(s) => s.clone(),
        }
    }
}

/// `[scoring]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Clamp scores to 0-100.
    pub clamp: bool,
    /// Per-domain weight overrides, keyed by domain label.
    pub weights: BTreeMap<String, WeightSetting>,
}

impl ScoringConfig {
    /// The standard weight table with overrides applied.
    pub fn risk_weights(&self) -> Result<RiskWeights, PostureError> {
        self.weights
            .iter()
            .try_fold(RiskWeights::standard(), |table, (label, setting)| {
                let weight = RiskWeight::parse(label, &setting.to_text())?;
                Ok(table.with_override(Domain::parse(label), weight))
            })
    }
}

// =============================================================================
// GENERATIVE
// =============================================================================

/// `[generative]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerativeConfig {
    /// Chat-completion endpoint (OpenAI-compatible).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// API key; `POSTURE_LLM_API_KEY` wins when set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt, for transient failures only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base retry delay in milliseconds, doubled per attempt.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Maximum requests in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Consecutive failed rows before remaining rows fall back immediately.
    /// 0 disables the breaker.
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,

    /// Seconds an open breaker waits before letting one trial request through.
    #[serde(default = "default_breaker_cooldown_secs")]
    pub breaker_cooldown_secs: u64,

    /// Maximum cached recommendations, oldest evicted first. 0 disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            concurrency: default_concurrency(),
            breaker_threshold: default_breaker_threshold(),
            breaker_cooldown_secs: default_breaker_cooldown_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl GenerativeConfig {
    /// API key from the environment, else from the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(LLM_API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    250
}

fn default_concurrency() -> usize {
    4
}

fn default_breaker_threshold() -> u32 {
    5
}

fn default_breaker_cooldown_secs() -> u64 {
    30
}

fn default_cache_capacity() -> usize {
    1_024
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::{AssessmentValue, Score};
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = PostureConfig::default();
        assert!(!config.scoring.clamp);
        assert!(config.scoring.weights.is_empty());
        assert_eq!(config.generative.model, "gpt-4o-mini");
        assert_eq!(config.generative.max_tokens, 200);
        assert_eq!(config.generative.timeout(), Duration::from_secs(30));
        assert_eq!(config.generative.max_retries, 2);
        assert_eq!(config.generative.concurrency, 4);
        assert_eq!(config.generative.breaker_threshold, 5);
        assert_eq!(config.generative.breaker_cooldown(), Duration::from_secs(30));
        assert_eq!(config.generative.cache_capacity, 1_024);
    }

    #[test]
    fn empty_document_is_default() {
        let config = PostureConfig::from_toml("").expect("parse");
        assert_eq!(config.generative.backoff(), Duration::from_millis(250));
    }

    #[test]
    fn partial_sections() {
        let config = PostureConfig::from_toml(
            r#"
[scoring]
clamp = true

[generative]
model = "local-model"
max_retries = 0
"#,
        )
        .expect("parse");

        assert!(config.scoring.clamp);
        assert_eq!(config.generative.model, "local-model");
        assert_eq!(config.generative.max_retries, 0);
        assert_eq!(config.generative.timeout_secs, 30);
    }

    #[test]
    fn weight_overrides_in_any_notation() {
        let config = PostureConfig::from_toml(
            r#"
[scoring.weights]
"Access Control" = 1.25
"policy compliance" = "0.5"
"Physical Security" = 2
"#,
        )
        .expect("parse");

        let weights = config.scoring.risk_weights().expect("weights");
        assert_eq!(weights.weight(&Domain::AccessControl).per_mille(), 1_250);
        assert_eq!(weights.weight(&Domain::PolicyCompliance).per_mille(), 500);
        assert_eq!(
            weights
                .weight(&Domain::parse("Physical Security"))
                .per_mille(),
            2_000
        );
        assert_eq!(weights.weight(&Domain::DevSecOps).per_mille(), 1_200);
    }

    #[test]
    fn invalid_weight_is_rejected() {
        let config = PostureConfig::from_toml(
            r#"
[scoring.weights]
"Access Control" = -1
"#,
        )
        .expect("parse");
        assert!(matches!(
            config.scoring.risk_weights(),
            Err(PostureError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn malformed_toml_is_serialization_error() {
        assert!(matches!(
            PostureConfig::from_toml("[scoring\nclamp = "),
            Err(PostureError::SerializationError(_))
        ));
    }

    #[test]
    fn engine_uses_overrides_and_clamp() {
        let config = PostureConfig::from_toml(
            r#"
[scoring]
clamp = true
[scoring.weights]
"Policy Compliance" = 2.0
"#,
        )
        .expect("parse");

        let engine = config.score_engine().expect("engine");
        let value = AssessmentValue::parse("0.9").expect("value");
        assert_eq!(engine.score(&Domain::PolicyCompliance, value), Score(100));
    }

    #[test]
    fn unknown_domain_override_matches_any_case() {
        let config = PostureConfig::from_toml(
            r#"
[scoring.weights]
"physical security" = 2
"#,
        )
        .expect("parse");

        let engine = config.score_engine().expect("engine");
        let value = AssessmentValue::parse("0.4").expect("value");
        assert_eq!(
            engine.score(&Domain::parse("Physical Security"), value),
            Score(80)
        );
    }

    #[test]
    fn load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[generative]\nmodel = \"from-file\"").expect("write");

        let config = PostureConfig::load(Some(file.path())).expect("load");
        assert_eq!(config.generative.model, "from-file");
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            PostureConfig::load(Some(&missing)),
            Err(PostureError::IoError(_))
        ));
    }
}
