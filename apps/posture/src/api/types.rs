//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. Rows use the same column names as CSV
//! tables (`Control`, `Domain`, ...); lowercase names are accepted on input.

use posture_core::{AnnotatedAssessment, AssessmentRecord, InsightLimits, Insights, ScoreEngine};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// WEIGHTS RESPONSE
// =============================================================================

/// One row of the weight table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub domain: String,
    /// Decimal weight, e.g. `"1.2"`.
    pub weight: String,
    pub per_mille: u32,
}

/// Effective weight table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsResponse {
    pub weights: Vec<WeightEntry>,
    /// Weight applied to domains missing from the table.
    pub default_weight: String,
    pub clamp: bool,
}

impl From<&ScoreEngine> for WeightsResponse {
    fn from(engine: &ScoreEngine) -> Self {
        Self {
            weights: engine
                .weights()
                .iter()
                .map(|(domain, weight)| WeightEntry {
                    domain: domain.to_string(),
                    weight: weight.to_string(),
                    per_mille: weight.per_mille(),
                })
                .collect(),
            default_weight: posture_core::RiskWeight::DEFAULT.to_string(),
            clamp: engine.clamps(),
        }
    }
}

// =============================================================================
// ASSESS REQUEST/RESPONSE
// =============================================================================

/// Table annotation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessRequest {
    pub rows: Vec<AssessmentRecord>,
    #[serde(default)]
    pub generative: bool,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Table annotation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessResponse {
    pub success: bool,
    pub rows: Vec<AnnotatedAssessment>,
    pub error: Option<String>,
}

impl AssessResponse {
    pub fn success(rows: Vec<AnnotatedAssessment>) -> Self {
        Self {
            success: true,
            rows,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            rows: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// INSIGHTS REQUEST/RESPONSE
// =============================================================================

/// Insights request: raw rows plus optional filters and list length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightsRequest {
    pub rows: Vec<AssessmentRecord>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    /// Length of the riskiest-controls and weakest-domains lists.
    #[serde(default)]
    pub top: Option<usize>,
}

impl InsightsRequest {
    /// List limits, falling back to the defaults.
    pub fn limits(&self) -> InsightLimits {
        let defaults = InsightLimits::default();
        InsightLimits {
            risky_controls: self.top.unwrap_or(defaults.risky_controls),
            weakest_domains: self.top.unwrap_or(defaults.weakest_domains),
        }
    }
}

/// Insights response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub success: bool,
    pub insights: Option<Insights>,
    pub error: Option<String>,
}

impl InsightsResponse {
    pub fn success(insights: Insights) -> Self {
        Self {
            success: true,
            insights: Some(insights),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            insights: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CLASSIFY REQUEST/RESPONSE
// =============================================================================

/// Single-row request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifyRequest {
    #[serde(flatten)]
    pub record: AssessmentRecord,
    #[serde(default)]
    pub generative: bool,
}

/// Single-row response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub success: bool,
    pub row: Option<AnnotatedAssessment>,
    pub error: Option<String>,
}

impl ClassifyResponse {
    pub fn success(row: AnnotatedAssessment) -> Self {
        Self {
            success: true,
            row: Some(row),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            row: None,
            error: Some(msg.into()),
        }
    }
}
