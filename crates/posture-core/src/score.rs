//! # Score Engine
//!
//! Maps `(Domain, Value)` to a weighted compliance score.
//!
//! ```text
//! Score = round_half_up(Value * 100 * weight(Domain))
//! ```
//!
//! Values are millionths and weights per-mille, so the product is exact:
//! `0.40 * 100 * 1.2` is `48`, never `48.00000000000001`.

use crate::primitives::{SCORE_POINTS, VALUE_SCALE, WEIGHT_SCALE};
use crate::weights::{RiskWeight, RiskWeights};
use crate::{AssessmentRecord, AssessmentValue, Domain, PostureError, Score};

/// Divisor that brings `millionths * per_mille * points` back to points.
const SCORE_DIVISOR: u64 = VALUE_SCALE * WEIGHT_SCALE / SCORE_POINTS;

/// Pure score computation over an immutable weight table.
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    weights: RiskWeights,
    clamp: bool,
}

impl ScoreEngine {
    /// Engine over a weight table. Scores are not clamped.
    #[must_use]
    pub fn new(weights: RiskWeights) -> Self {
        Self {
            weights,
            clamp: false,
        }
    }

    /// Enable or disable clamping scores to the 0-100 scale.
    #[must_use]
    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    #[must_use]
    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    #[must_use]
    pub fn clamps(&self) -> bool {
        self.clamp
    }

    /// Risk weight applied to a domain.
    #[must_use]
    pub fn weight_for(&self, domain: &Domain) -> RiskWeight {
        self.weights.weight(domain)
    }

    /// Compute the score for a domain and value.
    #[must_use]
    pub fn score(&self, domain: &Domain, value: AssessmentValue) -> Score {
        let weight = u64::from(self.weight_for(domain).per_mille());
        let product = u64::from(value.millionths()).saturating_mul(weight);
        let rounded = product.saturating_add(SCORE_DIVISOR / 2) / SCORE_DIVISOR;

        let score = Score(u32::try_from(rounded).unwrap_or(u32::MAX));
        if self.clamp { score.clamped() } else { score }
    }

    /// Compute the score for a raw record.
    ///
    /// Returns `PostureError::MissingField` if `Domain` or `Value` is absent,
    /// and `PostureError::InvalidValue` if the value does not parse.
    pub fn score_record(&self, record: &AssessmentRecord) -> Result<Score, PostureError> {
        let domain = record
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(PostureError::MissingField("Domain"))?;
        let value = record
            .value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(PostureError::MissingField("Value"))?;

        let value = AssessmentValue::parse(value)?;
        Ok(self.score(&Domain::parse(domain), value))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> AssessmentValue {
        AssessmentValue::parse(text).expect("value")
    }

    #[test]
    fn divisor_is_ten_million() {
        assert_eq!(SCORE_DIVISOR, 10_000_000);
    }

    #[test]
    fn weighted_scores() {
        let engine = ScoreEngine::default();
        assert_eq!(
            engine.score(&Domain::AccessControl, value("0.40")),
            Score(48)
        );
        assert_eq!(
            engine.score(&Domain::PolicyCompliance, value("0.75")),
            Score(75)
        );
        assert_eq!(
            engine.score(&Domain::Other("Unknown Domain".into()), value("0.90")),
            Score(90)
        );
        assert_eq!(
            engine.score(&Domain::NetworkSecurity, value("0.5")),
            Score(65)
        );
    }

    #[test]
    fn rounds_half_up() {
        let engine = ScoreEngine::default();
        assert_eq!(
            engine.score(&Domain::PolicyCompliance, value("0.125")),
            Score(13)
        );
        assert_eq!(
            engine.score(&Domain::PolicyCompliance, value("0.124")),
            Score(12)
        );
        // 0.375 * 100 * 1.2 = 45.0
        assert_eq!(
            engine.score(&Domain::AccessControl, value("0.375")),
            Score(45)
        );
    }

    #[test]
    fn unclamped_can_exceed_scale() {
        let engine = ScoreEngine::default();
        let score = engine.score(&Domain::VulnerabilityManagement, value("1.0"));
        assert_eq!(score, Score(140));
        assert!(score.exceeds_scale());
    }

    #[test]
    fn clamped_engine_caps_at_100() {
        let engine = ScoreEngine::default().with_clamp(true);
        assert!(engine.clamps());
        assert_eq!(
            engine.score(&Domain::VulnerabilityManagement, value("1.0")),
            Score(100)
        );
        assert_eq!(
            engine.score(&Domain::AccessControl, value("0.40")),
            Score(48)
        );
    }

    #[test]
    fn zero_value_scores_zero() {
        let engine = ScoreEngine::default();
        assert_eq!(engine.score(&Domain::DataPrivacy, value("0")), Score(0));
    }

    #[test]
    fn score_record_requires_domain_and_value() {
        let engine = ScoreEngine::default();

        let mut record = AssessmentRecord::new("AC-1", "Access Control", "ISO", "0.4");
        assert_eq!(engine.score_record(&record).expect("score"), Score(48));

        record.domain = None;
        assert!(matches!(
            engine.score_record(&record),
            Err(PostureError::MissingField("Domain"))
        ));

        let mut record = AssessmentRecord::new("AC-1", "Access Control", "ISO", "");
        assert!(matches!(
            engine.score_record(&record),
            Err(PostureError::MissingField("Value"))
        ));

        record.value = Some("lots".to_string());
        assert!(matches!(
            engine.score_record(&record),
            Err(PostureError::InvalidValue(_))
        ));
    }

    #[test]
    fn custom_weights_apply() {
        let weights = RiskWeights::standard().with_override(
            Domain::PolicyCompliance,
            RiskWeight::parse("Policy Compliance", "0.5").expect("weight"),
        );
        let engine = ScoreEngine::new(weights);
        assert_eq!(
            engine.score(&Domain::PolicyCompliance, value("0.8")),
            Score(40)
        );
    }
}
