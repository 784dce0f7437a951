//! # Pipeline Module
//!
//! Row-wise annotation of an assessment table.
//!
//! - Validate raw records into assessments (fail fast, 1-based row numbers)
//! - Score each row, then classify it
//! - Produce a new table; inputs are never mutated
//!
//! Rows are independent, so the result does not depend on processing order.

use crate::classifier::RemediationClassifier;
use crate::primitives::MAX_ROWS;
use crate::score::ScoreEngine;
use crate::{AnnotatedAssessment, Assessment, AssessmentRecord, Domain, PostureError};
use std::collections::BTreeSet;

/// Validate a table of raw records.
///
/// # Errors
/// - `PostureError::TooManyRows` above `MAX_ROWS`
/// - `PostureError::InvalidRow` wrapping the first row error
pub fn validate_records(records: &[AssessmentRecord]) -> Result<Vec<Assessment>, PostureError> {
    if records.len() > MAX_ROWS {
        return Err(PostureError::TooManyRows(records.len(), MAX_ROWS));
    }

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            record.validate().map_err(|e| PostureError::InvalidRow {
                row: i + 1,
                source: Box::new(e),
            })
        })
        .collect()
}

/// The deterministic annotation pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    engine: ScoreEngine,
}

impl Pipeline {
    #[must_use]
    pub fn new(engine: ScoreEngine) -> Self {
        Self { engine }
    }

    #[must_use]
    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    /// Annotate a single assessment with the rule-based classifier.
    #[must_use]
    pub fn annotate_one(&self, assessment: &Assessment) -> AnnotatedAssessment {
        let score = self.engine.score(&assessment.domain, assessment.value);
        let classification =
            RemediationClassifier::classify(&assessment.domain, score, assessment.urgency);

        AnnotatedAssessment::from_parts(
            assessment.clone(),
            score,
            classification.remediation,
            classification.priority,
        )
    }

    /// Annotate a table, preserving row order.
    #[must_use]
    pub fn annotate(&self, assessments: &[Assessment]) -> Vec<AnnotatedAssessment> {
        assessments.iter().map(|a| self.annotate_one(a)).collect()
    }

    /// Validate and annotate raw records.
    pub fn annotate_records(
        &self,
        records: &[AssessmentRecord],
    ) -> Result<Vec<AnnotatedAssessment>, PostureError> {
        let assessments = validate_records(records)?;
        Ok(self.annotate(&assessments))
    }

    /// Recompute an annotated table from its input columns only.
    ///
    /// Prior `Score`, `Remediation` and `Priority` values are ignored.
    #[must_use]
    pub fn reannotate(&self, rows: &[AnnotatedAssessment]) -> Vec<AnnotatedAssessment> {
        rows.iter()
            .map(|row| self.annotate_one(&row.assessment()))
            .collect()
    }

    /// Domains in the table that fall back to the default weight.
    #[must_use]
    pub fn unweighted_domains(&self, assessments: &[Assessment]) -> BTreeSet<String> {
        assessments
            .iter()
            .map(|a| &a.domain)
            .filter(|d| !self.engine.weights().contains(d))
            .map(Domain::to_string)
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Priority, Score, Urgency};

    fn record(control: &str, domain: &str, value: &str, urgency: &str) -> AssessmentRecord {
        AssessmentRecord::new(control, domain, "NIST CSF", value).with_urgency(urgency)
    }

    #[test]
    fn annotate_records_in_order() {
        let pipeline = Pipeline::default();
        let rows = pipeline
            .annotate_records(&[
                record("AC-1", "Access Control", "0.40", "High"),
                record("PC-1", "Policy Compliance", "0.75", "Low"),
                record("XX-1", "Unknown Domain", "0.90", "High"),
            ])
            .expect("annotate");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].control, "AC-1");
        assert_eq!(rows[0].score, Score(48));
        assert_eq!(rows[0].priority, Priority::DoFirst);
        assert_eq!(rows[1].score, Score(75));
        assert_eq!(rows[1].priority, Priority::Eliminate);
        assert_eq!(rows[2].score, Score(90));
        assert_eq!(rows[2].priority, Priority::Delegate);
    }

    #[test]
    fn invalid_row_reports_position() {
        let pipeline = Pipeline::default();
        let mut bad = record("AC-2", "Access Control", "0.4", "Low");
        bad.value = None;

        let err = pipeline
            .annotate_records(&[record("AC-1", "Access Control", "0.4", "Low"), bad])
            .expect_err("should fail");

        match err {
            PostureError::InvalidRow { row, source } => {
                assert_eq!(row, 2);
                assert!(matches!(*source, PostureError::MissingField("Value")));
            }
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_oversized_tables() {
        let records = vec![AssessmentRecord::default(); MAX_ROWS + 1];
        assert!(matches!(
            validate_records(&records),
            Err(PostureError::TooManyRows(_, _))
        ));
    }

    #[test]
    fn reannotate_is_idempotent() {
        let pipeline = Pipeline::default();
        let rows = pipeline
            .annotate_records(&[
                record("AC-1", "Access Control", "0.40", "High"),
                record("DS-1", "DevSecOps", "0.2", "Low"),
            ])
            .expect("annotate");

        let mut tampered = rows.clone();
        tampered[0].score = Score(99);
        tampered[0].remediation = "stale".into();
        tampered[1].priority = Priority::Eliminate;

        assert_eq!(pipeline.reannotate(&tampered), rows);
    }

    #[test]
    fn annotation_ignores_row_order() {
        let pipeline = Pipeline::default();
        let a = record("A", "Data Privacy", "0.3", "High").validate().expect("a");
        let b = record("B", "Risk Management", "0.7", "Low").validate().expect("b");

        let forward = pipeline.annotate(&[a.clone(), b.clone()]);
        let backward = pipeline.annotate(&[b, a]);

        assert_eq!(forward[0], backward[1]);
        assert_eq!(forward[1], backward[0]);
    }

    #[test]
    fn reports_unweighted_domains() {
        let pipeline = Pipeline::default();
        let assessments = validate_records(&[
            record("A", "Access Control", "0.3", "Low"),
            record("B", "Physical Security", "0.3", "Low"),
            record("C", "Physical Security", "0.5", "Low"),
        ])
        .expect("valid");

        let unknown = pipeline.unweighted_domains(&assessments);
        assert_eq!(unknown.len(), 1);
        assert!(unknown.contains("Physical Security"));
    }

    #[test]
    fn default_urgency_is_low() {
        let pipeline = Pipeline::default();
        let assessment = AssessmentRecord::new("A", "Access Control", "ISO", "0.1")
            .validate()
            .expect("valid");
        let row = pipeline.annotate_one(&assessment);
        assert_eq!(row.urgency, Urgency::Low);
        assert_eq!(row.priority, Priority::Schedule);
    }
}
