//! # Assessor
//!
//! Application-level entry point for annotating a table.
//!
//! - Validates raw records (core pipeline)
//! - Applies framework/domain filters before any network call
//! - Scores and classifies with the rule-based strategy
//! - Optionally replaces remediation and priority with generated ones
//!
//! Unknown domains and scores above 100 are logged, never rejected.

use crate::config::PostureConfig;
use crate::generative::{
    ChatClient, CompletionBackend, RemediationError, RemediationService, ServicePolicy,
};
use posture_core::{
    AnnotatedAssessment, Assessment, AssessmentRecord, Pipeline, PostureError, Recommendation,
    RemediationKey, RowFilter, validate_records,
};
use std::sync::Arc;

/// Annotates assessment tables.
pub struct Assessor<B = ChatClient> {
    pipeline: Pipeline,
    advisor: Option<Arc<RemediationService<B>>>,
}

impl Assessor<ChatClient> {
    /// Build from configuration.
    ///
    /// A generative client that cannot be built is logged and left out; rows
    /// requested with generation then fall back.
    pub fn from_config(config: &PostureConfig) -> Result<Self, PostureError> {
        let assessor = Self::new(Pipeline::new(config.score_engine()?));

        match ChatClient::from_config(&config.generative) {
            Ok(client) => {
                if !client.has_api_key() {
                    tracing::debug!(
                        endpoint = client.endpoint(),
                        "No completion API key configured"
                    );
                }
                let policy = ServicePolicy::from(&config.generative);
                Ok(assessor.with_advisor(RemediationService::new(client, policy)))
            }
            Err(e) => {
                tracing::warn!("Generative remediation unavailable: {}", e);
                Ok(assessor)
            }
        }
    }
}

impl<B: CompletionBackend> Assessor<B> {
    /// Rule-based only.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            advisor: None,
        }
    }

    /// Attach a generated-remediation service.
    #[must_use]
    pub fn with_advisor(mut self, service: RemediationService<B>) -> Self {
        self.advisor = Some(Arc::new(service));
        self
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    #[must_use]
    pub fn advisor(&self) -> Option<&Arc<RemediationService<B>>> {
        self.advisor.as_ref()
    }

    /// Validate records and keep those matching the filter.
    pub fn prepare(
        &self,
        records: &[AssessmentRecord],
        filter: &RowFilter,
    ) -> Result<Vec<Assessment>, PostureError> {
        let assessments = validate_records(records)?;

        for domain in self.pipeline.unweighted_domains(&assessments) {
            tracing::warn!(domain = %domain, "Unknown domain, using default weight 1.0");
        }

        if filter.is_empty() {
            return Ok(assessments);
        }
        Ok(assessments
            .into_iter()
            .filter(|a| filter.matches(&a.framework, &a.domain))
            .collect())
    }

    /// Validate, filter and annotate a table.
    pub async fn assess(
        &self,
        records: &[AssessmentRecord],
        filter: &RowFilter,
        generative: bool,
    ) -> Result<Vec<AnnotatedAssessment>, PostureError> {
        let assessments = self.prepare(records, filter)?;
        let mut rows = self.pipeline.annotate(&assessments);

        for row in rows.iter().filter(|r| r.score.exceeds_scale()) {
            tracing::info!(
                control = %row.control,
                score = row.score.value(),
                "Score exceeds the 0-100 scale"
            );
        }

        if generative {
            self.apply_generated(&mut rows).await;
        }

        tracing::info!(rows = rows.len(), generative, "Assessment complete");
        Ok(rows)
    }

    /// Annotate one record.
    pub async fn classify(
        &self,
        record: &AssessmentRecord,
        generative: bool,
    ) -> Result<AnnotatedAssessment, PostureError> {
        let mut rows = self
            .assess(std::slice::from_ref(record), &RowFilter::default(), generative)
            .await?;
        rows.pop()
            .ok_or_else(|| PostureError::SerializationError("No row produced".to_string()))
    }

    /// Replace remediation and priority with generated values.
    async fn apply_generated(&self, rows: &mut [AnnotatedAssessment]) {
        let recommendations: Vec<Recommendation> = match &self.advisor {
            Some(service) => {
                let keys: Vec<RemediationKey> = rows
                    .iter()
                    .map(|r| RemediationKey::new(r.control.clone(), r.domain.clone(), r.score))
                    .collect();
                service.recommend_all(&keys).await
            }
            None => {
                let reason = RemediationError::NotConfigured("no completion client".to_string());
                tracing::warn!("{}", reason);
                rows.iter()
                    .map(|_| Recommendation::fallback(&reason))
                    .collect()
            }
        };

        let fallbacks = recommendations.iter().filter(|r| r.is_fallback()).count();
        if fallbacks > 0 {
            tracing::warn!(
                fallbacks,
                total = rows.len(),
                "Some rows use fallback remediation"
            );
        }

        for (row, recommendation) in rows.iter_mut().zip(recommendations) {
            row.remediation = recommendation.text;
            row.priority = recommendation.priority;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::{ChatMessage, Priority, Score};

    struct FixedBackend(&'static str);

    impl CompletionBackend for FixedBackend {
        async fn complete(&self, _messages: Vec<ChatMessage>) -> Result<String, RemediationError> {
            Ok(self.0.to_string())
        }
    }

    fn records() -> Vec<AssessmentRecord> {
        vec![
            AssessmentRecord::new("AC-1", "Access Control", "NIST", "0.40").with_urgency("High"),
            AssessmentRecord::new("PC-1", "Policy Compliance", "ISO", "0.75"),
        ]
    }

    #[tokio::test]
    async fn rule_based_assessment() {
        let assessor: Assessor<FixedBackend> = Assessor::new(Pipeline::default());
        let rows = assessor
            .assess(&records(), &RowFilter::default(), false)
            .await
            .expect("assess");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].score, Score(48));
        assert_eq!(rows[0].priority, Priority::DoFirst);
    }

    #[tokio::test]
    async fn filter_applies_before_annotation() {
        let assessor: Assessor<FixedBackend> = Assessor::new(Pipeline::default());
        let rows = assessor
            .assess(&records(), &RowFilter::new(Some("ISO"), None), false)
            .await
            .expect("assess");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].control, "PC-1");
    }

    #[tokio::test]
    async fn generated_remediation_replaces_rule_based() {
        let assessor = Assessor::new(Pipeline::default()).with_advisor(RemediationService::new(
            FixedBackend("Recommendation: Rotate keys.\nPriority: Delegate"),
            ServicePolicy::default(),
        ));
        let rows = assessor
            .assess(&records(), &RowFilter::default(), true)
            .await
            .expect("assess");

        assert!(rows.iter().all(|r| r.remediation == "Rotate keys."));
        assert!(rows.iter().all(|r| r.priority == Priority::Delegate));
        assert_eq!(rows[0].score, Score(48));
    }

    #[tokio::test]
    async fn generative_without_client_falls_back() {
        let assessor: Assessor<FixedBackend> = Assessor::new(Pipeline::default());
        let row = assessor
            .classify(&records()[0], true)
            .await
            .expect("classify");

        assert_eq!(row.priority, Priority::Schedule);
        assert!(row.remediation.contains("error"));
    }

    #[tokio::test]
    async fn invalid_rows_are_rejected() {
        let assessor: Assessor<FixedBackend> = Assessor::new(Pipeline::default());
        let mut bad = records();
        bad[1].domain = None;

        let err = assessor
            .assess(&bad, &RowFilter::default(), false)
            .await
            .expect_err("should fail");
        assert!(matches!(err, PostureError::InvalidRow { row: 2, .. }));
    }
}
