//! # Remediation Classifier
//!
//! Rule-based remediation text and Eisenhower priority.
//!
//! - Text depends on the score band and, for weak scores, the domain
//! - Severity is `High` below `SEVERITY_THRESHOLD`
//! - Priority combines severity with the supplied urgency
//!
//! This is the deterministic reference strategy; generated remediation
//! (see `advisory`) must fall back to values of the same shape.

use crate::primitives::{
    HEALTHY_THRESHOLD, REMEDIATION_ACCESS_CONTROL, REMEDIATION_DEVSECOPS,
    REMEDIATION_GENERIC_WEAK, REMEDIATION_HEALTHY, REMEDIATION_NETWORK_SECURITY,
    REMEDIATION_REVIEW, SEVERITY_THRESHOLD,
};
use crate::{Domain, Priority, Score, Severity, Urgency};
use serde::Serialize;

/// Output of the classifier for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub remediation: &'static str,
    pub severity: Severity,
    pub priority: Priority,
}

/// The rule-based remediation classifier.
pub struct RemediationClassifier;

impl RemediationClassifier {
    /// Remediation text for a domain and score.
    #[must_use]
    pub fn remediation(domain: &Domain, score: Score) -> &'static str {
        let score = score.value();
        if score < SEVERITY_THRESHOLD {
            match domain {
                Domain::AccessControl => REMEDIATION_ACCESS_CONTROL,
                Domain::DevSecOps => REMEDIATION_DEVSECOPS,
                Domain::NetworkSecurity => REMEDIATION_NETWORK_SECURITY,
                _ => REMEDIATION_GENERIC_WEAK,
            }
        } else if score < HEALTHY_THRESHOLD {
            REMEDIATION_REVIEW
        } else {
            REMEDIATION_HEALTHY
        }
    }

    /// Eisenhower priority for a score and urgency.
    #[must_use]
    pub fn priority(score: Score, urgency: Urgency) -> Priority {
        Priority::from_quadrant(Severity::from_score(score), urgency)
    }

    /// Classify one row.
    #[must_use]
    pub fn classify(domain: &Domain, score: Score, urgency: Urgency) -> Classification {
        let severity = Severity::from_score(score);
        Classification {
            remediation: Self::remediation(domain, score),
            severity,
            priority: Priority::from_quadrant(severity, urgency),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_scores_get_domain_guidance() {
        assert_eq!(
            RemediationClassifier::remediation(&Domain::AccessControl, Score(48)),
            REMEDIATION_ACCESS_CONTROL
        );
        assert_eq!(
            RemediationClassifier::remediation(&Domain::DevSecOps, Score(10)),
            REMEDIATION_DEVSECOPS
        );
        assert_eq!(
            RemediationClassifier::remediation(&Domain::NetworkSecurity, Score(59)),
            REMEDIATION_NETWORK_SECURITY
        );
        assert_eq!(
            RemediationClassifier::remediation(&Domain::DataPrivacy, Score(30)),
            REMEDIATION_GENERIC_WEAK
        );
        assert_eq!(
            RemediationClassifier::remediation(&Domain::Other("X".into()), Score(0)),
            REMEDIATION_GENERIC_WEAK
        );
    }

    #[test]
    fn middle_band_ignores_domain() {
        for domain in [Domain::AccessControl, Domain::DevSecOps, Domain::RiskManagement] {
            assert_eq!(
                RemediationClassifier::remediation(&domain, Score(60)),
                REMEDIATION_REVIEW
            );
            assert_eq!(
                RemediationClassifier::remediation(&domain, Score(79)),
                REMEDIATION_REVIEW
            );
        }
    }

    #[test]
    fn healthy_band() {
        assert_eq!(
            RemediationClassifier::remediation(&Domain::AccessControl, Score(80)),
            REMEDIATION_HEALTHY
        );
        assert_eq!(
            RemediationClassifier::remediation(&Domain::AccessControl, Score(140)),
            REMEDIATION_HEALTHY
        );
    }

    #[test]
    fn priority_table() {
        assert_eq!(
            RemediationClassifier::priority(Score(48), Urgency::High),
            Priority::DoFirst
        );
        assert_eq!(
            RemediationClassifier::priority(Score(48), Urgency::Low),
            Priority::Schedule
        );
        assert_eq!(
            RemediationClassifier::priority(Score(90), Urgency::High),
            Priority::Delegate
        );
        assert_eq!(
            RemediationClassifier::priority(Score(75), Urgency::Low),
            Priority::Eliminate
        );
    }

    #[test]
    fn well_performing_never_do_first() {
        for score in 60..=150 {
            for urgency in [Urgency::High, Urgency::Low] {
                let p = RemediationClassifier::priority(Score(score), urgency);
                assert!(matches!(p, Priority::Delegate | Priority::Eliminate));
            }
        }
    }

    #[test]
    fn classify_is_deterministic() {
        let a = RemediationClassifier::classify(&Domain::AccessControl, Score(48), Urgency::High);
        let b = RemediationClassifier::classify(&Domain::AccessControl, Score(48), Urgency::High);
        assert_eq!(a, b);
        assert_eq!(a.severity, Severity::High);
        assert_eq!(a.priority, Priority::DoFirst);
    }
}
