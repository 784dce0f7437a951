//! # Scoring Primitives
//!
//! Hardcoded runtime constants for the Posture CORE.
//!
//! These primitives are compiled into the binary and are immutable at runtime.
//! Only the per-domain risk weights may be overridden (see `weights`).
//!
//! ## Primitives
//!
//! 1. **Scale Primitive**: fixed-point scales for values, weights and means.
//! 2. **Threshold Primitive**: score bands that drive remediation and severity.
//! 3. **Remediation Primitive**: canned rule-based remediation texts.
//! 4. **Validation Primitive**: input limits.

// =============================================================================
// FIXED-POINT SCALES
// =============================================================================

/// Fractional digits kept for assessment values (millionths).
pub const VALUE_DIGITS: u32 = 6;

/// Scale of an assessment value: `1.0` is `VALUE_SCALE`.
pub const VALUE_SCALE: u64 = 1_000_000;

/// Fractional digits kept for risk weights (per-mille).
pub const WEIGHT_DIGITS: u32 = 3;

/// Scale of a risk weight: `1.0` is `WEIGHT_SCALE`.
pub const WEIGHT_SCALE: u64 = 1_000;

/// Default weight for domains without a table entry (1.0).
pub const DEFAULT_WEIGHT_PER_MILLE: u32 = 1_000;

/// Largest accepted risk weight (10.0).
pub const MAX_WEIGHT_PER_MILLE: u32 = 10_000;

/// Points on the score scale for a value of `1.0` at weight `1.0`.
pub const SCORE_POINTS: u64 = 100;

/// Upper end of the nominal score scale.
pub const SCORE_SCALE_MAX: u32 = 100;

// =============================================================================
// THRESHOLDS
// =============================================================================

/// Scores below this are high severity and get domain-specific guidance.
pub const SEVERITY_THRESHOLD: u32 = 60;

/// Scores at or above this are considered performing well.
pub const HEALTHY_THRESHOLD: u32 = 80;

/// Scores below this are listed as risky controls and remediation suggestions.
pub const RISKY_THRESHOLD: u32 = 70;

/// Default number of risky controls in an insights summary.
pub const DEFAULT_RISKY_LIMIT: usize = 5;

/// Default number of weakest domains in an insights summary.
pub const DEFAULT_WEAKEST_LIMIT: usize = 3;

// =============================================================================
// REMEDIATION TEXTS
// =============================================================================

pub const REMEDIATION_ACCESS_CONTROL: &str =
    "Enforce least privilege and automate quarterly access reviews.";

pub const REMEDIATION_DEVSECOPS: &str =
    "Integrate security scanning tools into your CI/CD pipeline.";

pub const REMEDIATION_NETWORK_SECURITY: &str =
    "Segment networks and review firewall configurations.";

pub const REMEDIATION_GENERIC_WEAK: &str = "Review and strengthen controls in this domain.";

pub const REMEDIATION_REVIEW: &str =
    "Review documentation, training, and automation in this area.";

pub const REMEDIATION_HEALTHY: &str = "Control performing well. Maintain current processes.";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for any text column of an input row.
///
/// Rows with longer fields are rejected during validation.
pub const MAX_FIELD_LENGTH: usize = 1024;

/// Maximum number of rows in a single table.
///
/// Larger tables are rejected to bound memory and generative-call fan-out.
pub const MAX_ROWS: usize = 10_000;
