//! # posture-core
//!
//! The deterministic scoring engine for Posture - THE LOGIC.
//!
//! This crate turns a table of compliance-control self-assessments into an
//! annotated table: a weighted score, remediation text and an Eisenhower
//! priority per row, plus aggregate insights over the result.
//!
//! ## Layout
//!
//! - `types` and `primitives`: labels, values, rows, errors and constants
//! - `weights` and `score`: the domain risk-weight table and the score formula
//! - `classifier`: rule-based remediation and priority
//! - `advisory`: prompt and reply handling for generated remediation
//! - `pipeline`: validation and row-wise annotation
//! - `insights`: domain means, heatmap, weakest domains, riskiest controls
//! - `formats`: CSV tables and the text summary
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Integer arithmetic only; the same input always yields the same output
//! - Never mutates its inputs

// =============================================================================
// MODULES
// =============================================================================

pub mod advisory;
pub mod classifier;
pub mod formats;
pub mod insights;
pub mod pipeline;
pub mod primitives;
pub mod score;
pub mod types;
pub mod weights;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ALL_PRIORITIES, AnnotatedAssessment, Assessment, AssessmentRecord, AssessmentValue, Domain,
    KNOWN_DOMAINS, PostureError, Priority, Score, Severity, Urgency,
};

// =============================================================================
// RE-EXPORTS: Scoring Engine
// =============================================================================

pub use classifier::{Classification, RemediationClassifier};
pub use pipeline::{Pipeline, validate_records};
pub use score::ScoreEngine;
pub use weights::{RiskWeight, RiskWeights};

// =============================================================================
// RE-EXPORTS: Generated Remediation
// =============================================================================

pub use advisory::{
    ChatMessage, ChatRole, FALLBACK_PRIORITY, ParsedReply, Recommendation,
    RecommendationSource, RemediationKey, build_prompt, parse_reply,
};

// =============================================================================
// RE-EXPORTS: Insights and Formats
// =============================================================================

pub use formats::{read_records, render_summary, write_annotated};
pub use insights::{
    DomainMean, HeatmapCell, InsightLimits, Insights, PriorityCounts, RiskyControl, RowFilter,
    Selection, filter_rows, remediation_suggestions,
};
