//! # Core Type Definitions
//!
//! This module contains all core types for the Posture scoring substrate:
//! - Categorical labels (`Domain`, `Urgency`, `Severity`, `Priority`)
//! - Numeric values (`AssessmentValue`, `Score`)
//! - Row representations (`AssessmentRecord`, `Assessment`, `AnnotatedAssessment`)
//! - Error types (`PostureError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they are used as `BTreeMap` keys
//! - Are immutable once constructed from validated input

pub mod decimal;

use crate::primitives::{MAX_FIELD_LENGTH, VALUE_DIGITS, VALUE_SCALE};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

// =============================================================================
// DOMAIN
// =============================================================================

/// Control domain.
///
/// Twelve domains carry a dedicated risk weight. Any other label is kept
/// verbatim in `Other` and scored with the default weight.
///
/// Equality, ordering and hashing ignore ASCII case of `Other` labels, so
/// `Physical Security` and `physical security` are the same domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Domain {
    AccessControl,
    IdentityManagement,
    NetworkSecurity,
    MonitoringDetection,
    VulnerabilityManagement,
    PolicyCompliance,
    AuditAssurance,
    RiskManagement,
    BusinessContinuity,
    IncidentResponse,
    DataPrivacy,
    DevSecOps,
    /// Open fallback for unrecognized domain labels.
    Other(String),
}

/// Every domain with a dedicated risk weight.
pub const KNOWN_DOMAINS: [Domain; 12] = [
    Domain::AccessControl,
    Domain::IdentityManagement,
    Domain::NetworkSecurity,
    Domain::MonitoringDetection,
    Domain::VulnerabilityManagement,
    Domain::PolicyCompliance,
    Domain::AuditAssurance,
    Domain::RiskManagement,
    Domain::BusinessContinuity,
    Domain::IncidentResponse,
    Domain::DataPrivacy,
    Domain::DevSecOps,
];

impl Domain {
    /// Parse a domain label.
    ///
    /// Known names match case-insensitively after trimming; anything else
    /// becomes `Domain::Other` with the trimmed label.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        KNOWN_DOMAINS
            .iter()
            .find(|d| d.name().eq_ignore_ascii_case(label))
            .cloned()
            .unwrap_or_else(|| Domain::Other(label.to_string()))
    }

    /// Display name of the domain.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Domain::AccessControl => "Access Control",
            Domain::IdentityManagement => "Identity Management",
            Domain::NetworkSecurity => "Network Security",
            Domain::MonitoringDetection => "Monitoring & Detection",
            Domain::VulnerabilityManagement => "Vulnerability Management",
            Domain::PolicyCompliance => "Policy Compliance",
            Domain::AuditAssurance => "Audit & Assurance",
            Domain::RiskManagement => "Risk Management",
            Domain::BusinessContinuity => "Business Continuity",
            Domain::IncidentResponse => "Incident Response",
            Domain::DataPrivacy => "Data Privacy",
            Domain::DevSecOps => "DevSecOps",
            Domain::Other(name) => name.as_str(),
        }
    }

    /// Whether this domain has a dedicated entry in the standard weight table.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Domain::Other(_))
    }

    /// Position in `KNOWN_DOMAINS`; `Other` sorts last.
    fn rank(&self) -> usize {
        match self {
            Domain::AccessControl => 0,
            Domain::IdentityManagement => 1,
            Domain::NetworkSecurity => 2,
            Domain::MonitoringDetection => 3,
            Domain::VulnerabilityManagement => 4,
            Domain::PolicyCompliance => 5,
            Domain::AuditAssurance => 6,
            Domain::RiskManagement => 7,
            Domain::BusinessContinuity => 8,
            Domain::IncidentResponse => 9,
            Domain::DataPrivacy => 10,
            Domain::DevSecOps => 11,
            Domain::Other(_) => KNOWN_DOMAINS.len(),
        }
    }

    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        let label = match self {
            Domain::Other(name) => name.as_str(),
            _ => "",
        };
        label.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Domain {}

impl PartialOrd for Domain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Domain {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.folded().cmp(other.folded()))
    }
}

impl Hash for Domain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.rank());
        for b in self.folded() {
            state.write_u8(b);
        }
        state.write_u8(0xff);
    }
}

impl From<String> for Domain {
    fn from(label: String) -> Self {
        Domain::parse(&label)
    }
}

impl From<&str> for Domain {
    fn from(label: &str) -> Self {
        Domain::parse(label)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.name().to_string()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// URGENCY / SEVERITY / PRIORITY
// =============================================================================

/// Externally supplied urgency flag. Absent urgency is `Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Urgency {
    High,
    #[default]
    Low,
}

impl Urgency {
    /// Parse an urgency label (case-insensitive). Blank input is `Low`.
    pub fn parse(label: &str) -> Result<Self, PostureError> {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("low") {
            Ok(Urgency::Low)
        } else if label.eq_ignore_ascii_case("high") {
            Ok(Urgency::High)
        } else {
            Err(PostureError::InvalidUrgency(label.to_string()))
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Urgency::High => "High",
            Urgency::Low => "Low",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity derived from a score: `High` below the severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    High,
    Low,
}

impl Severity {
    /// Severity of a score.
    #[must_use]
    pub fn from_score(score: Score) -> Self {
        if score.value() < crate::primitives::SEVERITY_THRESHOLD {
            Severity::High
        } else {
            Severity::Low
        }
    }
}

/// Eisenhower quadrant used to order remediation work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Do First")]
    DoFirst,
    Schedule,
    Delegate,
    Eliminate,
}

/// All quadrants, in matrix order.
pub const ALL_PRIORITIES: [Priority; 4] = [
    Priority::DoFirst,
    Priority::Schedule,
    Priority::Delegate,
    Priority::Eliminate,
];

impl Priority {
    /// Combine severity and urgency into a quadrant.
    ///
    /// | severity \ urgency | High     | Low       |
    /// |--------------------|----------|-----------|
    /// | High               | Do First | Schedule  |
    /// | Low                | Delegate | Eliminate |
    #[must_use]
    pub fn from_quadrant(severity: Severity, urgency: Urgency) -> Self {
        match (severity, urgency) {
            (Severity::High, Urgency::High) => Priority::DoFirst,
            (Severity::High, Urgency::Low) => Priority::Schedule,
            (Severity::Low, Urgency::High) => Priority::Delegate,
            (Severity::Low, Urgency::Low) => Priority::Eliminate,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Priority::DoFirst => "Do First",
            Priority::Schedule => "Schedule",
            Priority::Delegate => "Delegate",
            Priority::Eliminate => "Eliminate",
        }
    }

    /// Lenient parse for free-text priorities.
    ///
    /// Case-insensitive; `-` and `_` count as spaces and trailing
    /// punctuation is ignored, so `"do-first."` is `DoFirst`.
    #[must_use]
    pub fn parse_loose(text: &str) -> Option<Self> {
        let normalized: String = text
            .trim()
            .trim_end_matches(['.', '!', '*'])
            .trim_start_matches('*')
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        ALL_PRIORITIES
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(&normalized))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// NUMERIC VALUES
// =============================================================================

/// Normalized assessment value in `[0, 1]`, stored as millionths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssessmentValue(u32);

impl AssessmentValue {
    /// Build from millionths. Returns `None` above `1.0`.
    #[must_use]
    pub fn from_millionths(millionths: u32) -> Option<Self> {
        (u64::from(millionths) <= VALUE_SCALE).then_some(Self(millionths))
    }

    /// Parse decimal text such as `"0.40"`.
    pub fn parse(text: &str) -> Result<Self, PostureError> {
        decimal::parse_scaled(text, VALUE_DIGITS)
            .and_then(|m| u32::try_from(m).ok())
            .and_then(Self::from_millionths)
            .ok_or_else(|| PostureError::InvalidValue(text.trim().to_string()))
    }

    /// Raw value in millionths.
    #[must_use]
    pub const fn millionths(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AssessmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&decimal::format_scaled(u64::from(self.0), VALUE_DIGITS))
    }
}

impl Serialize for AssessmentValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssessmentValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = deserializer
            .deserialize_any(TextVisitor)?
            .ok_or_else(|| de::Error::custom("missing assessment value"))?;
        AssessmentValue::parse(&text).map_err(de::Error::custom)
    }
}

/// Weighted compliance score.
///
/// Normally in `[0, 100]`; high values in heavily weighted domains can
/// exceed 100 unless the engine clamps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Score(pub u32);

impl Score {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Score above the nominal 0-100 scale.
    #[must_use]
    pub const fn exceeds_scale(self) -> bool {
        self.0 > crate::primitives::SCORE_SCALE_MAX
    }

    /// Score limited to the nominal scale.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self(self.0.min(crate::primitives::SCORE_SCALE_MAX))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ROWS
// =============================================================================

/// A raw input row, before validation.
///
/// Every column is optional so that missing columns surface as
/// `PostureError::MissingField` instead of a parse failure. Numbers are
/// accepted wherever text is expected. Previously computed `Score`,
/// `Remediation` and `Priority` columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssessmentRecord {
    #[serde(default, alias = "Control", deserialize_with = "lenient_text")]
    pub control: Option<String>,
    #[serde(default, alias = "Domain", deserialize_with = "lenient_text")]
    pub domain: Option<String>,
    #[serde(default, alias = "Framework", deserialize_with = "lenient_text")]
    pub framework: Option<String>,
    #[serde(default, alias = "Value", deserialize_with = "lenient_text")]
    pub value: Option<String>,
    #[serde(default, alias = "Urgency", deserialize_with = "lenient_text")]
    pub urgency: Option<String>,
}

impl AssessmentRecord {
    /// Record with the four required columns set.
    #[must_use]
    pub fn new(
        control: impl Into<String>,
        domain: impl Into<String>,
        framework: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            control: Some(control.into()),
            domain: Some(domain.into()),
            framework: Some(framework.into()),
            value: Some(value.into()),
            urgency: None,
        }
    }

    #[must_use]
    pub fn with_urgency(mut self, urgency: impl Into<String>) -> Self {
        self.urgency = Some(urgency.into());
        self
    }

    /// Validate into a typed `Assessment`.
    ///
    /// - `Control`, `Domain`, `Framework`, `Value` must be present and non-blank
    /// - Text fields must fit in `MAX_FIELD_LENGTH`
    /// - `Value` must be a decimal in `[0, 1]`
    /// - `Urgency` must be `High`, `Low` or blank
    pub fn validate(&self) -> Result<Assessment, PostureError> {
        let control = required(&self.control, "Control")?;
        let domain = required(&self.domain, "Domain")?;
        let framework = required(&self.framework, "Framework")?;
        let value = required(&self.value, "Value")?;

        let value = AssessmentValue::parse(value)?;
        let urgency = match self.urgency.as_deref() {
            Some(u) => Urgency::parse(u)?,
            None => Urgency::default(),
        };

        Ok(Assessment {
            control: control.to_string(),
            domain: Domain::parse(domain),
            framework: framework.to_string(),
            value,
            urgency,
        })
    }
}

impl From<&Assessment> for AssessmentRecord {
    fn from(a: &Assessment) -> Self {
        Self {
            control: Some(a.control.clone()),
            domain: Some(a.domain.name().to_string()),
            framework: Some(a.framework.clone()),
            value: Some(a.value.to_string()),
            urgency: Some(a.urgency.name().to_string()),
        }
    }
}

/// Fetch a required, non-blank, length-bounded text column.
fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, PostureError> {
    let text = field
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(PostureError::MissingField(name))?;

    if text.len() > MAX_FIELD_LENGTH {
        return Err(PostureError::FieldTooLong {
            field: name,
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(text)
}

/// A validated control assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub control: String,
    pub domain: Domain,
    pub framework: String,
    pub value: AssessmentValue,
    pub urgency: Urgency,
}

impl Assessment {
    #[must_use]
    pub fn new(
        control: impl Into<String>,
        domain: Domain,
        framework: impl Into<String>,
        value: AssessmentValue,
        urgency: Urgency,
    ) -> Self {
        Self {
            control: control.into(),
            domain,
            framework: framework.into(),
            value,
            urgency,
        }
    }
}

/// An assessment enriched with score, remediation and priority.
///
/// Flat so that it maps one-to-one onto an exported CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnnotatedAssessment {
    pub control: String,
    pub domain: Domain,
    pub framework: String,
    pub value: AssessmentValue,
    pub urgency: Urgency,
    pub score: Score,
    pub remediation: String,
    pub priority: Priority,
}

impl AnnotatedAssessment {
    /// Attach derived columns to an assessment.
    #[must_use]
    pub fn from_parts(
        assessment: Assessment,
        score: Score,
        remediation: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            control: assessment.control,
            domain: assessment.domain,
            framework: assessment.framework,
            value: assessment.value,
            urgency: assessment.urgency,
            score,
            remediation: remediation.into(),
            priority,
        }
    }

    /// The input columns of this row, without the derived ones.
    #[must_use]
    pub fn assessment(&self) -> Assessment {
        Assessment {
            control: self.control.clone(),
            domain: self.domain.clone(),
            framework: self.framework.clone(),
            value: self.value,
            urgency: self.urgency,
        }
    }
}

// =============================================================================
// LENIENT TEXT DESERIALIZATION
// =============================================================================

/// Accepts strings, numbers, booleans and null as optional text.
struct TextVisitor;

impl<'de> de::Visitor<'de> for TextVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, a number or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    // Shortest round-trip formatting keeps `0.4` as "0.4".
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(TextVisitor)
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    deserializer.deserialize_any(TextVisitor)
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Posture system.
///
/// - No silent failures
/// - Use `Result<T, PostureError>` for fallible operations
/// - The CORE never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum PostureError {
    /// A required column is absent or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The assessment value is not a decimal in [0, 1].
    #[error("Invalid assessment value '{0}': expected a decimal between 0 and 1")]
    InvalidValue(String),

    /// The urgency label is neither High nor Low.
    #[error("Invalid urgency '{0}': expected High or Low")]
    InvalidUrgency(String),

    /// A configured risk weight is malformed or out of range.
    #[error("Invalid risk weight for '{domain}': {reason}")]
    InvalidWeight { domain: String, reason: String },

    /// A text field exceeds the maximum length.
    #[error("Field {field} exceeds maximum length of {max} bytes")]
    FieldTooLong { field: &'static str, max: usize },

    /// The table has more rows than allowed.
    #[error("Row count {0} exceeds maximum {1}")]
    TooManyRows(usize, usize),

    /// A specific row failed validation (1-based row number).
    #[error("Row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: Box<PostureError>,
    },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parse_known_case_insensitive() {
        assert_eq!(Domain::parse("Access Control"), Domain::AccessControl);
        assert_eq!(Domain::parse("  devsecops "), Domain::DevSecOps);
        assert_eq!(
            Domain::parse("monitoring & detection"),
            Domain::MonitoringDetection
        );
    }

    #[test]
    fn domain_parse_unknown_keeps_label() {
        let domain = Domain::parse(" Unknown Domain ");
        assert_eq!(domain, Domain::Other("Unknown Domain".to_string()));
        assert!(!domain.is_known());
        assert_eq!(domain.name(), "Unknown Domain");
    }

    #[test]
    fn unknown_domains_ignore_case() {
        use std::collections::{BTreeSet, HashSet};

        let a = Domain::parse("Physical Security");
        let b = Domain::parse("physical SECURITY");
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(b.name(), "physical SECURITY");
        assert_ne!(a, Domain::parse("Physical Safety"));

        let hashed: HashSet<Domain> = [a.clone(), b.clone()].into_iter().collect();
        assert_eq!(hashed.len(), 1);
        let ordered: BTreeSet<Domain> = [b, Domain::DevSecOps, a].into_iter().collect();
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered.first(), Some(&Domain::DevSecOps));
    }

    #[test]
    fn known_domain_names_round_trip() {
        for domain in KNOWN_DOMAINS {
            assert_eq!(Domain::parse(domain.name()), domain);
        }
    }

    #[test]
    fn urgency_parse() {
        assert_eq!(Urgency::parse("High").expect("high"), Urgency::High);
        assert_eq!(Urgency::parse("low").expect("low"), Urgency::Low);
        assert_eq!(Urgency::parse("").expect("blank"), Urgency::Low);
        assert!(matches!(
            Urgency::parse("urgent"),
            Err(PostureError::InvalidUrgency(_))
        ));
    }

    #[test]
    fn severity_threshold_boundary() {
        assert_eq!(Severity::from_score(Score(59)), Severity::High);
        assert_eq!(Severity::from_score(Score(60)), Severity::Low);
    }

    #[test]
    fn priority_quadrants() {
        assert_eq!(
            Priority::from_quadrant(Severity::High, Urgency::High),
            Priority::DoFirst
        );
        assert_eq!(
            Priority::from_quadrant(Severity::High, Urgency::Low),
            Priority::Schedule
        );
        assert_eq!(
            Priority::from_quadrant(Severity::Low, Urgency::High),
            Priority::Delegate
        );
        assert_eq!(
            Priority::from_quadrant(Severity::Low, Urgency::Low),
            Priority::Eliminate
        );
    }

    #[test]
    fn priority_parse_loose() {
        assert_eq!(Priority::parse_loose("Do First"), Some(Priority::DoFirst));
        assert_eq!(Priority::parse_loose("do-first."), Some(Priority::DoFirst));
        assert_eq!(Priority::parse_loose("**SCHEDULE**"), Some(Priority::Schedule));
        assert_eq!(Priority::parse_loose("  delegate "), Some(Priority::Delegate));
        assert_eq!(Priority::parse_loose("urgent"), None);
        assert_eq!(Priority::parse_loose(""), None);
    }

    #[test]
    fn assessment_value_bounds() {
        assert_eq!(
            AssessmentValue::parse("0.40").expect("parse").millionths(),
            400_000
        );
        assert!(AssessmentValue::parse("1.0").is_ok());
        assert!(matches!(
            AssessmentValue::parse("1.01"),
            Err(PostureError::InvalidValue(_))
        ));
        assert!(AssessmentValue::parse("-0.1").is_err());
        assert!(AssessmentValue::from_millionths(1_000_001).is_none());
    }

    #[test]
    fn score_scale() {
        assert!(!Score(100).exceeds_scale());
        assert!(Score(101).exceeds_scale());
        assert_eq!(Score(140).clamped(), Score(100));
        assert_eq!(Score(40).clamped(), Score(40));
    }

    #[test]
    fn record_validate_success() {
        let record =
            AssessmentRecord::new("AC-2", "Access Control", "NIST", "0.40").with_urgency("High");
        let assessment = record.validate().expect("valid");

        assert_eq!(assessment.control, "AC-2");
        assert_eq!(assessment.domain, Domain::AccessControl);
        assert_eq!(assessment.value.millionths(), 400_000);
        assert_eq!(assessment.urgency, Urgency::High);
    }

    #[test]
    fn record_validate_missing_fields() {
        let mut record = AssessmentRecord::new("AC-2", "Access Control", "NIST", "0.4");
        record.value = None;
        assert!(matches!(
            record.validate(),
            Err(PostureError::MissingField("Value"))
        ));

        let mut record = AssessmentRecord::new("AC-2", "Access Control", "NIST", "0.4");
        record.domain = Some("   ".to_string());
        assert!(matches!(
            record.validate(),
            Err(PostureError::MissingField("Domain"))
        ));
    }

    #[test]
    fn record_validate_defaults_urgency() {
        let record = AssessmentRecord::new("AC-2", "Access Control", "NIST", "0.4");
        assert_eq!(record.validate().expect("valid").urgency, Urgency::Low);
    }

    #[test]
    fn record_validate_rejects_long_field() {
        let long = "x".repeat(MAX_FIELD_LENGTH + 1);
        let record = AssessmentRecord::new(long, "Access Control", "NIST", "0.4");
        assert!(matches!(
            record.validate(),
            Err(PostureError::FieldTooLong {
                field: "Control",
                ..
            })
        ));
    }

    #[test]
    fn annotated_round_trips_assessment() {
        let assessment = AssessmentRecord::new("AC-2", "Access Control", "NIST", "0.4")
            .validate()
            .expect("valid");
        let annotated = AnnotatedAssessment::from_parts(
            assessment.clone(),
            Score(48),
            "text",
            Priority::Schedule,
        );
        assert_eq!(annotated.assessment(), assessment);
    }
}
