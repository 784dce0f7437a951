//! # Risk Weights
//!
//! Per-domain multipliers that amplify a raw assessment value into a score.
//!
//! - Weights are stored per-mille (`1.2` is `1200`)
//! - The table is immutable once built; overrides produce a new table
//! - Domains without an entry use `DEFAULT_WEIGHT_PER_MILLE` (1.0)

use crate::primitives::{DEFAULT_WEIGHT_PER_MILLE, MAX_WEIGHT_PER_MILLE, WEIGHT_DIGITS};
use crate::types::decimal;
use crate::{Domain, PostureError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single risk weight in per-mille.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskWeight(u32);

impl RiskWeight {
    /// The default weight (1.0).
    pub const DEFAULT: RiskWeight = RiskWeight(DEFAULT_WEIGHT_PER_MILLE);

    /// Build from per-mille, rejecting zero and values above the maximum.
    pub fn from_per_mille(per_mille: u32) -> Option<Self> {
        (per_mille > 0 && per_mille <= MAX_WEIGHT_PER_MILLE).then_some(Self(per_mille))
    }

    /// Parse decimal text such as `"1.25"` for the given domain.
    pub fn parse(domain: &str, text: &str) -> Result<Self, PostureError> {
        let invalid = |reason: &str| PostureError::InvalidWeight {
            domain: domain.to_string(),
            reason: reason.to_string(),
        };

        let per_mille = decimal::parse_scaled(text, WEIGHT_DIGITS)
            .ok_or_else(|| invalid("not a non-negative decimal"))?;
        u32::try_from(per_mille)
            .ok()
            .and_then(Self::from_per_mille)
            .ok_or_else(|| invalid("must be greater than 0 and at most 10"))
    }

    #[must_use]
    pub const fn per_mille(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RiskWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&decimal::format_scaled(u64::from(self.0), WEIGHT_DIGITS))
    }
}

/// The standard weight table.
const STANDARD_WEIGHTS: [(Domain, u32); 12] = [
    (Domain::AccessControl, 1_200),
    (Domain::IdentityManagement, 1_100),
    (Domain::NetworkSecurity, 1_300),
    (Domain::MonitoringDetection, 1_200),
    (Domain::VulnerabilityManagement, 1_400),
    (Domain::PolicyCompliance, 1_000),
    (Domain::AuditAssurance, 1_000),
    (Domain::RiskManagement, 1_300),
    (Domain::BusinessContinuity, 1_100),
    (Domain::IncidentResponse, 1_200),
    (Domain::DataPrivacy, 1_300),
    (Domain::DevSecOps, 1_200),
];

/// Immutable mapping from domain to risk weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskWeights {
    table: BTreeMap<Domain, RiskWeight>,
}

impl RiskWeights {
    /// The standard twelve-domain table.
    #[must_use]
    pub fn standard() -> Self {
        let table = STANDARD_WEIGHTS
            .into_iter()
            .map(|(domain, per_mille)| (domain, RiskWeight(per_mille)))
            .collect();
        Self { table }
    }

    /// Return a copy of this table with `domain` set to `weight`.
    ///
    /// Unknown domains may be given a weight too.
    #[must_use]
    pub fn with_override(mut self, domain: Domain, weight: RiskWeight) -> Self {
        self.table.insert(domain, weight);
        self
    }

    /// Weight for a domain, falling back to the default weight.
    #[must_use]
    pub fn weight(&self, domain: &Domain) -> RiskWeight {
        self.table.get(domain).copied().unwrap_or(RiskWeight::DEFAULT)
    }

    /// Whether the domain has an explicit entry.
    #[must_use]
    pub fn contains(&self, domain: &Domain) -> bool {
        self.table.contains_key(domain)
    }

    /// Iterate entries in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&Domain, RiskWeight)> {
        self.table.iter().map(|(d, w)| (d, *w))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// TESTS
// =============================================================================
