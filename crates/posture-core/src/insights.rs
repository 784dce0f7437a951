//! # Insights Module
//!
//! Aggregate statistics over an annotated table.
//!
//! These feed dashboards and reports:
//! - Mean score per domain (radar view)
//! - Mean score per domain and framework (heatmap view)
//! - Weakest domains and riskiest controls
//! - Row counts per Eisenhower quadrant (matrix view)
//!
//! Means are fixed-point hundredths (`mean_centi`), rounded half-up, so that
//! `7533` means an average score of `75.33`.

use crate::primitives::{DEFAULT_RISKY_LIMIT, DEFAULT_WEAKEST_LIMIT, RISKY_THRESHOLD};
use crate::types::decimal;
use crate::{AnnotatedAssessment, Domain, Priority, Score};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// MEANS
// =============================================================================

/// Mean of scores in hundredths, rounded half-up. `None` if empty.
pub fn mean_centi(scores: impl IntoIterator<Item = Score>) -> Option<u64> {
    let (sum, count) = scores
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), s| {
            (sum.saturating_add(u64::from(s.value())), count + 1)
        });

    if count == 0 {
        return None;
    }
    Some((sum.saturating_mul(100).saturating_add(count / 2)) / count)
}

/// Render hundredths as a decimal, e.g. `7533` as `"75.33"` and `7500` as `"75.0"`.
#[must_use]
pub fn format_centi(centi: u64) -> String {
    decimal::format_scaled(centi, 2)
}

// =============================================================================
// FILTERS
// =============================================================================

/// Optional framework and domain selection.
///
/// Frameworks compare trimmed and ignoring ASCII case, so `"nist"` selects
/// `NIST` rows; domains compare by parsed domain, so `"access control"`
/// selects `Access Control` rows. Blank criteria select everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub framework: Option<String>,
    pub domain: Option<Domain>,
}

impl RowFilter {
    #[must_use]
    pub fn new(framework: Option<&str>, domain: Option<&str>) -> Self {
        fn non_blank(s: &str) -> Option<&str> {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        }

        Self {
            framework: framework.and_then(non_blank).map(str::to_string),
            domain: domain.and_then(non_blank).map(Domain::parse),
        }
    }

    /// True when no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.framework.is_none() && self.domain.is_none()
    }

    #[must_use]
    pub fn matches(&self, framework: &str, domain: &Domain) -> bool {
        self.framework
            .as_deref()
            .is_none_or(|f| framework.trim().eq_ignore_ascii_case(f))
            && self.domain.as_ref().is_none_or(|d| domain == d)
    }
}

/// Rows matching an optional framework and an optional domain.
#[must_use]
pub fn filter_rows(
    rows: &[AnnotatedAssessment],
    framework: Option<&str>,
    domain: Option<&str>,
) -> Vec<AnnotatedAssessment> {
    let filter = RowFilter::new(framework, domain);
    rows.iter()
        .filter(|r| filter.matches(&r.framework, &r.domain))
        .cloned()
        .collect()
}

/// Rows whose score is below `RISKY_THRESHOLD`, in table order.
#[must_use]
pub fn remediation_suggestions(rows: &[AnnotatedAssessment]) -> Vec<&AnnotatedAssessment> {
    rows.iter()
        .filter(|r| r.score.value() < RISKY_THRESHOLD)
        .collect()
}

// =============================================================================
// INSIGHT TYPES
// =============================================================================

/// Mean score of one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainMean {
    pub domain: String,
    pub mean_centi: u64,
    pub count: usize,
}

/// Mean score of one domain within one framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub domain: String,
    pub framework: String,
    pub mean_centi: u64,
    pub count: usize,
}

/// A control scoring below the risky threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskyControl {
    pub control: String,
    pub domain: String,
    pub framework: String,
    pub score: Score,
}

/// Row counts per Eisenhower quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PriorityCounts {
    pub do_first: usize,
    pub schedule: usize,
    pub delegate: usize,
    pub eliminate: usize,
}

impl PriorityCounts {
    fn record(&mut self, priority: Priority) {
        let slot = match priority {
            Priority::DoFirst => &mut self.do_first,
            Priority::Schedule => &mut self.schedule,
            Priority::Delegate => &mut self.delegate,
            Priority::Eliminate => &mut self.eliminate,
        };
        *slot = slot.saturating_add(1);
    }

    /// Count for one quadrant.
    #[must_use]
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::DoFirst => self.do_first,
            Priority::Schedule => self.schedule,
            Priority::Delegate => self.delegate,
            Priority::Eliminate => self.eliminate,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.do_first + self.schedule + self.delegate + self.eliminate
    }
}

/// Limits applied to the ranked lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightLimits {
    pub risky_controls: usize,
    pub weakest_domains: usize,
}

impl Default for InsightLimits {
    fn default() -> Self {
        Self {
            risky_controls: DEFAULT_RISKY_LIMIT,
            weakest_domains: DEFAULT_WEAKEST_LIMIT,
        }
    }
}

/// Row count and mean score of the rows a `RowFilter` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub row_count: usize,
    pub average_centi: Option<u64>,
}

/// Aggregate view of an annotated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub row_count: usize,
    pub average_centi: Option<u64>,
    pub domain_means: Vec<DomainMean>,
    pub heatmap: Vec<HeatmapCell>,
    pub weakest_domains: Vec<DomainMean>,
    pub risky_controls: Vec<RiskyControl>,
    pub priority_counts: PriorityCounts,
    /// Set when a non-empty filter narrowed the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
}

impl Insights {
    /// Compute insights with default limits.
    #[must_use]
    pub fn from_rows(rows: &[AnnotatedAssessment]) -> Self {
        Self::with_limits(rows, InsightLimits::default())
    }

    /// Compute insights.
    #[must_use]
    pub fn with_limits(rows: &[AnnotatedAssessment], limits: InsightLimits) -> Self {
        let domain_means = domain_means(rows);
        let weakest_domains = weakest_domains(&domain_means, limits.weakest_domains);

        let mut priority_counts = PriorityCounts::default();
        for row in rows {
            priority_counts.record(row.priority);
        }

        Self {
            row_count: rows.len(),
            average_centi: mean_centi(rows.iter().map(|r| r.score)),
            heatmap: heatmap(rows),
            risky_controls: risky_controls(rows, limits.risky_controls),
            domain_means,
            weakest_domains,
            priority_counts,
            selection: None,
        }
    }

    /// Insights over the whole table plus the selection `filter` makes.
    ///
    /// Means, heatmap, rankings and priority counts always cover every row;
    /// the filter only narrows `selection`.
    #[must_use]
    pub fn with_selection(
        rows: &[AnnotatedAssessment],
        filter: &RowFilter,
        limits: InsightLimits,
    ) -> Self {
        let mut insights = Self::with_limits(rows, limits);
        if !filter.is_empty() {
            let scores: Vec<Score> = rows
                .iter()
                .filter(|r| filter.matches(&r.framework, &r.domain))
                .map(|r| r.score)
                .collect();
            insights.selection = Some(Selection {
                row_count: scores.len(),
                average_centi: mean_centi(scores),
            });
        }
        insights
    }
}

/// Mean score per domain, ordered by domain name.
///
/// Rows group by `Domain`, so labels differing only in case share one entry
/// named after the first row seen.
#[must_use]
pub fn domain_means(rows: &[AnnotatedAssessment]) -> Vec<DomainMean> {
    let mut groups: BTreeMap<&Domain, Vec<Score>> = BTreeMap::new();
    for row in rows {
        groups.entry(&row.domain).or_default().push(row.score);
    }

    let mut means: Vec<DomainMean> = groups
        .into_iter()
        .filter_map(|(domain, scores)| {
            let count = scores.len();
            mean_centi(scores).map(|mean_centi| DomainMean {
                domain: domain.name().to_string(),
                mean_centi,
                count,
            })
        })
        .collect();
    means.sort_by(|a, b| a.domain.cmp(&b.domain));
    means
}

/// Mean score per `(domain, framework)`, ordered by domain then framework.
///
/// Framework labels group ignoring ASCII case, like `RowFilter`.
#[must_use]
pub fn heatmap(rows: &[AnnotatedAssessment]) -> Vec<HeatmapCell> {
    let mut groups: BTreeMap<(&Domain, String), (&str, Vec<Score>)> = BTreeMap::new();
    for row in rows {
        let framework = row.framework.trim();
        groups
            .entry((&row.domain, framework.to_ascii_lowercase()))
            .or_insert_with(|| (framework, Vec::new()))
            .1
            .push(row.score);
    }

    let mut cells: Vec<HeatmapCell> = groups
        .into_iter()
        .filter_map(|((domain, _), (framework, scores))| {
            let count = scores.len();
            mean_centi(scores).map(|mean_centi| HeatmapCell {
                domain: domain.name().to_string(),
                framework: framework.to_string(),
                mean_centi,
                count,
            })
        })
        .collect();
    cells.sort_by(|a, b| {
        a.domain
            .cmp(&b.domain)
            .then_with(|| a.framework.cmp(&b.framework))
    });
    cells
}

/// The `limit` lowest domain means, ties broken by name.
#[must_use]
pub fn weakest_domains(means: &[DomainMean], limit: usize) -> Vec<DomainMean> {
    let mut sorted = means.to_vec();
    sorted.sort_by(|a, b| {
        a.mean_centi
            .cmp(&b.mean_centi)
            .then_with(|| a.domain.cmp(&b.domain))
    });
    sorted.truncate(limit);
    sorted
}

/// The `limit` lowest-scoring controls below `RISKY_THRESHOLD`.
///
/// Sorted ascending by score; equal scores keep table order.
#[must_use]
pub fn risky_controls(rows: &[AnnotatedAssessment], limit: usize) -> Vec<RiskyControl> {
    let mut risky: Vec<&AnnotatedAssessment> = remediation_suggestions(rows);
    risky.sort_by_key(|r| r.score);

    risky
        .into_iter()
        .take(limit)
        .map(|r| RiskyControl {
            control: r.control.clone(),
            domain: r.domain.name().to_string(),
            framework: r.framework.clone(),
            score: r.score,
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
