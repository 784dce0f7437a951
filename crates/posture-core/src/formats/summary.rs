//! # Summary Report
//!
//! Plain-text compliance summary:
//!
//! ```text
//! Compliance Summary
//! AC-1: Score 48 - Enforce least privilege and automate quarterly access reviews.
//! ...
//!
//! Insights
//! Average score: 61.5
//! Riskiest controls:
//!   AC-1 (Access Control, NIST): 48
//! Weakest domains:
//!   Access Control: 48.0
//! Priorities: Do First 1, Schedule 0, Delegate 0, Eliminate 1
//! ```

use crate::insights::{Insights, format_centi, mean_centi};
use crate::{ALL_PRIORITIES, AnnotatedAssessment};
use std::fmt::Write;

/// Title line of every summary.
pub const SUMMARY_TITLE: &str = "Compliance Summary";

/// Render the summary for the listed rows and the table's insights.
///
/// The average covers the listed rows; the ranked sections come from
/// `insights`, which may cover a wider table.
#[must_use]
pub fn render_summary(rows: &[AnnotatedAssessment], insights: &Insights) -> String {
    let mut out = String::new();
    out.push_str(SUMMARY_TITLE);
    out.push('\n');

    for row in rows {
        let _ = writeln!(
            out,
            "{}: Score {} - {}",
            row.control, row.score, row.remediation
        );
    }

    out.push_str("\nInsights\n");
    match mean_centi(rows.iter().map(|r| r.score)) {
        Some(avg) => {
            let _ = writeln!(out, "Average score: {}", format_centi(avg));
        }
        None => out.push_str("Average score: n/a\n"),
    }

    if insights.risky_controls.is_empty() {
        out.push_str("Riskiest controls: none\n");
    } else {
        out.push_str("Riskiest controls:\n");
        for risky in &insights.risky_controls {
            let _ = writeln!(
                out,
                "  {} ({}, {}): {}",
                risky.control, risky.domain, risky.framework, risky.score
            );
        }
    }

    if insights.weakest_domains.is_empty() {
        out.push_str("Weakest domains: none\n");
    } else {
        out.push_str("Weakest domains:\n");
        for weak in &insights.weakest_domains {
            let _ = writeln!(out, "  {}: {}", weak.domain, format_centi(weak.mean_centi));
        }
    }

    let counts: Vec<String> = ALL_PRIORITIES
        .iter()
        .map(|p| format!("{p} {}", insights.priority_counts.get(*p)))
        .collect();
    let _ = writeln!(out, "Priorities: {}", counts.join(", "));

    out
}

// =============================================================================
// TESTS
// =============================================================================
