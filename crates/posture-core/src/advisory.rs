//! # Advisory Module
//!
//! The pure half of generated remediation.
//!
//! The binary talks to a chat-completion service; everything that does not
//! need the network lives here:
//! - Prompt construction from `(Control, Domain, Score)`
//! - Reply parsing (`Recommendation:` / `Priority:` lines)
//! - Fallback construction when the service fails
//! - Cache keys
//!
//! A `Recommendation` always has one of the four quadrants as priority, so
//! generated rows are indistinguishable in shape from rule-based rows.

use crate::{Domain, Priority, Score};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority used whenever the service fails or returns no usable priority.
pub const FALLBACK_PRIORITY: Priority = Priority::Schedule;

/// System prompt sent with every request.
pub const ADVISOR_SYSTEM_PROMPT: &str = "You are a cybersecurity compliance advisor. \
     Give one concise, actionable remediation for the control you are given.";

const RECOMMENDATION_PREFIX: &str = "recommendation:";
const PRIORITY_PREFIX: &str = "priority:";

// =============================================================================
// CHAT MESSAGES
// =============================================================================

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Build the request messages for one control.
#[must_use]
pub fn build_prompt(control: &str, domain: &Domain, score: Score) -> Vec<ChatMessage> {
    let user = format!(
        "Control: {control}\n\
         Domain: {domain}\n\
         Compliance score: {score} (0-100, lower is weaker)\n\n\
         Answer in exactly two lines:\n\
         Recommendation: <one sentence>\n\
         Priority: <Do First | Schedule | Delegate | Eliminate>"
    );
    vec![
        ChatMessage::system(ADVISOR_SYSTEM_PROMPT),
        ChatMessage::user(user),
    ]
}

// =============================================================================
// REPLY PARSING
// =============================================================================

/// Fields extracted from a reply. Unmatched fields are empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReply {
    pub recommendation: String,
    pub priority: String,
}

/// Scan reply lines for `Recommendation:` and `Priority:` prefixes.
///
/// Prefixes match case-insensitively after trimming; the first match per
/// key wins.
#[must_use]
pub fn parse_reply(text: &str) -> ParsedReply {
    let mut recommendation = None;
    let mut priority = None;

    for line in text.lines().map(str::trim) {
        if recommendation.is_none()
            && let Some(rest) = strip_prefix_ignore_case(line, RECOMMENDATION_PREFIX)
        {
            recommendation = Some(rest.trim().to_string());
        } else if priority.is_none()
            && let Some(rest) = strip_prefix_ignore_case(line, PRIORITY_PREFIX)
        {
            priority = Some(rest.trim().to_string());
        }
    }

    ParsedReply {
        recommendation: recommendation.unwrap_or_default(),
        priority: priority.unwrap_or_default(),
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}

// =============================================================================
// RECOMMENDATION
// =============================================================================

/// Where a recommendation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Generated,
    Fallback,
}

/// Remediation text and priority for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub priority: Priority,
    pub source: RecommendationSource,
}

impl Recommendation {
    /// Turn a parsed reply into a recommendation.
    ///
    /// Returns `None` when the reply carries no recommendation text. An
    /// empty or unrecognized priority becomes `FALLBACK_PRIORITY`.
    #[must_use]
    pub fn from_reply(reply: &ParsedReply) -> Option<Self> {
        if reply.recommendation.is_empty() {
            return None;
        }
        Some(Self {
            text: reply.recommendation.clone(),
            priority: Priority::parse_loose(&reply.priority).unwrap_or(FALLBACK_PRIORITY),
            source: RecommendationSource::Generated,
        })
    }

    /// Safe default used when the service fails.
    ///
    /// The text always names the failure so that fallback rows are visible
    /// in exported tables.
    #[must_use]
    pub fn fallback(reason: impl fmt::Display) -> Self {
        Self {
            text: format!(
                "Remediation unavailable (error: {reason}). Review this control manually."
            ),
            priority: FALLBACK_PRIORITY,
            source: RecommendationSource::Fallback,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == RecommendationSource::Fallback
    }
}

// =============================================================================
// CACHE KEY
// =============================================================================

/// Identity of a generated recommendation: same key, same request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemediationKey {
    pub control: String,
    pub domain: Domain,
    pub score: Score,
}

impl RemediationKey {
    #[must_use]
    pub fn new(control: impl Into<String>, domain: Domain, score: Score) -> Self {
        Self {
            control: control.into(),
            domain,
            score,
        }
    }

    /// Request messages for this key.
    #[must_use]
    pub fn prompt(&self) -> Vec<ChatMessage> {
        build_prompt(&self.control, &self.domain, self.score)
    }
}

// =============================================================================
// TESTS
// =============================================================================
