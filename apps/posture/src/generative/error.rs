//! # Remediation Errors

use std::time::Duration;
use thiserror::Error;

/// Failures of a single generated-remediation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemediationError {
    /// The attempt exceeded the per-call timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The service could not be reached.
    #[error("cannot connect to {0}")]
    Connection(String),

    /// 401/403 from the service.
    #[error("unauthorized: invalid or missing API key")]
    Unauthorized,

    /// 429 from the service.
    #[error("rate limited by the completion service")]
    RateLimited,

    /// Any other non-success status.
    #[error("server error ({0}): {1}")]
    Server(u16, String),

    /// The reply could not be used.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Too many consecutive failures; the request was not sent.
    #[error("circuit open after {0} consecutive failures")]
    CircuitOpen(u32),

    /// Generated remediation was requested but no client is available.
    #[error("generative remediation is not configured: {0}")]
    NotConfigured(String),
}

impl RemediationError {
    /// Whether a retry may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            RemediationError::Timeout(_)
            | RemediationError::Connection(_)
            | RemediationError::RateLimited => true,
            RemediationError::Server(status, _) => *status >= 500,
            RemediationError::Unauthorized
            | RemediationError::Malformed(_)
            | RemediationError::CircuitOpen(_)
            | RemediationError::NotConfigured(_) => false,
        }
    }
}
