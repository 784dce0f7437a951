//! # Generative Remediation
//!
//! Network side of generated remediation: a chat-completion client and a
//! hardened service around it.
//!
//! ```text
//! RemediationKey ──► RemediationService ──► CompletionBackend (ChatClient)
//!                     │ cache
//!                     │ circuit breaker
//!                     │ timeout + retry with backoff
//!                     │ bounded concurrency
//!                     ▼
//!                Recommendation (generated or fallback)
//! ```
//!
//! Every failure becomes a fallback `Recommendation` (priority `Schedule`,
//! text naming the error). Callers never see a `RemediationError`.

mod client;
mod error;
mod service;

pub use client::{ChatClient, CompletionBackend};
pub use error::RemediationError;
pub use service::{RemediationService, ServicePolicy};
