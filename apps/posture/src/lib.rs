//! # posture
//!
//! Application layer for Posture: CLI, HTTP API, configuration and the
//! generative remediation client. Scoring itself lives in `posture-core`.

pub mod api;
pub mod assessor;
pub mod cli;
pub mod config;
pub mod generative;

pub use assessor::Assessor;
pub use config::PostureConfig;
