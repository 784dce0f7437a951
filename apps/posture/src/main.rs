//! # Posture - Compliance Control Scoring
//!
//! The main binary for Posture.
//!
//! This application provides:
//! - CLI interface for scoring assessment tables
//! - HTTP REST API server (axum-based)
//! - Optional generated remediation through a chat-completion endpoint
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  apps/posture (THE BINARY)                │
//! │                                                           │
//! │  ┌─────────┐   ┌──────────┐   ┌───────────────────────┐   │
//! │  │   CLI   │   │ HTTP API │   │ Generative remediation│   │
//! │  │ (clap)  │   │  (axum)  │   │  (reqwest + tokio)    │   │
//! │  └────┬────┘   └────┬─────┘   └───────────┬───────────┘   │
//! │       └─────────────┼─────────────────────┘               │
//! │                     ▼                                     │
//! │              ┌──────────────┐                             │
//! │              │ posture-core │                             │
//! │              │ (THE LOGIC)  │                             │
//! │              └──────────────┘                             │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! posture assess -f controls.csv -o annotated.csv
//! posture report -f controls.csv --framework NIST
//! posture insights -f controls.csv --top 3
//! posture server --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use posture::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `POSTURE_LOG_FORMAT=json` switches to JSON log lines.
const LOG_FORMAT_ENV: &str = "POSTURE_LOG_FORMAT";

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "posture=debug,posture_core=debug,tower_http=debug"
    } else {
        "posture=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives.into());

    let registry = tracing_subscriber::registry().with(filter);
    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Print the startup banner.
fn print_banner() {
    eprintln!(
        r#"
  ┌─┐┌─┐┌─┐┌┬┐┬ ┬┬─┐┌─┐
  ├─┘│ │└─┐ │ │ │├┬┘├┤
  ┴  └─┘└─┘ ┴ └─┘┴└─└─┘

  Compliance Control Scoring v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
