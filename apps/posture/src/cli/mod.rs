//! # Posture CLI Module
//!
//! Command-line interface for scoring assessment tables.
//!
//! ## Available Commands
//!
//! - `assess` - Annotate a CSV table with score, remediation and priority
//! - `report` - Print the plain-text compliance summary
//! - `insights` - Domain means, weakest domains, riskiest controls
//! - `weights` - Show the effective risk-weight table
//! - `classify` - Annotate a single row given on the command line
//! - `server` - Start the HTTP server

mod commands;

use crate::assessor::Assessor;
use crate::config::PostureConfig;
use clap::{Parser, Subcommand};
use posture_core::PostureError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Posture - compliance control scoring
///
/// Scores assessment rows by domain risk weight, attaches remediation text
/// and an Eisenhower priority.
#[derive(Parser, Debug)]
#[command(name = "posture")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the TOML configuration file (default: ./posture.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Row filters shared by the table commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep only rows of this framework
    #[arg(long)]
    pub framework: Option<String>,

    /// Keep only rows of this domain
    #[arg(long)]
    pub domain: Option<String>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Annotate an assessment table
    Assess {
        /// Input CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (csv, json)
        #[arg(short = 't', long, default_value = "csv")]
        format: String,

        #[command(flatten)]
        filter: FilterArgs,

        /// Ask the completion endpoint for remediation and priority
        #[arg(short, long)]
        generative: bool,
    },

    /// Print the compliance summary report
    Report {
        /// Input CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Ask the completion endpoint for remediation and priority
        #[arg(short, long)]
        generative: bool,
    },

    /// Show aggregate insights for a table
    Insights {
        /// Input CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Length of the riskiest-controls and weakest-domains lists
        #[arg(long)]
        top: Option<usize>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show the effective risk-weight table
    Weights,

    /// Annotate a single row
    Classify {
        /// Control domain
        #[arg(short, long)]
        domain: String,

        /// Assessment value between 0 and 1
        #[arg(long)]
        value: String,

        /// Urgency (High or Low)
        #[arg(short, long)]
        urgency: Option<String>,

        /// Control identifier
        #[arg(long, default_value = "ad-hoc")]
        control: String,

        /// Framework name
        #[arg(long, default_value = "ad-hoc")]
        framework: String,

        /// Ask the completion endpoint for remediation and priority
        #[arg(short, long)]
        generative: bool,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), PostureError> {
    let config = PostureConfig::load(cli.config.as_deref())?;
    let assessor = Assessor::from_config(&config)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Assess {
            file,
            output,
            format,
            filter,
            generative,
        }) => {
            let format = if json_mode { "json" } else { format.as_str() };
            cmd_assess(
                &assessor,
                &file,
                output.as_deref(),
                format,
                &filter,
                generative,
            )
            .await
        }
        Some(Commands::Report {
            file,
            output,
            filter,
            generative,
        }) => {
            cmd_report(
                &assessor,
                &file,
                output.as_deref(),
                &filter,
                generative,
                json_mode,
            )
            .await
        }
        Some(Commands::Insights { file, top, filter }) => {
            cmd_insights(&assessor, &file, top, &filter, json_mode).await
        }
        Some(Commands::Weights) => cmd_weights(&assessor, json_mode),
        Some(Commands::Classify {
            domain,
            value,
            urgency,
            control,
            framework,
            generative,
        }) => {
            let mut record = posture_core::AssessmentRecord::new(control, domain, framework, value);
            record.urgency = urgency;
            cmd_classify(&assessor, &record, generative, json_mode).await
        }
        Some(Commands::Server { host, port }) => cmd_server(assessor, &host, port).await,
        // No subcommand: show the weight table
        None => cmd_weights(&assessor, json_mode),
    }
}
