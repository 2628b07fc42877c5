//! # persondb - Declarative Person Records
//!
//! ## Usage
//!
//! ```bash
//! export CUSTOM_DATABASE_FILENAME=persons.redb
//!
//! persondb init
//! persondb create --person-id p1 --last-name Doe --first-name Jane
//! persondb read /person/p1
//! persondb update /person/p1 --person-id p1 --last-name Doe
//! persondb delete p1
//!
//! # JSON snapshot backend, JSON output
//! persondb --backend file --database persons.json --json list
//! ```

use clap::Parser;
use persondb::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // PERSONDB_LOG_FORMAT=json enables machine-parseable output. Logs go to
    // stderr so stdout stays clean for command output.
    let log_format = std::env::var("PERSONDB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "persondb=debug,persondb_core=debug"
    } else {
        "persondb=info,persondb_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let outcome = match cli::execute(&cli) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(kind = e.kind(), "{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli::render(&outcome, cli.json) {
        Ok(text) => print!("{}", text),
        Err(e) => {
            tracing::error!("failed to render output: {}", e);
            eprintln!("Error: failed to render output: {}", e);
            std::process::exit(1);
        }
    }
}
