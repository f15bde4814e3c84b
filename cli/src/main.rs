//! Casebook CLI - inspect and reconcile casebook records from the shell.
//!
//! Records are read from JSON files and results are written to stdout as
//! JSON. Logs go to stderr.

mod commands;
mod config;
mod error;

use crate::commands::Command;
use crate::config::Config;
use crate::error::CliError;
use casebook_engine::SystemClock;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casebook_cli=info,casebook_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ CliError::Usage(_)) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> error::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let command = Command::parse(std::env::args().skip(1))?;
    tracing::debug!(?command, "running");

    let output = command.run(&config, &SystemClock)?;
    let text = if config.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", text);
    Ok(())
}
