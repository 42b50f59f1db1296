//! trainbot CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Knowledge validation failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directives = if cli.verbose {
        "trainbot=debug,warn"
    } else {
        "trainbot=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    // Logs on stderr, replies on stdout.
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Chat(args) => commands::chat::execute(args).await,
        Commands::Ask(args) => commands::ask::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let msg = e.to_string().to_lowercase();

    if msg.contains("validation") {
        ExitCodes::VALIDATION_FAILURE
    } else if msg.contains("configuration") || msg.contains("argument") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_error() {
        let validation = anyhow::anyhow!("Knowledge validation failed with 2 error(s)");
        assert_eq!(categorize_error(&validation), ExitCodes::VALIDATION_FAILURE);

        let config = anyhow::anyhow!("Failed to load engine configuration");
        assert_eq!(categorize_error(&config), ExitCodes::INVALID_ARGS);

        let other = anyhow::anyhow!("stdin closed");
        assert_eq!(categorize_error(&other), ExitCodes::GENERAL_ERROR);
    }
}
