//! Veritrail CLI - Audit-log chain-of-custody validation.
//!
//! The `validate` command walks a trail's digest chain backwards through a
//! local object-store mirror, authenticates every digest manifest, verifies
//! the content hash of every log file the digests declare, and reports
//! anything missing, tampered, or out of place.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;
mod keys;
mod reporter;

use commands::validate::{self, ValidateArgs};

/// Veritrail - audit-log digest chain validator
#[derive(Parser)]
#[command(name = "veritrail")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a trail's digest chain and log file hashes
    Validate(ValidateArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "veritrail=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Validate(args) => validate::run(args).await,
    };

    match result {
        Ok(summary) if summary.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        },
    }
}
