//! rubolint CLI
//!
//! Runs RuboCop on a file from the terminal, or serves editors over LSP.

mod cli;
mod commands;
mod output;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results and the LSP stream.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Commands::Lint {
            file,
            stdin,
            format,
            describe,
        } => commands::lint::run_lint(cli, file, *stdin, *format, *describe),
        Commands::Fix { file } => commands::fix::run_fix(cli, file),
        Commands::Lsp => commands::lsp::run_lsp().map(|_| false),
    }
}
