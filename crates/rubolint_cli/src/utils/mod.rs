//! CLI utility functions

use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use tokio::runtime::Runtime;
use tracing::info;

use rubolint_core::{Linter, LinterConfig, Notification, NotificationKind, Notifier};

use crate::cli::Cli;

pub fn create_tokio_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}

/// Loads `--config` (or defaults) and applies command line overrides.
pub fn load_config(cli: &Cli) -> Result<LinterConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Using config: {}", path.display());
            LinterConfig::from_file(path).into_diagnostic()?
        }
        None => LinterConfig::new(),
    };

    let overrides = &cli.overrides;
    if let Some(command) = &overrides.rubocop_command {
        config.command = command.clone();
    }
    if overrides.use_bundler {
        config.use_bundler = true;
    }
    if overrides.disable_when_no_config_file {
        config.disable_when_no_config_file = true;
    }
    if let Some(timeout) = overrides.timeout {
        config.timeout_ms = timeout;
    }

    Ok(config)
}

/// Builds a linter rooted at the current directory that reports to stderr.
pub fn create_linter(cli: &Cli) -> Result<Linter> {
    let config = load_config(cli)?;
    let root = std::env::current_dir().into_diagnostic()?;
    Ok(Linter::new(config, Arc::new(StderrNotifier)).with_project_root(root))
}

/// Prints notifications to stderr so stdout stays machine-readable.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        let label = match notification.kind {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        };
        eprintln!("{}: {}", label, notification.message);
        if let Some(description) = notification.description {
            for line in description.lines() {
                eprintln!("  {}", line);
            }
        }
    }
}
