//! Fix command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result, miette};

use rubolint_core::{Document, FixOutcome, FixTrigger};

use crate::cli::Cli;
use crate::utils::{create_linter, create_tokio_runtime};

/// Auto-corrects one file. Returns whether offenses remain.
///
/// The summary itself is reported by the linter's notifier.
pub fn run_fix(cli: &Cli, file: &Path) -> Result<bool> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| miette!("Failed to read {}: {}", file.display(), e))?;
    let document = Document::saved(std::path::absolute(file).into_diagnostic()?, text);

    let linter = create_linter(cli)?;
    let summary = create_tokio_runtime()?
        .block_on(linter.autocorrect(&document, FixTrigger::Command))
        .ok_or_else(|| miette!("Auto-correct did not complete for {}", file.display()))?;

    Ok(summary.outcome() == FixOutcome::PartiallyCorrected)
}
