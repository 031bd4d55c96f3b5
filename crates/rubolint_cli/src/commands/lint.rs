//! Lint command implementation

use std::io::Read;
use std::path::Path;

use miette::{IntoDiagnostic, Result, miette};
use tracing::debug;

use rubolint_core::Document;

use crate::cli::{Cli, OutputFormat};
use crate::output::{Report, output_results};
use crate::utils::{create_linter, create_tokio_runtime};

/// Lints one file. Returns whether an error-severity offense was found.
pub fn run_lint(
    cli: &Cli,
    file: &Path,
    stdin: bool,
    format: OutputFormat,
    describe: bool,
) -> Result<bool> {
    let path = std::path::absolute(file).into_diagnostic()?;
    let document = if stdin {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .into_diagnostic()?;
        Document::modified(path, text)
    } else {
        let text = std::fs::read_to_string(file)
            .map_err(|e| miette!("Failed to read {}: {}", file.display(), e))?;
        Document::saved(path, text)
    };

    let linter = create_linter(cli)?;
    let runtime = create_tokio_runtime()?;

    let reports = runtime.block_on(async {
        let diagnostics = linter
            .analyze(&document)
            .await
            .ok_or_else(|| miette!("RuboCop produced no result for {}", file.display()))?;

        let mut reports = Vec::with_capacity(diagnostics.len());
        for diagnostic in diagnostics {
            let description = if describe {
                diagnostic.description(linter.documentation()).await
            } else {
                None
            };
            reports.push(Report {
                diagnostic,
                description,
            });
        }
        Ok::<_, miette::Report>(reports)
    })?;

    debug!("{} offenses in {}", reports.len(), file.display());
    output_results(file, &reports, format)
}
