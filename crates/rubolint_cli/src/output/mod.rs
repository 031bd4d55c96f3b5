//! Output formatting module

mod json;
mod text;

use std::path::Path;

use miette::Result;
use rubolint_core::{Diagnostic, Severity};

use crate::cli::OutputFormat;

/// A diagnostic together with its resolved documentation, if requested.
pub struct Report {
    pub diagnostic: Diagnostic,
    pub description: Option<String>,
}

/// Prints the reports and returns whether any has error severity.
pub fn output_results(file: &Path, reports: &[Report], format: OutputFormat) -> Result<bool> {
    let has_errors = reports
        .iter()
        .any(|r| r.diagnostic.severity == Severity::Error);

    match format {
        OutputFormat::Json => json::output_json(file, reports)?,
        OutputFormat::Text => text::output_text(file, reports),
    }

    Ok(has_errors)
}
