//! Text output formatter

use std::path::Path;

use rubolint_core::Severity;

use super::Report;

pub fn output_text(file: &Path, reports: &[Report]) {
    print!("{}", render_text(file, reports));
}

fn render_text(file: &Path, reports: &[Report]) -> String {
    let mut out = String::new();

    for report in reports {
        let diag = &report.diagnostic;
        let severity = match diag.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        let start = diag.location.position.start;
        out.push_str(&format!(
            "{}:{}:{}: {}: {}\n",
            file.display(),
            start.line + 1,
            start.column + 1,
            severity,
            diag.excerpt
        ));
        if let Some(url) = &diag.url {
            out.push_str(&format!("  {}\n", url));
        }
        if let Some(description) = &report.description {
            for line in description.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
    }

    let count = reports.len();
    out.push_str(&format!(
        "\nChecked {}, found {} {}\n",
        file.display(),
        count,
        if count == 1 { "offense" } else { "offenses" }
    ));
    out
}
