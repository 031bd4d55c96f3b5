//! JSON output formatter

use std::path::Path;

use miette::{IntoDiagnostic, Result};

use super::Report;

pub fn output_json(file: &Path, reports: &[Report]) -> Result<()> {
    println!("{}", render_json(file, reports)?);
    Ok(())
}

fn render_json(file: &Path, reports: &[Report]) -> Result<String> {
    let diagnostics: Vec<_> = reports
        .iter()
        .map(|r| -> Result<serde_json::Value> {
            let mut value = serde_json::to_value(&r.diagnostic).into_diagnostic()?;
            if let (Some(description), Some(object)) = (&r.description, value.as_object_mut()) {
                object.insert("description".to_string(), description.clone().into());
            }
            Ok(value)
        })
        .collect::<Result<_>>()?;

    let output = serde_json::json!({
        "path": file.display().to_string(),
        "diagnostics": diagnostics,
    });
    serde_json::to_string_pretty(&output).into_diagnostic()
}
