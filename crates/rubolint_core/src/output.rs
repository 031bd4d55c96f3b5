//! RuboCop JSON output model and parser.

use serde::Deserialize;

use crate::LinterError;

/// Top-level document printed by `rubocop --format json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RubocopOutput {
    pub metadata: Metadata,
    pub files: Vec<FileReport>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub rubocop_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileReport {
    pub path: Option<String>,
    pub offenses: Vec<Offense>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub offense_count: u64,
}

/// One rule violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Offense {
    pub message: String,
    pub location: Option<OffenseLocation>,
    pub severity: Option<String>,
    pub cop_name: String,
    pub corrected: bool,
}

/// 1-based line and column, with a length in columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OffenseLocation {
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl RubocopOutput {
    /// The reported tool version, if present and non-empty.
    pub fn version(&self) -> Option<&str> {
        self.metadata
            .rubocop_version
            .as_deref()
            .filter(|v| !v.trim().is_empty())
    }

    /// Offenses of the first (and, for single-file runs, only) file.
    pub fn offenses(&self) -> &[Offense] {
        self.files
            .first()
            .map(|f| f.offenses.as_slice())
            .unwrap_or_default()
    }

    /// Number of offenses RuboCop marked as corrected.
    pub fn corrected_count(&self) -> u64 {
        self.offenses().iter().filter(|o| o.corrected).count() as u64
    }
}

/// Parses process output.
///
/// Anything that is not a JSON object on stdout is treated as a tool failure.
/// The error carries stderr, or stdout when stderr is empty, so the user
/// sees RuboCop's own message.
pub fn parse_output(stdout: &str, stderr: &str) -> Result<RubocopOutput, LinterError> {
    let raw_message = || {
        if stderr.is_empty() {
            stdout.to_string()
        } else {
            stderr.to_string()
        }
    };

    let value: serde_json::Value = match serde_json::from_str(stdout) {
        Ok(v) => v,
        Err(_) => return Err(LinterError::parse(raw_message())),
    };

    if !value.is_object() {
        return Err(LinterError::parse(raw_message()));
    }

    serde_json::from_value(value).map_err(|e| LinterError::parse(e.to_string()))
}
