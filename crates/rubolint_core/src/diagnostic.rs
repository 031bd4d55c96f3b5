//! Diagnostic types handed to the host editor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::docs::{DocumentationCache, rule_anchor};

/// Severity level for diagnostics.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - must be fixed.
    #[default]
    Error,
    /// Warning - should be reviewed.
    Warning,
    /// Info - informational message.
    Info,
}

impl Severity {
    /// Maps a RuboCop severity name. Unknown or missing names map to `Error`.
    pub fn from_rubocop(severity: Option<&str>) -> Self {
        match severity {
            Some("refactor") | Some("convention") => Severity::Info,
            Some("warning") => Severity::Warning,
            Some("error") | Some("fatal") => Severity::Error,
            _ => Severity::Error,
        }
    }
}

/// A zero-based `(line, column)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Half-open range between two positions.
///
/// Serializes as `[[startLine, startCol], [endLine, endCol]]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// The first character of a file.
    pub const TOP_OF_FILE: Range = Range::new(Position::new(0, 0), Position::new(0, 1));

    /// Returns whether `pos` lies within the range (end inclusive).
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }
}

impl Serialize for Range {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [
            [self.start.line, self.start.column],
            [self.end.line, self.end.column],
        ]
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [[sl, sc], [el, ec]] = <[[u32; 2]; 2]>::deserialize(deserializer)?;
        Ok(Range::new(Position::new(sl, sc), Position::new(el, ec)))
    }
}

/// File and range a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub position: Range,
}

/// A diagnostic for one RuboCop offense, or a synthetic pipeline error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The cop that reported the offense. `None` for synthetic errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cop_name: Option<String>,

    /// Style guide link, if RuboCop reported one.
    pub url: Option<String>,

    /// One-line message shown in the editor.
    pub excerpt: String,

    /// Severity level.
    pub severity: Severity,

    /// Where the offense is.
    pub location: Location,
}

impl Diagnostic {
    /// Creates an error diagnostic pinned to the top of `file`.
    pub fn top_of_file_error(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            cop_name: None,
            url: None,
            excerpt: message.into(),
            severity: Severity::Error,
            location: Location {
                file: file.into(),
                position: Range::TOP_OF_FILE,
            },
        }
    }

    /// Style guide anchor derived from the URL fragment.
    pub fn rule_anchor(&self) -> Option<&str> {
        self.url.as_deref().and_then(rule_anchor)
    }

    /// Resolves the long description on demand.
    ///
    /// Nothing is fetched until this is awaited. Returns `None` when the
    /// offense carries no style guide link.
    pub async fn description(&self, docs: &DocumentationCache) -> Option<String> {
        let anchor = self.rule_anchor()?;
        docs.get_documentation(anchor).await
    }
}
