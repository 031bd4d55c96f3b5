//! Linter error types.

use thiserror::Error;

/// Errors that can occur while running RuboCop and reading its output.
///
/// Timeouts and superseded runs are not errors: the runner reports them as
/// an absent result.
#[derive(Debug, Error)]
pub enum LinterError {
    /// Configuration error (e.g. an empty command).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The RuboCop process could not be started.
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Output was not a JSON object. Carries the tool's own text.
    #[error("{0}")]
    Parse(String),

    /// The JSON output did not report a RuboCop version.
    #[error("Unable to get rubocop version from linting output results.")]
    MissingVersion,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinterError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates a spawn error for `program`.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
