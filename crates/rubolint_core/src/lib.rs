//! # rubolint_core
//!
//! Core engine for running RuboCop on behalf of an editor.
//!
//! This crate provides:
//! - The main `Linter` orchestrator (analyze and auto-correct)
//! - Command resolution and a supersession-aware process runner
//! - Parsing of RuboCop's JSON output into diagnostics
//! - A lazily fetched style guide documentation cache
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rubolint_core::{Document, Linter, LinterConfig, NullNotifier};
//!
//! let linter = Linter::new(LinterConfig::new(), Arc::new(NullNotifier));
//! let buffer = Document::saved("app/models/user.rb", source);
//!
//! if let Some(diagnostics) = linter.analyze(&buffer).await {
//!     for diag in diagnostics {
//!         println!("{}: {}", diag.location.position.start.line + 1, diag.excerpt);
//!     }
//! }
//! ```

pub mod command;
mod config;
mod diagnostic;
pub mod docs;
mod error;
mod host;
mod linter;
pub mod offense;
pub mod output;
pub mod runner;

pub use config::{
    DEFAULT_TIMEOUT_MS, LinterConfig, PROJECT_SETTINGS_FILE, ProjectSettings, RUBOCOP_CONFIG_FILE,
    find_upward,
};
pub use diagnostic::{Diagnostic, Location, Position, Range, Severity};
pub use docs::DocumentationCache;
pub use error::LinterError;
pub use host::{
    Document, Notification, NotificationKind, Notifier, NullNotifier, RecordingNotifier,
    TextBuffer,
};
pub use linter::{FixOutcome, FixSummary, FixTrigger, Linter};
pub use offense::MessageFormat;
pub use output::{RubocopOutput, parse_output};
pub use runner::{ExecutionRequest, ProcessRunner, RawOutput};
