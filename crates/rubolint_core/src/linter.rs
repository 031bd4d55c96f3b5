//! Core linter engine.
//!
//! Sequences config checks, command resolution, the RuboCop run, output
//! parsing and offense translation for a single buffer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::command::{self, BundlerDetector};
use crate::config::{RUBOCOP_CONFIG_FILE, find_upward};
use crate::diagnostic::Diagnostic;
use crate::docs::DocumentationCache;
use crate::host::{Notification, Notifier, TextBuffer};
use crate::offense::translate_all;
use crate::output::parse_output;
use crate::runner::{ExecutionRequest, ProcessRunner, RawOutput};
use crate::{LinterConfig, LinterError};

const PARSE_ERROR_MSG: &str = "Rubocop: Parse error";
const UNEXPECTED_ERROR_MSG: &str = "Rubocop: Unexpected error";
const NO_FIXES_INFO_MSG: &str = "Linter-Rubocop: No fixes were made";
const SAVE_BEFORE_FIX_MSG: &str = "Linter-Rubocop: Please save before fix file";
const EMPTY_FILE_MSG: &str = "Linter-Rubocop: Nothing to fix in an empty file";

/// What started an auto-correct run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixTrigger {
    /// The user asked for it explicitly.
    #[default]
    Command,
    /// The file was saved with `fix_on_save` enabled.
    Save,
}

/// Result of an auto-correct run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSummary {
    pub offense_count: u64,
    pub corrected: u64,
}

/// How an auto-correct run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    NoOffenses,
    AllCorrected,
    PartiallyCorrected,
}

impl FixSummary {
    pub fn outcome(&self) -> FixOutcome {
        if self.offense_count == 0 {
            FixOutcome::NoOffenses
        } else if self.corrected >= self.offense_count {
            FixOutcome::AllCorrected
        } else {
            FixOutcome::PartiallyCorrected
        }
    }

    /// The user-facing summary line.
    pub fn message(&self) -> String {
        match self.outcome() {
            FixOutcome::NoOffenses => NO_FIXES_INFO_MSG.to_string(),
            _ => format!(
                "Linter-Rubocop: Fixed {} of {}",
                pluralize("offense", self.corrected),
                self.offense_count
            ),
        }
    }
}

fn pluralize(noun: &str, count: u64) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// The RuboCop linter.
///
/// One instance lives for the whole host session. Configuration can be
/// swapped at any time; each run reads a fresh snapshot.
pub struct Linter {
    config: RwLock<LinterConfig>,
    project_root: RwLock<Option<PathBuf>>,
    notifier: Arc<dyn Notifier>,
    runner: Arc<ProcessRunner>,
    bundler: BundlerDetector,
    docs: Arc<DocumentationCache>,
}

impl Linter {
    /// Creates a new linter with the given configuration.
    pub fn new(config: LinterConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config: RwLock::new(config),
            project_root: RwLock::new(None),
            runner: Arc::new(ProcessRunner::new(notifier.clone())),
            notifier,
            bundler: BundlerDetector::new(),
            docs: Arc::new(DocumentationCache::new()),
        }
    }

    /// Shares an existing documentation cache.
    pub fn with_documentation(mut self, docs: Arc<DocumentationCache>) -> Self {
        self.docs = docs;
        self
    }

    pub fn with_bundler(mut self, bundler: BundlerDetector) -> Self {
        self.bundler = bundler;
        self
    }

    /// Sets the project root used as working directory.
    pub fn with_project_root(self, root: impl Into<PathBuf>) -> Self {
        self.set_project_root(Some(root.into()));
        self
    }

    pub fn set_project_root(&self, root: Option<PathBuf>) {
        *self.project_root.write() = root;
    }

    /// Returns a snapshot of the configuration.
    pub fn config(&self) -> LinterConfig {
        self.config.read().clone()
    }

    /// Replaces the configuration.
    pub fn set_config(&self, config: LinterConfig) {
        info!("Linter configuration updated");
        *self.config.write() = config;
    }

    /// Changes individual settings in place.
    pub fn update_config(&self, update: impl FnOnce(&mut LinterConfig)) {
        update(&mut self.config.write());
    }

    /// Cache used to resolve diagnostic descriptions.
    pub fn documentation(&self) -> &Arc<DocumentationCache> {
        &self.docs
    }

    /// Bundler detection memo.
    pub fn bundler(&self) -> &BundlerDetector {
        &self.bundler
    }

    /// Directory RuboCop runs in: the project root when `file` lies under
    /// it, otherwise the file's own directory.
    pub fn working_dir(&self, file: &Path) -> PathBuf {
        if let Some(root) = self.project_root.read().as_ref()
            && file.starts_with(root)
        {
            return root.clone();
        }
        file.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Lints a buffer.
    ///
    /// Returns `None` when the host should leave its diagnostics untouched
    /// (no path, superseded, timed out or the tool failed to start).
    /// An empty list means RuboCop ran and found nothing.
    pub async fn analyze<B>(&self, buffer: &B) -> Option<Vec<Diagnostic>>
    where
        B: TextBuffer + ?Sized,
    {
        let file = buffer.path()?.to_path_buf();
        let cwd = self.working_dir(&file);
        let config = self.config().resolve_for_project(&cwd);

        if !self.config_file_present(&config, &file) {
            return Some(Vec::new());
        }

        let file_arg = file.to_string_lossy().into_owned();
        let (extra_args, stdin) = if buffer.is_modified() {
            (
                vec!["--stdin".to_string(), file_arg],
                Some(buffer.text().to_string()),
            )
        } else {
            (vec![file_arg], None)
        };

        let mut request = match self.build_request(&config, &cwd, extra_args).await {
            Ok(r) => r.with_cancellation_key(format!("linter-rubocop::{}", file.display())),
            Err(e) => return Some(vec![Diagnostic::top_of_file_error(&file, e.to_string())]),
        };
        if let Some(text) = stdin {
            request = request.with_stdin(text);
        }

        let output = match self.runner.run(request).await {
            Ok(Some(output)) => output,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to run rubocop: {}", e);
                self.notifier
                    .notify(Notification::error(UNEXPECTED_ERROR_MSG).with_description(e.to_string()));
                return None;
            }
        };

        let diagnostics = match diagnostics_from(&output, &file) {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                debug!("Rubocop output could not be used: {}", e);
                vec![Diagnostic::top_of_file_error(&file, e.to_string())]
            }
        };
        debug!("{} diagnostics for {}", diagnostics.len(), file.display());
        Some(diagnostics)
    }

    /// Runs `rubocop --auto-correct` on a saved buffer and reports a summary.
    pub async fn autocorrect<B>(&self, buffer: &B, trigger: FixTrigger) -> Option<FixSummary>
    where
        B: TextBuffer + ?Sized,
    {
        let file = buffer.path()?.to_path_buf();

        if buffer.is_modified() {
            self.notifier.notify(Notification::error(SAVE_BEFORE_FIX_MSG));
            return None;
        }
        if buffer.text().is_empty() {
            self.notifier.notify(Notification::error(EMPTY_FILE_MSG));
            return None;
        }

        let cwd = self.working_dir(&file);
        let config = self.config().resolve_for_project(&cwd);

        if !self.config_file_present(&config, &file) {
            return None;
        }

        let extra_args = vec![
            "--auto-correct".to_string(),
            file.to_string_lossy().into_owned(),
        ];
        let request = match self.build_request(&config, &cwd, extra_args).await {
            Ok(r) => r,
            Err(e) => {
                self.report_unexpected(&e.to_string());
                return None;
            }
        };

        let runner = self.runner.clone();
        let output = match tokio::task::spawn_blocking(move || runner.run_sync(&request)).await {
            Ok(Ok(Some(output))) => output,
            Ok(Ok(None)) => return None,
            Ok(Err(e)) => {
                self.report_unexpected(&e.to_string());
                return None;
            }
            Err(e) => {
                self.report_unexpected(&e.to_string());
                return None;
            }
        };

        let parsed = match parse_output(&output.stdout, &output.stderr) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.notifier
                    .notify(Notification::error(PARSE_ERROR_MSG).with_description(e.to_string()));
                return None;
            }
        };

        let summary = FixSummary {
            offense_count: parsed.summary.offense_count,
            corrected: parsed.corrected_count(),
        };
        info!(
            "Auto-correct of {}: {} of {} offenses fixed",
            file.display(),
            summary.corrected,
            summary.offense_count
        );
        self.report_fix(&summary, trigger);

        Some(summary)
    }

    fn config_file_present(&self, config: &LinterConfig, file: &Path) -> bool {
        if !config.disable_when_no_config_file {
            return true;
        }
        let found = find_upward(file, RUBOCOP_CONFIG_FILE).is_some();
        if !found {
            debug!("No {} for {}, skipping", RUBOCOP_CONFIG_FILE, file.display());
        }
        found
    }

    async fn build_request(
        &self,
        config: &LinterConfig,
        cwd: &Path,
        extra_args: Vec<String>,
    ) -> Result<ExecutionRequest, LinterError> {
        let use_bundler =
            config.use_bundler || (config.detect_bundler && self.bundler.detect(cwd).await);
        let command = command::resolve(
            &config.command,
            use_bundler,
            config.use_rubocop_cache,
            &extra_args,
        )?;

        Ok(ExecutionRequest::new(command, cwd)?
            .with_timeout(Duration::from_millis(config.timeout_ms)))
    }

    fn report_fix(&self, summary: &FixSummary, trigger: FixTrigger) {
        let notification = match (summary.outcome(), trigger) {
            (FixOutcome::NoOffenses, _) => Notification::info(summary.message()),
            (_, FixTrigger::Save) => return,
            (FixOutcome::AllCorrected, _) => Notification::success(summary.message()),
            (FixOutcome::PartiallyCorrected, _) => Notification::info(summary.message()),
        };
        self.notifier.notify(notification);
    }

    fn report_unexpected(&self, description: &str) {
        error!("Auto-correct failed: {}", description);
        self.notifier
            .notify(Notification::error(UNEXPECTED_ERROR_MSG).with_description(description));
    }
}

/// Parses a finished run and maps its offenses.
fn diagnostics_from(output: &RawOutput, file: &Path) -> Result<Vec<Diagnostic>, LinterError> {
    let parsed = parse_output(&output.stdout, &output.stderr)?;
    let version = parsed.version().ok_or(LinterError::MissingVersion)?;
    Ok(translate_all(version, parsed.offenses(), file))
}
