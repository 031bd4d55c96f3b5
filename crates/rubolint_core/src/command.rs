//! RuboCop command line construction and Bundler detection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::LinterError;

/// Flags every invocation needs so the output can be parsed.
pub const DEFAULT_ARGS: &[&str] = &["--force-exclusion", "--format", "json", "--display-style-guide"];

/// Appended unless RuboCop's result cache is enabled.
pub const NO_CACHE_ARGS: &[&str] = &["--cache", "false"];

const BUNDLE_EXEC: &[&str] = &["bundle", "exec"];

/// Builds the full argument vector, executable first.
///
/// `command` is split on whitespace. `bundle exec` is prepended when
/// `use_bundler` is set and the command does not already start with it.
pub fn resolve(
    command: &str,
    use_bundler: bool,
    use_rubocop_cache: bool,
    extra_args: &[String],
) -> Result<Vec<String>, LinterError> {
    let base: Vec<&str> = command.split_whitespace().collect();
    if base.is_empty() {
        return Err(LinterError::config("no rubocop command configured"));
    }

    let mut resolved = Vec::with_capacity(base.len() + extra_args.len() + 8);

    if use_bundler && !base.starts_with(BUNDLE_EXEC) {
        resolved.extend(BUNDLE_EXEC.iter().map(|s| s.to_string()));
    }
    resolved.extend(base.iter().map(|s| s.to_string()));
    resolved.extend(DEFAULT_ARGS.iter().map(|s| s.to_string()));
    if !use_rubocop_cache {
        resolved.extend(NO_CACHE_ARGS.iter().map(|s| s.to_string()));
    }
    resolved.extend(extra_args.iter().cloned());

    Ok(resolved)
}

/// Upper bound for one `bundle show rubocop` call.
pub const BUNDLE_SHOW_TIMEOUT: Duration = Duration::from_secs(10);

/// Remembers, per working directory, whether RuboCop is in the bundle.
///
/// Concurrent first lookups for the same directory share one `bundle` call.
#[derive(Debug)]
pub struct BundlerDetector {
    program: String,
    timeout: Duration,
    memo: Mutex<HashMap<PathBuf, Arc<OnceCell<bool>>>>,
}

impl Default for BundlerDetector {
    fn default() -> Self {
        Self {
            program: "bundle".to_string(),
            timeout: BUNDLE_SHOW_TIMEOUT,
            memo: Mutex::new(HashMap::new()),
        }
    }
}

impl BundlerDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs another `bundle` executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns whether `bundle show rubocop` succeeds in `cwd`.
    ///
    /// Directories without a `Gemfile` are never checked. A check that times
    /// out counts as "not bundled". The answer is kept for the session.
    pub async fn detect(&self, cwd: &Path) -> bool {
        let cell = self
            .memo
            .lock()
            .entry(cwd.to_path_buf())
            .or_default()
            .clone();

        *cell
            .get_or_init(|| async {
                let detected = cwd.join("Gemfile").is_file() && self.bundle_show(cwd).await;
                debug!("Bundled rubocop in {}: {}", cwd.display(), detected);
                detected
            })
            .await
    }

    /// Records an answer without running `bundle`.
    pub fn remember(&self, cwd: impl Into<PathBuf>, bundled: bool) {
        self.memo
            .lock()
            .insert(cwd.into(), Arc::new(OnceCell::new_with(Some(bundled))));
    }

    async fn bundle_show(&self, cwd: &Path) -> bool {
        let child = Command::new(&self.program)
            .args(["show", "rubocop"])
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!("Cannot run {}: {}", self.program, e);
                return false;
            }
        };

        match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                warn!("{} show rubocop failed: {}", self.program, e);
                false
            }
            Err(_) => {
                warn!(
                    "{} show rubocop timed out after {}ms",
                    self.program,
                    self.timeout.as_millis()
                );
                false
            }
        }
    }
}
