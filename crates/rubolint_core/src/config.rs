//! Linter configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::LinterError;

/// RuboCop's own configuration file, looked up from the linted file upwards.
pub const RUBOCOP_CONFIG_FILE: &str = ".rubocop.yml";

/// Project-local settings file, read from the project root.
pub const PROJECT_SETTINGS_FILE: &str = ".rubolint.json";

/// Default process timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Configuration for the linter.
///
/// Hosts keep one instance alive and update it whenever the user changes a
/// setting. Every lint reads a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinterConfig {
    /// Base command, e.g. `rubocop` or `bundle exec rubocop --config x.yml`.
    pub command: String,

    /// Skip linting when no `.rubocop.yml` is found.
    pub disable_when_no_config_file: bool,

    /// Always prefix the command with `bundle exec`.
    pub use_bundler: bool,

    /// Run `bundle show rubocop` when a Gemfile is present.
    pub detect_bundler: bool,

    /// Read overrides from `.rubolint.json` in the project root.
    pub detect_project_settings: bool,

    /// Process timeout in milliseconds.
    pub timeout_ms: u64,

    /// Let RuboCop use its result cache (otherwise `--cache false`).
    pub use_rubocop_cache: bool,

    /// Run auto-correct when a file is saved.
    pub fix_on_save: bool,
}

impl LinterConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            command: "rubocop".to_string(),
            disable_when_no_config_file: false,
            use_bundler: false,
            detect_bundler: true,
            detect_project_settings: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            use_rubocop_cache: false,
            fix_on_save: false,
        }
    }

    /// Loads configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LinterError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| LinterError::config(format!("Failed to read config: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parses configuration from a JSON string. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, LinterError> {
        serde_json::from_str(json)
            .map_err(|e| LinterError::config(format!("Invalid config: {}", e)))
    }

    /// Returns a copy with the present keys of `settings` applied on top.
    pub fn with_overrides(&self, settings: &ProjectSettings) -> Self {
        let mut config = self.clone();
        if let Some(command) = &settings.command {
            config.command = command.clone();
        }
        if let Some(v) = settings.disable_when_no_config_file {
            config.disable_when_no_config_file = v;
        }
        if let Some(v) = settings.use_bundler {
            config.use_bundler = v;
        }
        if let Some(v) = settings.detect_bundler {
            config.detect_bundler = v;
        }
        if let Some(v) = settings.timeout_ms {
            config.timeout_ms = v;
        }
        if let Some(v) = settings.use_rubocop_cache {
            config.use_rubocop_cache = v;
        }
        if let Some(v) = settings.fix_on_save {
            config.fix_on_save = v;
        }
        config
    }

    /// Applies project settings from `project_dir` if enabled.
    pub fn resolve_for_project(&self, project_dir: &Path) -> Self {
        if !self.detect_project_settings {
            return self.clone();
        }
        match ProjectSettings::load(project_dir) {
            Some(settings) => {
                debug!("Applying project settings from {}", project_dir.display());
                self.with_overrides(&settings)
            }
            None => self.clone(),
        }
    }
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-project overrides. Only keys present in the file take effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub command: Option<String>,
    pub disable_when_no_config_file: Option<bool>,
    pub use_bundler: Option<bool>,
    pub detect_bundler: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub use_rubocop_cache: Option<bool>,
    pub fix_on_save: Option<bool>,
}

impl ProjectSettings {
    /// Reads `.rubolint.json` from `project_dir`.
    ///
    /// A missing file yields `None`. An unreadable or invalid file is logged
    /// and also yields `None`.
    pub fn load(project_dir: &Path) -> Option<Self> {
        let path = project_dir.join(PROJECT_SETTINGS_FILE);
        if !path.is_file() {
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("Ignoring invalid {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Walks from `start` (a file or directory) up to the filesystem root and
/// returns the first `name` found.
pub fn find_upward(start: &Path, name: &str) -> Option<PathBuf> {
    let first = if start.is_dir() {
        Some(start)
    } else {
        start.parent()
    };

    first?
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
