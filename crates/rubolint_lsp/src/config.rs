//! Configuration management for LSP server.
//!
//! Clients send settings as `{ "rubocop": { ... } }`, both in
//! `initializationOptions` and in `workspace/didChangeConfiguration`.

use serde_json::Value;
use tracing::{info, warn};

use rubolint_core::LinterConfig;

use crate::state::BackendState;

/// Settings section read from the client.
pub const SETTINGS_SECTION: &str = "rubocop";

/// Extracts the linter configuration from a client settings object.
///
/// Keys missing from the section take their defaults. Returns `None` when
/// there is no section or it does not deserialize.
pub fn settings_from_value(value: &Value) -> Option<LinterConfig> {
    let section = value.get(SETTINGS_SECTION)?;
    match serde_json::from_value(section.clone()) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Ignoring invalid `{}` settings: {}", SETTINGS_SECTION, e);
            None
        }
    }
}

/// Applies client settings to the linter. Returns whether anything changed.
pub fn apply_settings(state: &BackendState, value: &Value) -> bool {
    let Some(config) = settings_from_value(value) else {
        return false;
    };
    if config == state.linter.config() {
        return false;
    }

    info!("Applying client settings");
    state.linter.set_config(config);
    true
}
