//! Debouncing utilities for LSP notifications.

use std::future::Future;
use std::time::Duration;

use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::state::SharedState;

/// Default debounce delay in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Spawns a debounced validation task.
///
/// Waits for the debounce period, then runs `validate` only if `version` is
/// still the document's latest version.
pub fn spawn_debounced_validation<F, Fut>(state: SharedState, uri: Url, version: i32, validate: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(DEFAULT_DEBOUNCE_MS)).await;

        if state.is_current(&uri, version) {
            validate().await;
        } else {
            debug!("Skipping outdated version {} of {}", version, uri);
        }
    });
}
