//! rubolint LSP Server
//!
//! Language Server Protocol host for the RuboCop integration.
//! Provides diagnostics, hover documentation and auto-correct in editors.

mod config;
mod conversion;
mod debounce;
mod handler;
mod notifier;
mod state;

use std::sync::Arc;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use rubolint_core::{Document, FixTrigger, Linter, LinterConfig};

use crate::conversion::to_lsp_diagnostic;
use crate::notifier::ClientNotifier;
use crate::state::{BackendState, SharedState};

pub use crate::handler::FIX_FILE_COMMAND;

/// The LSP backend for rubolint.
#[derive(Clone)]
pub struct Backend {
    /// LSP client for sending notifications.
    client: Client,
    /// Shared state
    state: SharedState,
}

impl Backend {
    /// Creates a new backend with the given client.
    ///
    /// Starts with default settings; the client's settings arrive with
    /// `initialize` or `workspace/didChangeConfiguration`.
    pub fn new(client: Client) -> Self {
        let notifier = Arc::new(ClientNotifier::new(client.clone()));
        let linter = Linter::new(LinterConfig::new(), notifier);

        Self {
            client,
            state: Arc::new(BackendState::new(linter)),
        }
    }

    /// Lints a buffer and publishes the result.
    ///
    /// A run without result (superseded, timed out, failed to start) leaves
    /// the published diagnostics as they are.
    async fn validate_document(&self, uri: Url, document: Document, version: Option<i32>) {
        debug!("Validating document: {}", uri);

        let Some(diagnostics) = self.state.linter.analyze(&document).await else {
            debug!("No lint result for {}", uri);
            return;
        };

        let lsp_diagnostics: Vec<Diagnostic> = diagnostics.iter().map(to_lsp_diagnostic).collect();
        if !self.state.store_diagnostics(&uri, diagnostics) {
            debug!("{} was closed while linting", uri);
            return;
        }
        self.client
            .publish_diagnostics(uri, lsp_diagnostics, version)
            .await;
    }

    /// Lints the on-disk version of an open document.
    async fn validate_saved(&self, uri: Url) {
        let Some(mut document) = self.state.buffer(&uri) else {
            debug!("Skipping validation for {}", uri);
            return;
        };
        document.modified = false;
        self.validate_document(uri, document, None).await;
    }

    /// Runs auto-correct on a file and re-lints it.
    async fn fix_file(&self, uri: Url, trigger: FixTrigger) {
        let document = match self.state.buffer(&uri) {
            Some(document) => document,
            None => {
                let Ok(path) = uri.to_file_path() else {
                    warn!("Cannot fix non-file document {}", uri);
                    return;
                };
                match tokio::fs::read_to_string(&path).await {
                    Ok(text) => Document::saved(path, text),
                    Err(e) => {
                        warn!("Failed to read {}: {}", path.display(), e);
                        return;
                    }
                }
            }
        };

        if let Some(summary) = self.state.linter.autocorrect(&document, trigger).await {
            debug!(
                "Fixed {} of {} offenses in {}",
                summary.corrected, summary.offense_count, uri
            );
            self.validate_saved(uri).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handler::handle_initialize(&self.state, params).await
    }

    async fn initialized(&self, _: InitializedParams) {
        handler::handle_initialized(&self.client).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handler::handle_shutdown().await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let (uri, version) = handler::handle_did_open(&self.state, params).await;
        if let Some(document) = self.state.buffer(&uri) {
            self.validate_document(uri, document, Some(version)).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some((uri, version)) = handler::handle_did_change(&self.state, params).await else {
            return;
        };

        let backend = self.clone();
        debounce::spawn_debounced_validation(
            self.state.clone(),
            uri.clone(),
            version,
            move || async move {
                if let Some(document) = backend.state.buffer(&uri) {
                    backend
                        .validate_document(uri, document, Some(version))
                        .await;
                }
            },
        );
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = handler::handle_did_save(&self.state, params).await;

        if self.state.linter.config().fix_on_save {
            self.fix_file(uri, FixTrigger::Save).await;
        } else {
            self.validate_saved(uri).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = handler::handle_did_close(&self.state, params).await;

        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if !config::apply_settings(&self.state, &params.settings) {
            return;
        }

        info!("Configuration changed, re-linting open documents");
        for uri in self.state.open_documents() {
            if let Some(document) = self.state.buffer(&uri) {
                self.validate_document(uri, document, None).await;
            }
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        handler::handle_hover(&self.state, params).await
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        handler::handle_code_action(params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        if let Some(uri) = handler::fix_file_target(&params) {
            self.fix_file(uri, FixTrigger::Command).await;
        }
        Ok(None)
    }
}

/// Starts the LSP server.
///
/// This function does not return unless an error occurs or the server shuts down.
pub async fn run() {
    info!("rubolint LSP server starting...");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
