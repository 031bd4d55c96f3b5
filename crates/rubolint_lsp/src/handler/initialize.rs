//! Initialize and shutdown handlers.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::info;

use crate::config::apply_settings;
use crate::handler::code_action::FIX_FILE_COMMAND;
use crate::state::BackendState;

/// Handles the `initialize` LSP request.
#[allow(deprecated)]
pub async fn handle_initialize(
    state: &BackendState,
    params: InitializeParams,
) -> Result<InitializeResult> {
    info!("rubolint LSP server initializing...");

    let root = params
        .root_uri
        .as_ref()
        .or_else(|| {
            params
                .workspace_folders
                .as_ref()
                .and_then(|folders| folders.first())
                .map(|folder| &folder.uri)
        })
        .and_then(|uri| uri.to_file_path().ok());
    if let Some(root) = root {
        info!("Project root: {}", root.display());
        state.linter.set_project_root(Some(root));
    }

    if let Some(options) = &params.initialization_options {
        apply_settings(state, options);
    }

    Ok(InitializeResult {
        capabilities: server_capabilities(),
        server_info: Some(ServerInfo {
            name: "rubolint-lsp".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    })
}

fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(false),
                })),
                ..Default::default()
            },
        )),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
            code_action_kinds: Some(vec![CodeActionKind::SOURCE_FIX_ALL]),
            resolve_provider: Some(false),
            work_done_progress_options: Default::default(),
        })),
        execute_command_provider: Some(ExecuteCommandOptions {
            commands: vec![FIX_FILE_COMMAND.to_string()],
            work_done_progress_options: Default::default(),
        }),
        ..Default::default()
    }
}

/// Handles the `initialized` LSP notification.
pub async fn handle_initialized(client: &tower_lsp::Client) {
    client
        .log_message(MessageType::INFO, "rubolint LSP server initialized!")
        .await;
}

/// Handles the `shutdown` LSP request.
pub async fn handle_shutdown() -> Result<()> {
    info!("rubolint LSP server shutting down...");
    Ok(())
}
