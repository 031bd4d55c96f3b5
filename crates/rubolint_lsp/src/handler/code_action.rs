//! Code action and command handlers for auto-correct.

use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::{debug, warn};

/// Command that runs `rubocop --auto-correct` on a file.
pub const FIX_FILE_COMMAND: &str = "rubolint.fixFile";

const FIX_FILE_TITLE: &str = "Fix file with RuboCop";

/// Handles the `textDocument/codeAction` request.
///
/// Offers a single source action that runs [`FIX_FILE_COMMAND`].
pub async fn handle_code_action(params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
    debug!("Code action request: {}", params.text_document.uri);

    let uri = params.text_document.uri;
    if uri.to_file_path().is_err() {
        return Ok(None);
    }

    let wanted = match &params.context.only {
        Some(only) => only
            .iter()
            .any(|kind| *kind == CodeActionKind::SOURCE || *kind == CodeActionKind::SOURCE_FIX_ALL),
        None => true,
    };
    if !wanted {
        return Ok(Some(Vec::new()));
    }

    let action = CodeAction {
        title: FIX_FILE_TITLE.to_string(),
        kind: Some(CodeActionKind::SOURCE_FIX_ALL),
        command: Some(Command {
            title: FIX_FILE_TITLE.to_string(),
            command: FIX_FILE_COMMAND.to_string(),
            arguments: Some(vec![Value::String(uri.to_string())]),
        }),
        ..Default::default()
    };

    Ok(Some(vec![CodeActionOrCommand::CodeAction(action)]))
}

/// Extracts the target document of a `workspace/executeCommand` request.
///
/// Returns `None` for unknown commands or a missing URI argument.
pub fn fix_file_target(params: &ExecuteCommandParams) -> Option<Url> {
    if params.command != FIX_FILE_COMMAND {
        warn!("Unknown command: {}", params.command);
        return None;
    }

    let uri = params.arguments.first()?.as_str()?;
    match Url::parse(uri) {
        Ok(uri) => Some(uri),
        Err(e) => {
            warn!("Invalid document URI {}: {}", uri, e);
            None
        }
    }
}
