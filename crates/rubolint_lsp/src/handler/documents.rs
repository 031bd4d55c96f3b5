//! Document lifecycle handlers (open, change, save, close).

use tower_lsp::lsp_types::*;
use tracing::{debug, error};

use crate::state::{DocumentData, SharedState};

/// Handles the `textDocument/didOpen` notification.
///
/// Returns the URI and version to validate.
pub async fn handle_did_open(state: &SharedState, params: DidOpenTextDocumentParams) -> (Url, i32) {
    debug!("Document opened: {}", params.text_document.uri);

    let uri = params.text_document.uri;
    let version = params.text_document.version;
    match state.documents.write() {
        Ok(mut docs) => {
            docs.insert(
                uri.clone(),
                DocumentData::opened(params.text_document.text, version),
            );
        }
        Err(e) => error!("Documents lock poisoned: {}", e),
    }

    (uri, version)
}

/// Handles the `textDocument/didChange` notification.
///
/// Returns the URI and version for debounced validation.
pub async fn handle_did_change(
    state: &SharedState,
    params: DidChangeTextDocumentParams,
) -> Option<(Url, i32)> {
    debug!("Document changed: {}", params.text_document.uri);

    // Full sync: the last change carries the whole text.
    let change = params.content_changes.into_iter().last()?;
    let uri = params.text_document.uri;
    let version = params.text_document.version;

    let mut docs = match state.documents.write() {
        Ok(guard) => guard,
        Err(e) => {
            error!("Documents lock poisoned: {}", e);
            return None;
        }
    };
    let doc = docs
        .entry(uri.clone())
        .or_insert_with(|| DocumentData::opened(String::new(), version));
    doc.text = change.text;
    doc.version = version;
    doc.modified = true;

    Some((uri, version))
}

/// Handles the `textDocument/didSave` notification.
pub async fn handle_did_save(state: &SharedState, params: DidSaveTextDocumentParams) -> Url {
    debug!("Document saved: {}", params.text_document.uri);

    let uri = params.text_document.uri;
    match state.documents.write() {
        Ok(mut docs) => {
            if let Some(doc) = docs.get_mut(&uri) {
                if let Some(text) = params.text {
                    doc.text = text;
                }
                doc.modified = false;
            }
        }
        Err(e) => error!("Documents lock poisoned: {}", e),
    }

    uri
}

/// Handles the `textDocument/didClose` notification.
pub async fn handle_did_close(state: &SharedState, params: DidCloseTextDocumentParams) -> Url {
    debug!("Document closed: {}", params.text_document.uri);

    match state.documents.write() {
        Ok(mut docs) => {
            docs.remove(&params.text_document.uri);
        }
        Err(e) => error!("Documents lock poisoned: {}", e),
    }

    params.text_document.uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BackendState;
    use rubolint_core::{Linter, LinterConfig, NullNotifier};
    use std::sync::Arc;

    fn state() -> SharedState {
        Arc::new(BackendState::new(Linter::new(
            LinterConfig::new(),
            Arc::new(NullNotifier),
        )))
    }

    fn uri() -> Url {
        Url::parse("file:///tmp/app.rb").unwrap()
    }

    #[tokio::test]
    async fn change_marks_modified_and_save_clears_it() {
        let state = state();
        handle_did_open(
            &state,
            DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri(),
                    language_id: "ruby".to_string(),
                    version: 1,
                    text: "puts 1\n".to_string(),
                },
            },
        )
        .await;
        assert!(!state.buffer(&uri()).unwrap().modified);

        let changed = handle_did_change(
            &state,
            DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: uri(),
                    version: 2,
                },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: "puts 2\n".to_string(),
                }],
            },
        )
        .await;
        assert_eq!(changed, Some((uri(), 2)));
        let buffer = state.buffer(&uri()).unwrap();
        assert!(buffer.modified);
        assert_eq!(buffer.text, "puts 2\n");

        handle_did_save(
            &state,
            DidSaveTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: uri() },
                text: None,
            },
        )
        .await;
        assert!(!state.buffer(&uri()).unwrap().modified);
    }

    #[tokio::test]
    async fn close_forgets_document() {
        let state = state();
        handle_did_open(
            &state,
            DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri(),
                    language_id: "ruby".to_string(),
                    version: 1,
                    text: String::new(),
                },
            },
        )
        .await;

        let closed = handle_did_close(
            &state,
            DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: uri() },
            },
        )
        .await;

        assert_eq!(closed, uri());
        assert!(state.buffer(&uri()).is_none());
    }
}
