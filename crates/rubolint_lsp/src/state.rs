//! LSP Backend state management.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tower_lsp::lsp_types::Url;
use tracing::error;

use rubolint_core::{Diagnostic, Document, Linter};

/// An open document as last seen by the server.
#[derive(Debug)]
pub(crate) struct DocumentData {
    pub text: String,
    pub version: i32,
    /// Edited since it was last opened or saved.
    pub modified: bool,
    /// Diagnostics last published, kept for hover.
    pub diagnostics: Vec<Diagnostic>,
}

impl DocumentData {
    pub fn opened(text: String, version: i32) -> Self {
        Self {
            text,
            version,
            modified: false,
            diagnostics: Vec::new(),
        }
    }
}

/// Shared backend state.
pub(crate) struct BackendState {
    /// Open documents.
    pub documents: RwLock<HashMap<Url, DocumentData>>,
    /// The linter, alive for the whole session.
    pub linter: Linter,
}

impl fmt::Debug for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendState")
            .field("documents", &"<HashMap<Url, DocumentData>>")
            .field("linter", &"<Linter>")
            .finish()
    }
}

impl BackendState {
    pub fn new(linter: Linter) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            linter,
        }
    }

    /// Builds a core buffer for `uri` from the stored document.
    ///
    /// Returns `None` for non-file URIs and documents that are not open.
    pub fn buffer(&self, uri: &Url) -> Option<Document> {
        let path = uri.to_file_path().ok()?;
        let docs = match self.documents.read() {
            Ok(guard) => guard,
            Err(e) => {
                error!("Documents lock poisoned: {}", e);
                return None;
            }
        };
        docs.get(uri).map(|doc| Document {
            path: Some(path),
            text: doc.text.clone(),
            modified: doc.modified,
        })
    }

    /// Whether `version` is still the latest version of `uri`.
    pub fn is_current(&self, uri: &Url, version: i32) -> bool {
        let docs = match self.documents.read() {
            Ok(g) => g,
            Err(e) => {
                error!("Documents lock poisoned: {}", e);
                return false;
            }
        };

        docs.get(uri)
            .map(|doc| doc.version == version)
            .unwrap_or(false)
    }

    /// Replaces the diagnostics kept for `uri`.
    ///
    /// Returns `false` when the document is no longer open.
    pub fn store_diagnostics(&self, uri: &Url, diagnostics: Vec<Diagnostic>) -> bool {
        match self.documents.write() {
            Ok(mut docs) => match docs.get_mut(uri) {
                Some(doc) => {
                    doc.diagnostics = diagnostics;
                    true
                }
                None => false,
            },
            Err(e) => {
                error!("Documents lock poisoned: {}", e);
                false
            }
        }
    }

    /// URIs of every open document.
    pub fn open_documents(&self) -> Vec<Url> {
        match self.documents.read() {
            Ok(docs) => docs.keys().cloned().collect(),
            Err(e) => {
                error!("Documents lock poisoned: {}", e);
                Vec::new()
            }
        }
    }
}

/// Type alias for shared state.
pub type SharedState = Arc<BackendState>;
