//! Hover handler showing cop details and style guide documentation.

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::{debug, error};

use rubolint_core::Diagnostic as RubolintDiagnostic;

use crate::conversion::{from_lsp_position, to_lsp_range};
use crate::state::SharedState;

/// Handles the `textDocument/hover` request.
///
/// Documentation is only fetched here, the first time a diagnostic with a
/// style guide link is hovered.
pub async fn handle_hover(state: &SharedState, params: HoverParams) -> Result<Option<Hover>> {
    let uri = &params.text_document_position_params.text_document.uri;
    let position = from_lsp_position(params.text_document_position_params.position);

    let diagnostic = {
        let docs = match state.documents.read() {
            Ok(guard) => guard,
            Err(e) => {
                error!("Documents lock poisoned: {}", e);
                return Ok(None);
            }
        };
        docs.get(uri).and_then(|doc| {
            doc.diagnostics
                .iter()
                .find(|d| d.location.position.contains(position))
                .cloned()
        })
    };

    let Some(diagnostic) = diagnostic else {
        return Ok(None);
    };
    debug!("Hover on {:?} in {}", diagnostic.cop_name, uri);

    let description = diagnostic
        .description(state.linter.documentation())
        .await;

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover_markdown(&diagnostic, description.as_deref()),
        }),
        range: Some(to_lsp_range(&diagnostic.location.position)),
    }))
}

fn hover_markdown(diag: &RubolintDiagnostic, description: Option<&str>) -> String {
    let mut out = String::new();

    match (&diag.cop_name, &diag.url) {
        (Some(cop), Some(url)) => out.push_str(&format!("**[{}]({})**\n\n", cop, url)),
        (Some(cop), None) => out.push_str(&format!("**{}**\n\n", cop)),
        _ => {}
    }
    out.push_str(&diag.excerpt);

    if let Some(description) = description.filter(|d| !d.is_empty()) {
        out.push_str("\n\n");
        out.push_str(description);
    }

    out
}
