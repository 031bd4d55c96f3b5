//! LSP type conversion utilities.

use tower_lsp::lsp_types::{
    CodeDescription, Diagnostic, DiagnosticSeverity, MessageType, NumberOrString, Position, Range,
    Url,
};

use rubolint_core::{
    Diagnostic as RubolintDiagnostic, NotificationKind, Position as RubolintPosition,
    Range as RubolintRange, Severity as RubolintSeverity,
};

/// Source shown next to every diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "rubocop";

/// Converts a rubolint diagnostic to an LSP diagnostic.
pub fn to_lsp_diagnostic(diag: &RubolintDiagnostic) -> Diagnostic {
    let severity = match diag.severity {
        RubolintSeverity::Error => DiagnosticSeverity::ERROR,
        RubolintSeverity::Warning => DiagnosticSeverity::WARNING,
        RubolintSeverity::Info => DiagnosticSeverity::INFORMATION,
    };

    Diagnostic {
        range: to_lsp_range(&diag.location.position),
        severity: Some(severity),
        code: diag.cop_name.clone().map(NumberOrString::String),
        code_description: diag
            .url
            .as_deref()
            .and_then(|url| Url::parse(url).ok())
            .map(|href| CodeDescription { href }),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: diag.excerpt.clone(),
        ..Default::default()
    }
}

pub fn to_lsp_range(range: &RubolintRange) -> Range {
    Range::new(
        Position::new(range.start.line, range.start.column),
        Position::new(range.end.line, range.end.column),
    )
}

pub fn from_lsp_position(pos: Position) -> RubolintPosition {
    RubolintPosition::new(pos.line, pos.character)
}

/// Success has no LSP counterpart and is shown as info.
pub fn to_message_type(kind: NotificationKind) -> MessageType {
    match kind {
        NotificationKind::Error => MessageType::ERROR,
        NotificationKind::Info | NotificationKind::Success => MessageType::INFO,
    }
}
