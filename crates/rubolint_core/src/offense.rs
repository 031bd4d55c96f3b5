//! Translation of RuboCop offenses into editor diagnostics.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::diagnostic::{Diagnostic, Location, Position, Range, Severity};
use crate::output::Offense;

/// A trailing ` (suffix)` that closes the message. Inner parentheticals and
/// line breaks are not part of a suffix.
static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(([^()\n]*)\)\s*$").expect("suffix regex is valid"));

/// How a RuboCop release formats offense messages in JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// The message already starts with the cop name (0.52.0 up to 0.68.0).
    EmbeddedCopName,
    /// The message is bare; the cop name has to be added.
    SeparateCopName,
}

impl MessageFormat {
    /// Picks the format for a reported tool version.
    ///
    /// Versions that cannot be read are assumed to be recent.
    pub fn for_version(version: &str) -> Self {
        let embedded_from = Version::new(0, 52, 0);
        let embedded_until = Version::new(0, 68, 0);

        match parse_version(version) {
            Some(v) if v >= embedded_from && v < embedded_until => MessageFormat::EmbeddedCopName,
            _ => MessageFormat::SeparateCopName,
        }
    }
}

/// Parses `1.2.3`, `v1.2` or `1`, padding missing components with zero.
fn parse_version(raw: &str) -> Option<Version> {
    let raw = raw.trim().trim_start_matches('v');
    if let Ok(v) = Version::parse(raw) {
        return Some(v);
    }

    let mut parts = raw.split('.').map(|p| p.parse::<u64>().ok());
    let major = parts.next()??;
    let minor = parts.next().unwrap_or(Some(0))?;
    let patch = parts.next().unwrap_or(Some(0))?;
    Some(Version::new(major, minor, patch))
}

/// Message split into the text shown to the user and an optional link.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SplitMessage<'a> {
    excerpt: &'a str,
    url: Option<&'a str>,
}

/// Peels the link and cop name suffixes off the end of `message`.
///
/// RuboCop emits at most `(CopName) (url)`, so two passes are enough.
fn split_message<'a>(message: &'a str, cop_name: &str) -> SplitMessage<'a> {
    let mut excerpt = message;
    let mut url = None;

    for _ in 0..2 {
        let Some(caps) = SUFFIX_RE.captures(excerpt) else {
            break;
        };
        let (Some(whole), Some(suffix)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let before = &excerpt[..whole.start()];
        let suffix = suffix.as_str();

        if url.is_none()
            && let Some(idx) = suffix.find("http")
        {
            url = Some(&suffix[idx..]);
            excerpt = before;
        } else if !cop_name.is_empty() && suffix == cop_name {
            excerpt = before;
        } else {
            break;
        }
    }

    SplitMessage { excerpt, url }
}

/// Converts RuboCop's 1-based location to a 0-based range.
fn offense_range(offense: &Offense) -> Range {
    match offense.location {
        Some(loc) => {
            let line = loc.line.saturating_sub(1);
            let column = loc.column.saturating_sub(1);
            Range::new(
                Position::new(line, column),
                Position::new(line, column.saturating_add(loc.length)),
            )
        }
        None => Range::TOP_OF_FILE,
    }
}

/// Maps one offense to one diagnostic.
pub fn translate(format: MessageFormat, offense: &Offense, file: &Path) -> Diagnostic {
    let split = split_message(&offense.message, &offense.cop_name);

    let excerpt = match format {
        MessageFormat::EmbeddedCopName => split.excerpt.to_string(),
        MessageFormat::SeparateCopName if offense.cop_name.is_empty() => split.excerpt.to_string(),
        MessageFormat::SeparateCopName => format!("{}: {}", offense.cop_name, split.excerpt),
    };

    Diagnostic {
        cop_name: Some(offense.cop_name.clone()).filter(|c| !c.is_empty()),
        url: split.url.map(str::to_string),
        excerpt,
        severity: Severity::from_rubocop(offense.severity.as_deref()),
        location: Location {
            file: file.to_path_buf(),
            position: offense_range(offense),
        },
    }
}

/// Maps all offenses, preserving order.
pub fn translate_all(version: &str, offenses: &[Offense], file: &Path) -> Vec<Diagnostic> {
    let format = MessageFormat::for_version(version);
    offenses
        .iter()
        .map(|offense| translate(format, offense, file))
        .collect()
}
