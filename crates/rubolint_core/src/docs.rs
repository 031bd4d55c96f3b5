//! Style guide documentation lookup with a time-limited cache.
//!
//! The whole style guide is one AsciiDoc file. A single download fills the
//! cache for every rule, and concurrent lookups share that download.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use regex::Regex;
use tracing::{debug, warn};

/// Default style guide source.
pub const DOC_URL: &str =
    "https://raw.githubusercontent.com/bbatsov/ruby-style-guide/master/README.adoc";

/// How long fetched documentation stays valid.
pub const DOCUMENTATION_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Timeout for the style guide request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

static RULE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"===.*\[\[(.*)\]\]").expect("marker regex is valid"));

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[source,ruby\]|----").expect("fence regex is valid"));

/// Extracts the rule anchor from a style guide link (`https://…#anchor`).
pub fn rule_anchor(url: &str) -> Option<&str> {
    if !url.starts_with("https://") {
        return None;
    }
    url.rsplit_once('#')
        .map(|(_, anchor)| anchor)
        .filter(|anchor| !anchor.is_empty())
}

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    expires_at: Instant,
}

/// Lazily fetched, process-wide documentation cache.
#[derive(Debug)]
pub struct DocumentationCache {
    url: String,
    lifetime: Duration,
    client: reqwest::Client,
    entries: RwLock<HashMap<String, CacheEntry>>,
    last_refresh: Mutex<Option<Instant>>,
    refresh: tokio::sync::Mutex<()>,
}

impl Default for DocumentationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentationCache {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            url: DOC_URL.to_string(),
            lifetime: DOCUMENTATION_LIFETIME,
            client,
            entries: RwLock::new(HashMap::new()),
            last_refresh: Mutex::new(None),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    /// Sets the style guide URL (for testing).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the entry lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Returns documentation for `anchor`.
    ///
    /// Fetch failures produce a short placeholder instead of an error.
    /// Returns `None` when the style guide has no such rule.
    pub async fn get_documentation(&self, anchor: &str) -> Option<String> {
        if let Some(text) = self.lookup(anchor) {
            return Some(text);
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(text) = self.lookup(anchor) {
            return Some(text);
        }
        if self.refreshed_recently() {
            debug!("No documentation for rule {}", anchor);
            return None;
        }

        match self.fetch().await {
            Ok(body) => {
                let count = self.populate(&body);
                debug!("Cached documentation for {} rules", count);
                self.lookup(anchor)
            }
            Err(placeholder) => Some(placeholder),
        }
    }

    /// Number of cached rules, including expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn lookup(&self, anchor: &str) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(anchor) {
                Some(entry) if now < entry.expires_at => return Some(entry.text.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Stale: drop it so the next lookup refetches.
        self.entries.write().remove(anchor);
        None
    }

    fn refreshed_recently(&self) -> bool {
        self.last_refresh
            .lock()
            .is_some_and(|at| at.elapsed() < self.lifetime)
    }

    async fn fetch(&self) -> Result<String, String> {
        debug!("Fetching style guide from {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            warn!("Failed to fetch style guide: {}", e);
            format!("***\nError retrieving documentation: {}", e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Style guide request failed: {}", status);
            let reason = status.canonical_reason().unwrap_or(status.as_str());
            return Err(format!("***\nError retrieving documentation: {}", reason));
        }

        response
            .text()
            .await
            .map_err(|e| format!("***\nError retrieving documentation: {}", e))
    }

    /// Splits the document into per-rule bodies and stores them all.
    fn populate(&self, document: &str) -> usize {
        let now = Instant::now();
        let expires_at = now + self.lifetime;
        let parsed = parse_style_guide(document);
        let count = parsed.len();

        let mut entries = self.entries.write();
        for (anchor, text) in parsed {
            entries.insert(anchor, CacheEntry { text, expires_at });
        }
        *self.last_refresh.lock() = Some(now);

        count
    }
}

/// Returns `(anchor, body)` for every rule marker in the style guide.
///
/// A rule's body is every line after its marker up to the next marker.
fn parse_style_guide(document: &str) -> Vec<(String, String)> {
    let lines: Vec<&str> = document.split('\n').collect();
    let markers: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            RULE_MARKER_RE
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|anchor| (idx, anchor.as_str().to_string()))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, (start, anchor))| {
            let end = markers.get(i + 1).map_or(lines.len(), |(next, _)| *next);
            let body = lines[start + 1..end].join("\n");
            let body = FENCE_RE.replace_all(&body, "");
            (anchor.clone(), body.trim().to_string())
        })
        .collect()
}
