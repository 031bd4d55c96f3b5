//! Interfaces the linter calls into on the host editor.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

/// Read access to an open editor buffer.
pub trait TextBuffer {
    /// Path on disk, `None` for unsaved scratch buffers.
    fn path(&self) -> Option<&Path>;

    /// Current buffer contents.
    fn text(&self) -> &str;

    /// Whether the buffer differs from what is on disk.
    fn is_modified(&self) -> bool;
}

/// A plain in-memory buffer, used by the CLI and the LSP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: Option<PathBuf>,
    pub text: String,
    pub modified: bool,
}

impl Document {
    /// A buffer that matches the file on disk.
    pub fn saved(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            text: text.into(),
            modified: false,
        }
    }

    /// A buffer with edits that are not on disk yet.
    pub fn modified(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            text: text.into(),
            modified: true,
        }
    }
}

impl TextBuffer for Document {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn is_modified(&self) -> bool {
        self.modified
    }
}

/// Kind of user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// A message for the host's notification area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            description: None,
        }
    }

    /// Attaches a longer description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Keeps notifications in memory. Useful for hosts that render them later
/// and for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything recorded so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.inner.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.inner.lock().push(notification);
    }
}
