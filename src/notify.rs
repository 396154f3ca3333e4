//! User feedback channel.
//!
//! The board reports outcomes through a [`Notifier`]; delivery is
//! fire-and-forget and nothing waits for acknowledgment.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

/// Severity level for a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(label)
    }
}

/// A single feedback message
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub timestamp: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            timestamp: Instant::now(),
        }
    }
}

/// Sink for user-facing feedback
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);

    fn success(&self, message: &str) {
        self.notify(message, Severity::Success);
    }

    fn error(&self, message: &str) {
        self.notify(message, Severity::Error);
    }

    fn warning(&self, message: &str) {
        self.notify(message, Severity::Warning);
    }

    fn info(&self, message: &str) {
        self.notify(message, Severity::Info);
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, message: &str, severity: Severity) {
        (**self).notify(message, severity);
    }
}

/// Forwards notifications to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::error!(target: "ticketboard::notify", "{message}"),
            Severity::Warning => tracing::warn!(target: "ticketboard::notify", "{message}"),
            Severity::Success | Severity::Info => {
                tracing::info!(target: "ticketboard::notify", %severity, "{message}")
            }
        }
    }
}

/// Keeps every notification in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Notification> {
        self.entries
            .lock()
            .iter()
            .filter(|n| n.severity == severity)
            .cloned()
            .collect()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        tracing::trace!(%severity, "{message}");
        self.entries.lock().push(Notification::new(message, severity));
    }
}
