//! Notifications
//!
//! Transient, stacking user messages. Nothing waits on a notification being dismissed.

use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

use mockall::automock;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::Timings;

/// Least extra display time errors get over other severities.
const ERROR_EXTRA: Duration = Duration::from_secs(1);

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The action succeeded.
    Success,

    /// The action failed.
    Error,

    /// The action was refused before it started.
    Warning,

    /// Neutral information.
    Info,
}

impl Severity {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Displays notifications.
#[automock]
pub trait Notifier {
    /// Show a dismissible message that expires after `duration`.
    fn show(&self, message: &str, severity: Severity, duration: Duration);
}

/// Severity-aware front for a [`Notifier`]. Errors stay up longer than everything else.
#[derive(Clone)]
pub struct NotificationSink {
    notifier: Rc<dyn Notifier>,
    duration: Duration,
    error_duration: Duration,
}

impl fmt::Debug for NotificationSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationSink")
            .field("duration", &self.duration)
            .field("error_duration", &self.error_duration)
            .finish_non_exhaustive()
    }
}

impl NotificationSink {
    /// Wrap `notifier` using the display times in `timings`.
    ///
    /// An error display time not longer than the default one is raised to the default plus a
    /// second.
    pub fn new(notifier: Rc<dyn Notifier>, timings: &Timings) -> Self {
        let duration = Duration::from_millis(timings.notification_ms);
        let mut error_duration = Duration::from_millis(timings.error_notification_ms);

        if error_duration <= duration {
            error_duration = duration.saturating_add(ERROR_EXTRA);

            warn!(
                configured_ms = timings.error_notification_ms,
                ?error_duration,
                "error notifications must outlast other notifications"
            );
        }

        Self {
            notifier,
            duration,
            error_duration,
        }
    }

    /// Default display time for `severity`.
    pub fn duration_for(&self, severity: Severity) -> Duration {
        match severity {
            Severity::Error => self.error_duration,
            Severity::Success | Severity::Warning | Severity::Info => self.duration,
        }
    }

    /// Show `message` for the default time of `severity`.
    pub fn show(&self, message: &str, severity: Severity) {
        self.notifier
            .show(message, severity, self.duration_for(severity));
    }

    /// Success message.
    pub fn success(&self, message: &str) {
        self.show(message, Severity::Success);
    }

    /// Error message.
    pub fn error(&self, message: &str) {
        self.show(message, Severity::Error);
    }

    /// Warning message.
    pub fn warning(&self, message: &str) {
        self.show(message, Severity::Warning);
    }

    /// Informational message.
    pub fn info(&self, message: &str) {
        self.show(message, Severity::Info);
    }
}

/// One displayed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Stable id, for dismissal.
    pub id: u64,

    /// Text.
    pub message: String,

    /// Severity.
    pub severity: Severity,

    /// Display time.
    pub duration: Duration,

    /// When it was shown.
    pub shown_at: Instant,
}

impl Notification {
    /// Whether the notification has run its course at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.duration
    }
}

#[derive(Debug, Default)]
struct StackState {
    next_id: u64,
    entries: Vec<Notification>,
}

/// In-memory notifier. New notifications stack below older ones; none replaces another.
#[derive(Debug, Default)]
pub struct NotificationStack {
    state: RefCell<StackState>,
}

impl NotificationStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification shown and not yet dismissed or pruned, oldest first.
    pub fn entries(&self) -> Vec<Notification> {
        self.state.borrow().entries.clone()
    }

    /// Notifications still on screen at `now`.
    pub fn visible_at(&self, now: Instant) -> Vec<Notification> {
        self.state
            .borrow()
            .entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .cloned()
            .collect()
    }

    /// Dismiss one notification. Returns whether it was present.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.entries.len();

        state.entries.retain(|entry| entry.id != id);

        state.entries.len() != before
    }

    /// Drop every notification expired at `now`, returning how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let mut state = self.state.borrow_mut();
        let before = state.entries.len();

        state.entries.retain(|entry| !entry.is_expired(now));

        before - state.entries.len()
    }

    /// Most recent notification.
    pub fn last(&self) -> Option<Notification> {
        self.state.borrow().entries.last().cloned()
    }
}

impl Notifier for NotificationStack {
    fn show(&self, message: &str, severity: Severity, duration: Duration) {
        info!(%severity, message, "notification");

        let mut state = self.state.borrow_mut();
        let id = state.next_id;

        state.next_id += 1;
        state.entries.push(Notification {
            id,
            message: message.to_string(),
            severity,
            duration,
            shown_at: Instant::now(),
        });
    }
}
