//! # Notifications
//!
//! Toast messages pushed by workflows. Toasts with a duration expire on their
//! own and are pruned by [`ToastQueue::tick`]; toasts without one stay until
//! dismissed.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// How long the share-failed toast stays visible.
pub const SHARE_ERROR_DURATION_MS: u64 = 2_500;

/// Maximum toasts kept; the oldest is dropped first.
pub const MAX_TOASTS: usize = 5;

/// Toast severity level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    /// Neutral information
    #[default]
    Info,
    /// Completed action
    Success,
    /// Recoverable problem
    Warning,
    /// Failed action
    Error,
}

impl ToastLevel {
    /// Indicator symbol
    pub fn icon(self) -> &'static str {
        match self {
            Self::Info => "ℹ",
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Error => "✗",
        }
    }
}

/// A toast message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Toast {
    /// Stable id; pushing the same id replaces the earlier toast
    pub id: String,
    /// Title line
    pub title: String,
    /// Optional detail line
    pub message: Option<String>,
    /// Severity
    pub level: ToastLevel,
    /// Auto-dismiss after this many milliseconds
    pub duration_ms: Option<u64>,
}

impl Toast {
    /// Info toast without detail
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the severity
    #[must_use]
    pub fn with_level(mut self, level: ToastLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the detail line
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Auto-dismiss after `ms`
    #[must_use]
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Info toast
    pub fn info(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title).with_level(ToastLevel::Info)
    }

    /// Success toast
    pub fn success(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title).with_level(ToastLevel::Success)
    }

    /// Warning toast
    pub fn warning(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title).with_level(ToastLevel::Warning)
    }

    /// Error toast
    pub fn error(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title).with_level(ToastLevel::Error)
    }

    /// Check if this toast is an error level toast
    pub fn is_error(&self) -> bool {
        matches!(self.level, ToastLevel::Error)
    }
}

#[derive(Clone, Debug)]
struct Queued {
    toast: Toast,
    shown_at_ms: u64,
}

/// Shared queue of visible toasts. Clones share the queue.
#[derive(Clone, Debug, Default)]
pub struct ToastQueue {
    inner: Arc<Mutex<VecDeque<Queued>>>,
}

impl ToastQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `toast` at `now_ms`, replacing any toast with the same id.
    pub fn push(&self, toast: Toast, now_ms: u64) {
        let mut queue = self.inner.lock();
        queue.retain(|q| q.toast.id != toast.id);
        if queue.len() >= MAX_TOASTS {
            queue.pop_front();
        }
        tracing::debug!(id = %toast.id, level = ?toast.level, "toast shown");
        queue.push_back(Queued {
            toast,
            shown_at_ms: now_ms,
        });
    }

    /// Remove a toast by id, returning whether it was visible.
    pub fn dismiss(&self, id: &str) -> bool {
        let mut queue = self.inner.lock();
        let before = queue.len();
        queue.retain(|q| q.toast.id != id);
        queue.len() != before
    }

    /// Drop toasts whose duration has elapsed at `now_ms`; returns how many.
    pub fn tick(&self, now_ms: u64) -> usize {
        let mut queue = self.inner.lock();
        let before = queue.len();
        queue.retain(|q| match q.toast.duration_ms {
            Some(duration) => now_ms.saturating_sub(q.shown_at_ms) < duration,
            None => true,
        });
        before - queue.len()
    }

    /// Visible toasts, oldest first
    pub fn visible(&self) -> Vec<Toast> {
        self.inner.lock().iter().map(|q| q.toast.clone()).collect()
    }

    /// Most recent toast
    pub fn latest(&self) -> Option<Toast> {
        self.inner.lock().back().map(|q| q.toast.clone())
    }

    /// Remove everything
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_error_expires() {
        let toasts = ToastQueue::new();
        toasts.push(
            Toast::error("share", "Could not share").with_duration_ms(SHARE_ERROR_DURATION_MS),
            1_000,
        );
        toasts.push(Toast::info("sticky", "Verification pending"), 1_000);

        assert_eq!(toasts.tick(3_499), 0);
        assert_eq!(toasts.tick(3_500), 1);
        let visible = toasts.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "sticky");
    }

    #[test]
    fn test_same_id_replaces() {
        let toasts = ToastQueue::new();
        toasts.push(Toast::warning("kyc", "first"), 0);
        toasts.push(Toast::error("kyc", "second"), 10);
        assert_eq!(toasts.visible().len(), 1);
        assert!(toasts.latest().unwrap().is_error());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let toasts = ToastQueue::new();
        for i in 0..=MAX_TOASTS {
            toasts.push(Toast::info(format!("t{i}"), "x"), 0);
        }
        let visible = toasts.visible();
        assert_eq!(visible.len(), MAX_TOASTS);
        assert_eq!(visible[0].id, "t1");
        assert!(toasts.dismiss("t1"));
        assert!(!toasts.dismiss("t1"));
    }
}
