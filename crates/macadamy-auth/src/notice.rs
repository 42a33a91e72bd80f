//! User-facing notices.
//!
//! Every user-triggered operation ends in at most one toast-style notice.
//! Components emit them through a [`Notifier`]; the CLI collects them into its
//! response, the default notifier writes them to the log.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

pub const PRIMARY_ORGANIZATION_UPDATED: &str = "Primary organization updated";
pub const NO_LONGER_A_MEMBER: &str = "You are no longer a member of that organization.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(message = %notice.message, "notice"),
            NoticeLevel::Error => tracing::warn!(message = %notice.message, "notice"),
        }
    }
}

/// Keeps every notice in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything collected so far.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(
            &mut *self
                .notices
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notice);
    }
}

/// `[Module] Failed to <operation>: <message>` used for generic failures.
#[must_use]
pub fn backend_failure_message(module: &str, operation: &str, error: &dyn std::fmt::Display) -> String {
    let message = error.to_string();
    let message = if message.trim().is_empty() {
        "Unknown backend error".to_string()
    } else {
        message
    };
    format!("[{module}] Failed to {operation}: {message}")
}
