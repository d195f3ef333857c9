//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use mixdeck_core::{ConnectivityState, Control, ControlChanges};

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }
}

/// Every state transition in the TUI is driven by an Action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Lifecycle ───────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Overlays ────────────────────────────────────────────────────
    ToggleHelp,
    Notify(Notification),

    // ── Backend ─────────────────────────────────────────────────────
    /// Re-run the initial load.
    Retry,
    ConnectivityChanged(ConnectivityState),
    ControlsUpdated(Arc<Vec<Arc<Control>>>),

    // ── Edits ───────────────────────────────────────────────────────
    /// A widget produced a change set for control `id`.
    UpdateControl { id: String, changes: ControlChanges },
}
