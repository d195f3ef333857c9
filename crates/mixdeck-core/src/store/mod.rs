// ── Control store ──
//
// Thread-safe storage for the mirrored control list. Mutations are
// broadcast to subscribers via `watch` channels.

mod collection;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{Control, ControlChanges};
use crate::stream::ControlStream;
use collection::ControlCollection;

/// Reactive store for the control list.
///
/// Writes are synchronous and visible to the next read; subscribers are
/// woken only when the list actually changed.
pub struct ControlStore {
    controls: ControlCollection,
    last_load: watch::Sender<Option<DateTime<Utc>>>,
}

impl ControlStore {
    pub fn new() -> Self {
        let (last_load, _) = watch::channel(None);
        Self {
            controls: ControlCollection::new(),
            last_load,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn controls_snapshot(&self) -> Arc<Vec<Arc<Control>>> {
        self.controls.snapshot()
    }

    pub fn control(&self, id: &str) -> Option<Arc<Control>> {
        self.controls.get(id)
    }

    pub fn subscribe_controls(&self) -> ControlStream {
        ControlStream::new(self.controls.subscribe())
    }

    /// When the list was last replaced by a settled load.
    pub fn last_load(&self) -> Option<DateTime<Utc>> {
        *self.last_load.borrow()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the whole list and stamp the load time.
    pub(crate) fn replace_controls(&self, controls: Vec<Control>) {
        self.controls.replace(controls);
        self.last_load.send_replace(Some(Utc::now()));
    }

    /// Merge `changes` into the control with `id`.
    ///
    /// Returns the subset that applied (see [`Control::apply`]), or `None`
    /// when the id is unknown.
    pub(crate) fn apply(&self, id: &str, changes: &ControlChanges) -> Option<ControlChanges> {
        self.controls.update(id, |control| control.apply(changes))
    }
}

impl Default for ControlStore {
    fn default() -> Self {
        Self::new()
    }
}
