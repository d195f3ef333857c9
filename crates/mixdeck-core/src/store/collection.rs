// ── Reactive control collection ──
//
// Ordered storage with push-based change notification. The snapshot held
// by the `watch` sender *is* the storage: every mutation runs under the
// channel's write lock and publishes a fresh `Arc<Vec<Arc<Control>>>`.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::Control;

pub(crate) type Snapshot = Arc<Vec<Arc<Control>>>;

/// Ordered, reactive list of controls keyed by `id`.
///
/// List order is the backend's order and is preserved across updates.
/// Unchanged entries are shared between consecutive snapshots.
pub(crate) struct ControlCollection {
    snapshot: watch::Sender<Snapshot>,
}

impl ControlCollection {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self { snapshot }
    }

    /// Replace the whole list.
    pub(crate) fn replace(&self, controls: Vec<Control>) {
        let values: Vec<Arc<Control>> = controls.into_iter().map(Arc::new).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    /// Run `f` against a copy of the control with `id` and publish the
    /// result if it differs.
    ///
    /// Returns `None` (and notifies nobody) when no such control exists.
    pub(crate) fn update<R>(&self, id: &str, f: impl FnOnce(&mut Control) -> R) -> Option<R> {
        let mut result = None;
        self.snapshot.send_if_modified(|snap| {
            let Some(pos) = snap.iter().position(|c| c.id == id) else {
                return false;
            };
            let mut control = Control::clone(&snap[pos]);
            result = Some(f(&mut control));
            if control == *snap[pos] {
                return false;
            }
            let mut next = Vec::clone(snap);
            next[pos] = Arc::new(control);
            *snap = Arc::new(next);
            true
        });
        result
    }

    /// Look up a control by id.
    pub(crate) fn get(&self, id: &str) -> Option<Arc<Control>> {
        self.snapshot.borrow().iter().find(|c| c.id == id).cloned()
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }
}
