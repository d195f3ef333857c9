// ── Update propagation ──
//
// Fire-and-forget delivery of local edits to the backend. Each control gets
// a lazily spawned worker fed by an unbounded queue; a worker sends one
// request at a time and folds everything queued meanwhile into the next
// request. Requests for one control are therefore ordered, and the last
// local value is the last one sent. Different controls proceed concurrently.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use mixdeck_api::{ControlPatch, MixerClient};

use crate::error::CoreError;
use crate::model::{Control, ControlChanges};

/// A backend write that did not succeed. Local state is left as it was.
#[derive(Debug)]
pub struct UpdateFailure {
    pub control_id: String,
    /// The body that was sent (possibly several coalesced edits).
    pub patch: ControlPatch,
    pub error: CoreError,
}

/// Observer for failed backend writes.
pub type FailureHook = Arc<dyn Fn(&UpdateFailure) + Send + Sync>;

/// Hook that does nothing. Failures are still logged by the worker.
pub fn noop_failure_hook() -> FailureHook {
    Arc::new(|_: &UpdateFailure| {})
}

struct Shared {
    client: MixerClient,
    hook: FailureHook,
    /// Edits accepted but not yet sent (or being sent).
    in_flight: watch::Sender<usize>,
    cancel: CancellationToken,
}

impl Shared {
    fn settle(&self, count: usize) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(count));
    }
}

struct Worker {
    tx: mpsc::UnboundedSender<ControlChanges>,
    handle: JoinHandle<()>,
}

pub(crate) struct Propagator {
    shared: Arc<Shared>,
    workers: DashMap<String, Worker>,
}

impl Propagator {
    pub(crate) fn new(client: MixerClient, hook: FailureHook, cancel: CancellationToken) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                client,
                hook,
                in_flight,
                cancel,
            }),
            workers: DashMap::new(),
        }
    }

    /// Queue `changes` for delivery to control `id`.
    ///
    /// Must be called from within a Tokio runtime; outside one the edit is
    /// dropped with a warning.
    pub(crate) fn enqueue(&self, id: &str, changes: ControlChanges) {
        if self.shared.cancel.is_cancelled() {
            debug!(id, "propagation stopped; keeping update local");
            return;
        }

        self.shared.in_flight.send_modify(|n| *n += 1);

        match self.workers.entry(id.to_owned()) {
            Entry::Occupied(mut entry) => {
                if let Err(mpsc::error::SendError(changes)) = entry.get().tx.send(changes) {
                    // The previous worker has exited.
                    match self.spawn_worker(id, changes) {
                        Some(worker) => {
                            entry.insert(worker);
                        }
                        None => {
                            entry.remove();
                        }
                    }
                }
            }
            Entry::Vacant(entry) => {
                if let Some(worker) = self.spawn_worker(id, changes) {
                    entry.insert(worker);
                }
            }
        }
    }

    /// Resolve once every queued edit has been sent (or has failed).
    pub(crate) async fn wait_idle(&self) {
        let mut rx = self.shared.in_flight.subscribe();
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Number of edits not yet delivered.
    pub(crate) fn pending(&self) -> usize {
        *self.shared.in_flight.borrow()
    }

    /// Retire the workers of controls that are no longer listed. A retired
    /// worker still delivers what it already holds, then exits.
    pub(crate) fn retain_controls(&self, controls: &[Arc<Control>]) {
        let before = self.workers.len();
        self.workers
            .retain(|id, _| controls.iter().any(|c| c.id == *id));
        let retired = before.saturating_sub(self.workers.len());
        if retired > 0 {
            debug!(retired, "retired workers of controls no longer listed");
        }
    }

    #[cfg(test)]
    fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Join every worker. The cancellation token must already be cancelled.
    pub(crate) async fn join(&self) {
        let ids: Vec<String> = self.workers.iter().map(|r| r.key().clone()).collect();
        for id in ids {
            if let Some((_, worker)) = self.workers.remove(&id) {
                drop(worker.tx);
                let _ = worker.handle.await;
            }
        }
    }

    /// Start a worker for `id` with `first` already queued. On failure the
    /// edit is settled as undeliverable.
    fn spawn_worker(&self, id: &str, first: ControlChanges) -> Option<Worker> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(id, "no async runtime; update not propagated");
            self.shared.settle(1);
            return None;
        };
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(first).is_err() {
            self.shared.settle(1);
            return None;
        }
        let handle = runtime.spawn(worker_task(id.to_owned(), rx, Arc::clone(&self.shared)));
        Some(Worker { tx, handle })
    }
}

// ── Worker task ──────────────────────────────────────────────────────

async fn worker_task(
    id: String,
    mut rx: mpsc::UnboundedReceiver<ControlChanges>,
    shared: Arc<Shared>,
) {
    loop {
        let first = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(changes) => changes,
                None => break,
            },
        };

        let mut pending = first;
        let mut batch = 1;
        while let Ok(newer) = rx.try_recv() {
            pending.merge(newer);
            batch += 1;
        }
        if batch > 1 {
            debug!(id = %id, batch, "coalesced queued updates");
        }

        let patch = ControlPatch::from(pending);
        let result = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => None,
            result = shared.client.update_control(&id, &patch) => Some(result),
        };
        match result {
            None => {
                shared.settle(batch);
                break;
            }
            Some(Ok(())) => debug!(id = %id, "update delivered"),
            Some(Err(e)) => {
                warn!(
                    id = %id,
                    error = %e,
                    transient = e.is_transient(),
                    "control update was not accepted by the backend"
                );
                let failure = UpdateFailure {
                    control_id: id.clone(),
                    patch,
                    error: CoreError::from(e),
                };
                (shared.hook)(&failure);
            }
        }
        shared.settle(batch);
    }

    // Anything still queued will never be sent.
    rx.close();
    while rx.try_recv().is_ok() {
        shared.settle(1);
    }
}
