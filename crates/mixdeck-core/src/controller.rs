// ── Controller abstraction ──
//
// Lifecycle management for one mixer backend: the load/retry state
// machine, optimistic local updates, and fire-and-forget propagation.
// All state lives in the `ControlStore` and in `watch` channels, so
// consumers observe it without polling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use mixdeck_api::{MixerClient, TransportConfig};

use crate::config::ControllerConfig;
use crate::convert::controls_from_records;
use crate::error::CoreError;
use crate::fallback::fallback_controls;
use crate::model::{Control, ControlChanges};
use crate::propagate::{noop_failure_hook, FailureHook, Propagator};
use crate::store::ControlStore;
use crate::stream::ControlStream;

// ── ConnectivityState ────────────────────────────────────────────

/// Where the control list came from, observable by consumers.
///
/// `Loading → Connected | Simulated` on every load; a retry moves any
/// settled state back to `Loading`. Failed updates never change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ConnectivityState {
    /// A fetch is in progress.
    Loading,
    /// The list mirrors the backend; edits are propagated.
    Connected,
    /// The backend could not be read; the fallback dataset is shown and
    /// edits stay local.
    #[strum(serialize = "Simulation Mode")]
    Simulated,
}

impl ConnectivityState {
    pub fn is_loading(self) -> bool {
        self == Self::Loading
    }
}

// ── UpdateOutcome ────────────────────────────────────────────────

/// Which phases of an update ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No control with that id; nothing happened.
    Unknown,
    /// Applied locally only (not connected, or nothing left to send).
    Local,
    /// Applied locally and queued for the backend.
    Propagating,
}

/// Receiver of update intents from control widgets.
pub trait UpdateSink {
    fn apply_update(&self, id: &str, changes: ControlChanges) -> UpdateOutcome;
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Call
/// [`start()`](Self::start) to run the initial load in the background and
/// to honor [`retry()`](Self::retry) requests.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: MixerClient,
    store: Arc<ControlStore>,
    connectivity: watch::Sender<ConnectivityState>,
    /// Bumped by every retry. A load only publishes its result if the
    /// counter still holds the value it started with.
    retry: watch::Sender<u64>,
    propagator: Propagator,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a Controller that logs failed updates and reports them nowhere
    /// else. Does NOT fetch anything yet.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        Self::with_failure_hook(config, noop_failure_hook())
    }

    /// Create a Controller that reports every failed backend write to `hook`.
    pub fn with_failure_hook(
        config: ControllerConfig,
        hook: FailureHook,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            ..TransportConfig::default()
        };
        let client = MixerClient::new(config.base_url.clone(), &transport)?;
        let (connectivity, _) = watch::channel(ConnectivityState::Loading);
        let (retry, _) = watch::channel(0u64);
        let cancel = CancellationToken::new();
        let propagator = Propagator::new(client.clone(), hook, cancel.child_token());

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                store: Arc::new(ControlStore::new()),
                connectivity,
                retry,
                propagator,
                cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Access the underlying store.
    pub fn store(&self) -> &Arc<ControlStore> {
        &self.inner.store
    }

    /// The backend base URL that is (or was) probed.
    pub fn base_url(&self) -> &Url {
        self.inner.client.base_url()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the load driver: one load now, one more per retry.
    ///
    /// Returns immediately. Calling it again is a no-op.
    pub async fn start(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            return;
        }

        let retry = self.inner.retry.subscribe();
        let ctrl = self.clone();
        let cancel = self.inner.cancel.clone();
        handles.push(tokio::spawn(load_task(ctrl, retry, cancel)));
        debug!(url = %self.base_url(), "load driver started");
    }

    /// Stop the load driver and the propagation workers and wait for them.
    ///
    /// Edits still queued at this point are dropped.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        self.inner.propagator.join().await;
        debug!("controller shut down");
    }

    /// Fetch the control list and settle connectivity.
    ///
    /// Success replaces the list and yields `Connected`. Any failure
    /// (transport, status, malformed body) installs the fallback dataset and
    /// yields `Simulated`; it is logged, never returned. If a retry arrives
    /// while the fetch is in flight the result is discarded and the state
    /// stays `Loading`.
    pub async fn load(&self) -> ConnectivityState {
        let generation = *self.inner.retry.borrow();
        self.inner.connectivity.send_replace(ConnectivityState::Loading);
        debug!(url = %self.base_url(), "loading controls");

        let outcome = self.fetch_controls().await;
        self.settle(generation, outcome);
        *self.inner.connectivity.borrow()
    }

    /// Request a fresh load. The state is `Loading` when this returns; the
    /// driver spawned by [`start()`](Self::start) performs the fetch.
    pub fn retry(&self) {
        if self.inner.retry.receiver_count() == 0 {
            warn!("retry requested while the load driver is not running");
            return;
        }
        self.inner.retry.send_modify(|n| *n = n.wrapping_add(1));
        self.inner.connectivity.send_replace(ConnectivityState::Loading);
        info!(url = %self.base_url(), "retrying backend connection");
    }

    /// Resolve once the current load has settled.
    pub async fn wait_settled(&self) -> ConnectivityState {
        let mut rx = self.inner.connectivity.subscribe();
        match rx.wait_for(|s| !s.is_loading()).await {
            Ok(state) => *state,
            Err(_) => *self.inner.connectivity.borrow(),
        }
    }

    /// Resolve once no update is waiting to be sent.
    pub async fn wait_idle(&self) {
        self.inner.propagator.wait_idle().await;
    }

    /// Number of edits accepted but not yet delivered.
    pub fn pending_updates(&self) -> usize {
        self.inner.propagator.pending()
    }

    // ── Updates ──────────────────────────────────────────────────

    /// Apply `changes` to control `id` locally, then forward what applied
    /// to the backend if connected.
    ///
    /// The local write is visible to the next read regardless of how the
    /// backend responds. Unknown ids are ignored without notifying anyone.
    pub fn apply_update(&self, id: &str, changes: ControlChanges) -> UpdateOutcome {
        let Some(applied) = self.inner.store.apply(id, &changes) else {
            debug!(id, "update for unknown control ignored");
            return UpdateOutcome::Unknown;
        };

        if (changes.value.is_some() && applied.value.is_none())
            || (changes.is_muted.is_some() && applied.is_muted.is_none())
        {
            warn!(
                id,
                ?changes,
                ?applied,
                "dropped parts of an update that do not fit the control"
            );
        }

        if applied.is_empty() || self.connectivity_state() != ConnectivityState::Connected {
            return UpdateOutcome::Local;
        }

        self.inner.propagator.enqueue(id, applied);
        UpdateOutcome::Propagating
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connectivity changes.
    pub fn connectivity(&self) -> watch::Receiver<ConnectivityState> {
        self.inner.connectivity.subscribe()
    }

    /// Current connectivity.
    pub fn connectivity_state(&self) -> ConnectivityState {
        *self.inner.connectivity.borrow()
    }

    pub fn controls(&self) -> ControlStream {
        self.inner.store.subscribe_controls()
    }

    pub fn controls_snapshot(&self) -> Arc<Vec<Arc<Control>>> {
        self.inner.store.controls_snapshot()
    }

    pub fn control(&self, id: &str) -> Option<Arc<Control>> {
        self.inner.store.control(id)
    }

    // ── Internals ────────────────────────────────────────────────

    async fn fetch_controls(&self) -> Result<Vec<Control>, CoreError> {
        let records = self.inner.client.list_controls().await?;
        Ok(controls_from_records(records, self.inner.config.range_policy))
    }

    /// Publish a load result unless a retry superseded it.
    fn settle(&self, generation: u64, outcome: Result<Vec<Control>, CoreError>) {
        let inner = &self.inner;
        inner.connectivity.send_if_modified(|state| {
            if *inner.retry.borrow() != generation {
                debug!("discarding load result superseded by a retry");
                return false;
            }

            *state = match outcome {
                Ok(controls) => {
                    info!(
                        count = controls.len(),
                        url = %inner.client.base_url(),
                        "connected to mixer backend"
                    );
                    inner.store.replace_controls(controls);
                    ConnectivityState::Connected
                }
                Err(e) => {
                    warn!(error = %e, "mixer backend unavailable; entering simulation mode");
                    inner.store.replace_controls(fallback_controls());
                    ConnectivityState::Simulated
                }
            };
            inner
                .propagator
                .retain_controls(&inner.store.controls_snapshot());
            true
        });
    }
}

impl UpdateSink for Controller {
    fn apply_update(&self, id: &str, changes: ControlChanges) -> UpdateOutcome {
        Controller::apply_update(self, id, changes)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Run one load now and another each time the retry counter moves.
async fn load_task(
    controller: Controller,
    mut retry: watch::Receiver<u64>,
    cancel: CancellationToken,
) {
    loop {
        retry.mark_unchanged();

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            state = controller.load() => debug!(%state, "load settled"),
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = retry.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
