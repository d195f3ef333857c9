//! Data bridge — connects [`Controller`] streams to TUI actions.
//!
//! Runs as a background task: starts the controller's load driver, then
//! forwards every control list change and connectivity transition as an
//! [`Action`] through the TUI's action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use mixdeck_core::Controller;

use crate::action::Action;

/// Run the data bridge until `cancel` fires, then shut the controller down.
pub async fn spawn_data_bridge(
    controller: Controller,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut controls = controller.controls();
    let mut connectivity = controller.connectivity();

    controller.start().await;

    // Push initial snapshots so the screen has data immediately
    let _ = action_tx.send(Action::ControlsUpdated(controls.current().clone()));
    let state = *connectivity.borrow_and_update();
    let _ = action_tx.send(Action::ConnectivityChanged(state));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = connectivity.changed() => {
                let state = *connectivity.borrow_and_update();
                debug!(%state, "dispatching ConnectivityChanged");
                let _ = action_tx.send(Action::ConnectivityChanged(state));
            }
            Some(snapshot) = controls.changed() => {
                let _ = action_tx.send(Action::ControlsUpdated(snapshot));
            }
        }
    }

    controller.shutdown().await;
    debug!("data bridge shut down");
}
