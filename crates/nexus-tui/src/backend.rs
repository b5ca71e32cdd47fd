//! Background task driving the run controller.

use tokio::sync::mpsc;
use tracing::{debug, info};

use nexus_client::{Orchestrator, SubmitOutcome, TaskController};

use crate::event::{BackendCommand, RunSnapshot, UiEvent};

/// Run the backend loop.
///
/// This function runs in a separate thread with its own tokio runtime. It
/// waits for commands from the UI and, while a stream is open, interleaves
/// them with stream frames. Every state change is published as a snapshot.
pub async fn run_backend<O: Orchestrator>(
    mut controller: TaskController<O>,
    ui_tx: mpsc::Sender<UiEvent>,
    mut cmd_rx: mpsc::Receiver<BackendCommand>,
) {
    info!("Backend started");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(BackendCommand::Submit(description)) => {
                        if deploy(&mut controller, &description, &ui_tx, &mut cmd_rx).await {
                            break;
                        }
                    }
                    Some(BackendCommand::Quit) | None => {
                        info!("Received quit command, shutting down backend");
                        break;
                    }
                }
            }

            open = controller.pump(), if controller.is_streaming() => {
                publish(&controller, &ui_tx).await;
                if !open {
                    debug!(phase = %controller.phase(), "Stream closed");
                }
            }
        }
    }

    info!("Backend shutdown complete");
}

/// Start a run and wait for its submission. Returns true if a quit arrived
/// while the submission was in flight.
async fn deploy<O: Orchestrator>(
    controller: &mut TaskController<O>,
    description: &str,
    ui_tx: &mpsc::Sender<UiEvent>,
    cmd_rx: &mut mpsc::Receiver<BackendCommand>,
) -> bool {
    if let Err(e) = controller.begin(description) {
        debug!(error = %e, "Deploy ignored");
        return false;
    }
    publish(controller, ui_tx).await;

    let outcome = {
        let send = controller.send();
        tokio::pin!(send);
        loop {
            tokio::select! {
                outcome = &mut send => break outcome,
                cmd = cmd_rx.recv() => match cmd {
                    Some(BackendCommand::Submit(_)) => {
                        debug!("Deploy ignored: run in progress");
                    }
                    Some(BackendCommand::Quit) | None => {
                        info!("Quit requested during submission");
                        return true;
                    }
                },
            }
        }
    };

    if let SubmitOutcome::Failed(message) = outcome {
        let _ = ui_tx.send(UiEvent::Error(message)).await;
    }
    publish(controller, ui_tx).await;
    false
}

async fn publish<O: Orchestrator>(controller: &TaskController<O>, ui_tx: &mpsc::Sender<UiEvent>) {
    let snapshot = RunSnapshot::capture(controller.session());
    let _ = ui_tx.send(UiEvent::RunUpdated(snapshot)).await;
}
