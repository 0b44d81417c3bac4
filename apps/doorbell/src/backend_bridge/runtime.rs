//! Runtime bridge between the console command queue and the doorbell service.

use std::thread::{self, JoinHandle};

use client_core::{ClientSettings, DoorbellApi, DoorbellService};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Starts the backend thread. It owns the async runtime and the service; results come
/// back to the console thread as [`UiEvent`]s in the order commands were queued.
pub fn launch(
    settings: ClientSettings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.send(UiEvent::Error(UiError::startup(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                ))));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let service = match DoorbellService::connect(&settings) {
                Ok(service) => service,
                Err(err) => {
                    tracing::error!(error = %err, "failed to start doorbell client");
                    let _ = ui_tx.send(UiEvent::Error(UiError::from_client(
                        UiErrorContext::BackendStartup,
                        &err,
                    )));
                    return;
                }
            };
            let _ = ui_tx.send(UiEvent::BackendReady);

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend received command");
                let event = match cmd {
                    BackendCommand::Ring => match service.ring_doorbell().await {
                        Ok(visit) => UiEvent::VisitorArrived(visit),
                        Err(err) => UiEvent::Error(UiError::from_client(UiErrorContext::Ring, &err)),
                    },
                    BackendCommand::Unlock => match service.unlock_door().await {
                        Ok(()) => UiEvent::DoorUnlocked,
                        Err(err) => {
                            UiEvent::Error(UiError::from_client(UiErrorContext::Unlock, &err))
                        }
                    },
                    BackendCommand::LoadHistoryPage { limit, offset } => {
                        match service.visit_history(limit, offset).await {
                            Ok(visits) => UiEvent::HistoryPage(visits),
                            Err(err) => {
                                UiEvent::Error(UiError::from_client(UiErrorContext::History, &err))
                            }
                        }
                    }
                    BackendCommand::SavePhoto { visit, path } => {
                        match service.download_photo(&visit).await {
                            Ok(bytes) => match tokio::fs::write(&path, &bytes).await {
                                Ok(()) => UiEvent::PhotoSaved {
                                    visit_id: visit.id,
                                    path,
                                    bytes: bytes.len(),
                                },
                                Err(err) => UiEvent::Error(UiError::from_message(
                                    UiErrorContext::Photo,
                                    format!("failed to write '{}': {err}", path.display()),
                                )),
                            },
                            Err(err) => {
                                UiEvent::Error(UiError::from_client(UiErrorContext::Photo, &err))
                            }
                        }
                    }
                    BackendCommand::Shutdown => break,
                };
                if ui_tx.send(event).is_err() {
                    break;
                }
            }

            service.shutdown().await;
            let _ = ui_tx.send(UiEvent::BackendStopped);
        });
    })
}
