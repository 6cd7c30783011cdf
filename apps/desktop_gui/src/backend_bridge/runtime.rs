//! Backend worker: owns the tokio runtime, the local store and the directory controller.

use std::{thread, time::Duration};

use client_core::{DirectoryController, DirectoryError, RandomUserClient, ViewState};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use storage::Storage;
use tokio::sync::watch;

use crate::backend_bridge::commands::BackendCommand;
use crate::config::BackendConfig;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::avatar::decode_avatar;

type Directory = DirectoryController<Storage, RandomUserClient>;

const VIEW_UPDATE_RETRY: Duration = Duration::from_millis(25);

pub fn launch(
    config: BackendConfig,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run(config, cmd_rx, ui_tx));
    })
}

async fn run(config: BackendConfig, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let client = match RandomUserClient::with_timeout(config.endpoint.clone(), config.http_timeout)
    {
        Ok(client) => client,
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("backend worker startup failure: failed to build http client: {err}"),
            )));
            tracing::error!("failed to build http client: {err}");
            return;
        }
    };
    tracing::info!(endpoint = %client.endpoint(), "backend worker ready");

    let mut directory = open_directory(&config, &client, &ui_tx).await;

    while let Ok(cmd) = cmd_rx.recv() {
        tracing::debug!(command = cmd.name(), "backend command received");
        match cmd {
            BackendCommand::Delete { id } => {
                let Some(directory) = directory.as_mut() else {
                    report_unavailable(&ui_tx, UiErrorContext::Delete);
                    continue;
                };
                if let Err(err) = directory.delete(&id).await {
                    tracing::error!(user_id = %id, "delete failed: {err}");
                    report(&ui_tx, UiErrorContext::Delete, &err);
                }
            }
            BackendCommand::Refresh => {
                let Some(directory) = directory.as_mut() else {
                    report_unavailable(&ui_tx, UiErrorContext::Refresh);
                    continue;
                };
                match directory.refresh().await {
                    Ok(source) => tracing::info!(?source, "directory refreshed"),
                    Err(err) => {
                        tracing::error!("refresh failed: {err}");
                        report(&ui_tx, UiErrorContext::Refresh, &err);
                    }
                }
            }
            BackendCommand::Retry => {
                if directory.is_none() {
                    directory = open_directory(&config, &client, &ui_tx).await;
                } else if let Some(existing) = directory.as_mut() {
                    if let Err(err) = existing.retry().await {
                        tracing::warn!("retry failed: {err}");
                    }
                }
            }
            BackendCommand::FetchAvatar { id, url } => {
                let client = client.clone();
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let event = match client.fetch_image_bytes(&url).await {
                        Ok(bytes) => match decode_avatar(&bytes) {
                            Ok(image) => UiEvent::AvatarLoaded { id, image },
                            Err(reason) => {
                                tracing::warn!(user_id = %id, "avatar decode failed: {reason}");
                                UiEvent::AvatarFailed { id, reason }
                            }
                        },
                        Err(err) => {
                            tracing::debug!(user_id = %id, "avatar download failed: {err}");
                            UiEvent::AvatarFailed {
                                id,
                                reason: format!("Failed to download avatar: {err}"),
                            }
                        }
                    };
                    let _ = ui_tx.try_send(event);
                });
            }
        }
    }

    tracing::info!("ui command queue closed; backend worker exiting");
}

/// Opens the store and runs the first load. `None` means the store could not be opened.
async fn open_directory(
    config: &BackendConfig,
    client: &RandomUserClient,
    ui_tx: &Sender<UiEvent>,
) -> Option<Directory> {
    let storage = match Storage::new(&config.database_url).await {
        Ok(storage) => storage,
        Err(err) => {
            let failure = DirectoryError::from(err).to_failure();
            tracing::error!(
                database_url = %config.database_url,
                "failed to open local store: {}",
                failure.message
            );
            let _ = ui_tx.try_send(UiEvent::StartupFailed(failure));
            return None;
        }
    };

    let mut directory = DirectoryController::new(storage, client.clone(), config.options);
    let _ = forward_view_updates(directory.subscribe(), ui_tx.clone());

    match directory.initialize().await {
        Ok(source) => tracing::info!(?source, count = directory.state().count(), "directory loaded"),
        Err(err) => tracing::warn!("initial load failed: {err}"),
    }

    Some(directory)
}

/// Forwards controller snapshots to the UI. A full queue is retried with the newest
/// snapshot, so the last published state always gets through.
fn forward_view_updates(
    mut updates: watch::Receiver<ViewState>,
    ui_tx: Sender<UiEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            loop {
                let snapshot = updates.borrow_and_update().clone();
                match ui_tx.try_send(UiEvent::ViewChanged(snapshot)) {
                    Ok(()) => break,
                    Err(TrySendError::Full(_)) => {
                        tracing::debug!("ui queue full; retrying view update");
                        tokio::time::sleep(VIEW_UPDATE_RETRY).await;
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        tracing::info!("ui queue closed; stopping view updates");
                        return;
                    }
                }
            }
        }
    })
}

fn report(ui_tx: &Sender<UiEvent>, context: UiErrorContext, err: &DirectoryError) {
    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_failure(
        context,
        &err.to_failure(),
    )));
}

fn report_unavailable(ui_tx: &Sender<UiEvent>, context: UiErrorContext) {
    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
        context,
        "local storage is not open; press Retry",
    )));
}

#[cfg(test)]
#[path = "../tests/runtime_tests.rs"]
mod tests;
