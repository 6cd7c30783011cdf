//! Command orchestration helpers from UI actions to backend command queue.

use client_core::view::Action;
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn command_for_action(action: Action) -> BackendCommand {
    match action {
        Action::Refresh => BackendCommand::Refresh,
        Action::Retry => BackendCommand::Retry,
        Action::Delete(id) => BackendCommand::Delete { id },
    }
}

/// Queues a command, writing a status line instead when the queue cannot take it.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = "Backend worker disconnected; restart the application".to_string();
            false
        }
    }
}
