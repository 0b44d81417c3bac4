//! Command orchestration helpers from console actions to the backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` for the backend. On failure returns the message to show the user.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), String> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued console->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err("Command queue is full; please retry".to_string()),
        Err(TrySendError::Disconnected(_)) => {
            Err("Backend worker disconnected (possible startup/runtime failure)".to_string())
        }
    }
}
