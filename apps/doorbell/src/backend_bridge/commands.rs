//! Backend commands queued from the console to the backend worker.

use shared::domain::Visit;
use std::path::PathBuf;

#[derive(Debug)]
pub enum BackendCommand {
    Ring,
    Unlock,
    LoadHistoryPage { limit: u32, offset: u32 },
    SavePhoto { visit: Visit, path: PathBuf },
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Ring => "ring",
            BackendCommand::Unlock => "unlock",
            BackendCommand::LoadHistoryPage { .. } => "load_history_page",
            BackendCommand::SavePhoto { .. } => "save_photo",
            BackendCommand::Shutdown => "shutdown",
        }
    }
}
