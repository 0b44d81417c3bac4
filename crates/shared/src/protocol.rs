use serde::{Deserialize, Serialize};

use crate::domain::VisitId;

pub const RING_PATH: &str = "/doorbell/ring";
pub const UNLOCK_PATH: &str = "/doorbell/unlock";
pub const HISTORY_PATH: &str = "/doorbell/history";
pub const API_KEY_HEADER: &str = "X-Api-Key";

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: u32,
    pub offset: u32,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            offset: 0,
        }
    }
}

/// Body of a successful unlock. The client only relies on the status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    #[serde(default)]
    pub message: Option<String>,
}

pub fn visit_photo_path(visit_id: VisitId) -> String {
    format!("/doorbell/visit/{}/photo", visit_id.0)
}
