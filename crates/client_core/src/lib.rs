//! Client for the smart doorbell HTTP service: ring, unlock, and paged visit history.

use async_trait::async_trait;
use shared::domain::Visit;

pub mod config;
pub mod error;
pub mod history;
pub mod photo;
pub mod transport;
pub mod unlock_gate;
mod worker;

pub use config::{load_settings, ClientSettings, SettingsError};
pub use error::ClientError;
pub use history::HistoryPager;
pub use transport::DoorbellClient;
pub use unlock_gate::{gated_unlock, AlwaysVerified, GateOutcome, UnavailableReason, UnlockGate};
pub use worker::DoorbellService;

/// The operations the doorbell service exposes.
#[async_trait]
pub trait DoorbellApi: Send + Sync {
    /// Triggers the doorbell; the service captures a photo and records a visit.
    async fn ring_doorbell(&self) -> Result<Visit, ClientError>;
    /// Asks the service to release the lock. Requires the configured API key.
    async fn unlock_door(&self) -> Result<(), ClientError>;
    /// One page of visits in server order. An empty page means no data at `offset`.
    async fn visit_history(&self, limit: u32, offset: u32) -> Result<Vec<Visit>, ClientError>;
    async fn download_photo(&self, visit: &Visit) -> Result<Vec<u8>, ClientError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
