use async_trait::async_trait;
use tracing::{info, warn};

use crate::{error::ClientError, DoorbellApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    NoHardware,
    HardwareUnavailable,
    NoneEnrolled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Verified,
    /// The device cannot run the check at all. Unlock proceeds without it.
    Unavailable(UnavailableReason),
    Rejected(String),
}

/// A presence check run on the user's device before the door is unlocked.
#[async_trait]
pub trait UnlockGate: Send + Sync {
    async fn verify(&self) -> GateOutcome;
}

pub struct AlwaysVerified;

#[async_trait]
impl UnlockGate for AlwaysVerified {
    async fn verify(&self) -> GateOutcome {
        GateOutcome::Verified
    }
}

/// Runs `gate`, then unlocks unless the check was rejected.
pub async fn gated_unlock<A, G>(api: &A, gate: &G) -> Result<(), ClientError>
where
    A: DoorbellApi + ?Sized,
    G: UnlockGate + ?Sized,
{
    match gate.verify().await {
        GateOutcome::Verified => {}
        GateOutcome::Unavailable(reason) => {
            info!(?reason, "presence check unavailable; unlocking without it");
        }
        GateOutcome::Rejected(message) => {
            warn!(%message, "presence check rejected; door stays locked");
            return Err(ClientError::Unauthenticated(message));
        }
    }
    api.unlock_door().await
}
