//! Backend-to-console events and error modeling.

use std::path::PathBuf;

use client_core::ClientError;
use shared::domain::{Visit, VisitId};

#[derive(Debug)]
pub enum UiEvent {
    BackendReady,
    BackendStopped,
    VisitorArrived(Visit),
    DoorUnlocked,
    HistoryPage(Vec<Visit>),
    PhotoSaved {
        visit_id: VisitId,
        path: PathBuf,
        bytes: usize,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Server,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Ring,
    Unlock,
    History,
    Photo,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Network(_) => UiErrorCategory::Transport,
            ClientError::Server { status: 401 | 403, .. }
            | ClientError::MissingApiKey
            | ClientError::Unauthenticated(_) => UiErrorCategory::Auth,
            ClientError::Server { .. } => UiErrorCategory::Server,
            ClientError::MalformedResponse(_)
            | ClientError::MissingPhoto(_)
            | ClientError::InvalidConfig(_) => UiErrorCategory::Validation,
            ClientError::Shutdown => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: describe_failure(context, err),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context,
            message: message.into(),
        }
    }

    pub fn startup(message: impl Into<String>) -> Self {
        Self::from_message(UiErrorContext::BackendStartup, message)
    }

    /// Auth failures on unlock mean the configured key is wrong or missing.
    pub fn requires_api_key_fix(&self) -> bool {
        self.category == UiErrorCategory::Auth && self.context == UiErrorContext::Unlock
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn describe_failure(context: UiErrorContext, err: &ClientError) -> String {
    match (context, err) {
        (_, ClientError::Network(cause)) => format!("Network error: {cause}"),
        (UiErrorContext::Unlock, ClientError::Server { status, .. }) => {
            format!("Unlock failed: {status}")
        }
        (UiErrorContext::Unlock, ClientError::MissingApiKey) => {
            "Unlock failed: no API key configured (set DOORBELL_API_KEY)".to_string()
        }
        (_, ClientError::Server { status, detail }) => match detail {
            Some(detail) => format!("Server error: {status} ({detail})"),
            None => format!("Server error: {status}"),
        },
        (_, other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_auth_failures_point_at_the_api_key() {
        let err = UiError::from_client(
            UiErrorContext::Unlock,
            &ClientError::Server {
                status: 403,
                detail: Some("Invalid API key".into()),
            },
        );
        assert_eq!(err.category(), UiErrorCategory::Auth);
        assert!(err.requires_api_key_fix());
        assert_eq!(err.message(), "Unlock failed: 403");

        let err = UiError::from_client(UiErrorContext::Unlock, &ClientError::MissingApiKey);
        assert!(err.requires_api_key_fix());
    }

    #[test]
    fn ring_failures_are_classified_by_kind() {
        let err = UiError::from_client(UiErrorContext::Ring, &ClientError::server(500));
        assert_eq!(err.category(), UiErrorCategory::Server);
        assert_eq!(err.message(), "Server error: 500");
        assert!(!err.requires_api_key_fix());

        let err = UiError::from_client(
            UiErrorContext::Ring,
            &ClientError::Network("connection refused".into()),
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.message(), "Network error: connection refused");
        assert_eq!(err.context(), UiErrorContext::Ring);
    }
}
