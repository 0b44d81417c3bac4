use shared::domain::VisitId;
use thiserror::Error;

/// Every failure a doorbell operation can surface to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The HTTP exchange did not complete: refused, timed out, DNS, cut off mid-body.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered outside 200..=299.
    #[error("server error: {status}{}", detail_suffix(.detail))]
    Server { status: u16, detail: Option<String> },
    /// 2xx, but the body did not decode into the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("no api key configured for unlock")]
    MissingApiKey,
    #[error("visit {0} has no photo url")]
    MissingPhoto(VisitId),
    #[error("unlock not confirmed: {0}")]
    Unauthenticated(String),
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("doorbell client is shut down")]
    Shutdown,
}

impl ClientError {
    pub fn server(status: u16) -> Self {
        Self::Server {
            status,
            detail: None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(" ({detail})"))
        .unwrap_or_default()
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::MalformedResponse(err.to_string());
        }
        // reqwest hides the root cause behind a generic "error sending request".
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Network(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_display_includes_detail_when_present() {
        assert_eq!(ClientError::server(500).to_string(), "server error: 500");
        let err = ClientError::Server {
            status: 403,
            detail: Some("Invalid API key".into()),
        };
        assert_eq!(err.to_string(), "server error: 403 (Invalid API key)");
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_network());
    }

    #[test]
    fn missing_photo_names_visit() {
        assert_eq!(
            ClientError::MissingPhoto(VisitId(12)).to_string(),
            "visit 12 has no photo url"
        );
    }
}
