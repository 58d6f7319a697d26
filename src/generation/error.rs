//! Error types for calls to the image generation API.

use crate::error::FatalUpstreamError;
use std::fmt;

/// Category of a failed upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// HTTP 5xx from the API
    Server { status: u16 },
    /// Connection, timeout or other transport failure
    Network,
    /// No candidates, no inline image, undecodable or too-small payload
    MalformedResponse,
    /// Quota exhausted or rate limited (HTTP 429)
    QuotaExceeded,
    /// API key rejected (HTTP 401/403)
    InvalidCredentials,
    /// Any other status; retried in case it is transient
    Unexpected { status: u16 },
}

/// A single failed upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Server { status }, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Network, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::MalformedResponse, message)
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::QuotaExceeded, message)
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::InvalidCredentials, message)
    }

    pub fn unexpected(status: u16, message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Unexpected { status }, message)
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self.kind,
            UpstreamErrorKind::QuotaExceeded | UpstreamErrorKind::InvalidCredentials
        )
    }

    /// The caller-facing error for a non-retryable failure; `None` for retryable ones.
    pub fn into_fatal(self) -> Option<FatalUpstreamError> {
        match self.kind {
            UpstreamErrorKind::QuotaExceeded => Some(FatalUpstreamError::QuotaExceeded(self.message)),
            UpstreamErrorKind::InvalidCredentials => {
                Some(FatalUpstreamError::InvalidCredentials(self.message))
            }
            _ => None,
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            UpstreamErrorKind::Server { status } => {
                write!(f, "Server error (HTTP {}): {}", status, self.message)
            }
            UpstreamErrorKind::Network => write!(f, "Network error: {}", self.message),
            UpstreamErrorKind::MalformedResponse => {
                write!(f, "Malformed response: {}", self.message)
            }
            UpstreamErrorKind::QuotaExceeded => write!(f, "Quota exceeded: {}", self.message),
            UpstreamErrorKind::InvalidCredentials => {
                write!(f, "Invalid credentials: {}", self.message)
            }
            UpstreamErrorKind::Unexpected { status } => {
                write!(f, "Unexpected response (HTTP {}): {}", status, self.message)
            }
        }
    }
}

impl std::error::Error for UpstreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(UpstreamError::server(500, "INTERNAL").is_retryable());
        assert!(UpstreamError::network("connection reset").is_retryable());
        assert!(UpstreamError::malformed("no candidates").is_retryable());
        assert!(UpstreamError::unexpected(418, "teapot").is_retryable());
        assert!(!UpstreamError::quota("429").is_retryable());
        assert!(!UpstreamError::credentials("API key not valid").is_retryable());
    }

    #[test]
    fn test_into_fatal() {
        assert_eq!(
            UpstreamError::quota("slow down").into_fatal(),
            Some(FatalUpstreamError::QuotaExceeded("slow down".to_string()))
        );
        assert!(UpstreamError::server(503, "busy").into_fatal().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            UpstreamError::server(500, "INTERNAL").to_string(),
            "Server error (HTTP 500): INTERNAL"
        );
    }
}
