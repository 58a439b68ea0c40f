use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by the transport, the credential store and the form
/// validators. Payloads are plain strings so one refresh outcome can be
/// handed to every queued request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http {
        status: u16,
        message: String,
        detail: Option<String>,
    },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Authorization expired: {0}")]
    AuthorizationExpired(String),
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("{0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns the backend's `detail` message when the failure carried one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::AuthorizationExpired(_) => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout("Request timed out. Please try again.".to_string())
        } else if err.is_builder() {
            Self::Serialization(format!("Failed to build request: {err}"))
        } else if err.is_decode() {
            Self::Parse(format!("Failed to decode response: {err}"))
        } else {
            Self::Network(format!("Unable to reach the server: {err}"))
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("Invalid URL: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn http_error_exposes_detail_and_status() {
        let err = Error::Http {
            status: 400,
            message: r#"{"detail":"No active account"}"#.to_string(),
            detail: Some("No active account".to_string()),
        };
        assert_eq!(err.detail(), Some("No active account"));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn display_matches_user_facing_format() {
        let err = Error::Http {
            status: 500,
            message: "boom".to_string(),
            detail: None,
        };
        assert_eq!(err.to_string(), "Request failed (500): boom");
        assert_eq!(
            Error::Validation("This field is required".to_string()).to_string(),
            "This field is required"
        );
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let err = Error::AuthorizationExpired("expired".to_string());
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.detail(), None);
    }
}
