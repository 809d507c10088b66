use crate::validation::ValidationError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced to callers of the client and the gateway.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },
    /// The session could not be refreshed; the caller must sign in again.
    #[error("session expired")]
    SessionExpired,
    #[error("response error: {0}")]
    Parse(String),
    #[error("request error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// HTTP status of an upstream rejection, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("Failed to decode response: {err}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_includes_status_and_message() {
        let err = Error::Http {
            status: 404,
            message: "Propiedad no encontrada".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "request failed (404): Propiedad no encontrada"
        );
        assert_eq!(err.status(), Some(404));
        assert_eq!(Error::SessionExpired.status(), None);
    }

    #[test]
    fn validation_error_is_transparent() {
        let err = Error::from(ValidationError::Required("email"));
        assert_eq!(err.to_string(), "email is required");
    }
}
