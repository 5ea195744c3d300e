//! Client error types.

use thiserror::Error;

/// Errors raised by the active-team mirror and its collaborators.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Network-level error (DNS, connection refused, timeout, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the server.
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Failed to deserialize the response body.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Local selection storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The requested team is not in the loaded team list.
    #[error("Team {0} is not available in the active organization")]
    UnknownTeam(String),
}

impl ClientError {
    #[cfg(feature = "http")]
    pub fn network(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }

    /// HTTP status code, if applicable.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
