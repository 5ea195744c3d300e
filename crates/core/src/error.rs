use thiserror::Error;

/// Active-context error types.
///
/// Each variant maps to an HTTP status code via [`ContextError::status_code`]
/// so a surrounding framework can surface it without re-classifying.
#[derive(Error, Debug)]
pub enum ContextError {
    // --- 400 Bad Request ---
    #[error("{0}")]
    BadRequest(String),

    // --- 401 Unauthorized ---
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Session not found or expired")]
    SessionNotFound,

    // --- 403 Forbidden ---
    #[error("{0}")]
    Forbidden(String),

    // --- 404 Not Found ---
    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    NotFound(String),

    // --- 409 Conflict ---
    #[error("{0}")]
    Conflict(String),

    // --- 500 Internal Server Error ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ContextError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthenticated | Self::SessionNotFound => 401,
            Self::Forbidden(_) => 403,
            Self::UserNotFound | Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Config(_) | Self::Database(_) | Self::Serialization(_) | Self::Internal(_) => {
                500
            }
        }
    }

    /// Message safe to show a client. Internal errors are masked.
    pub fn public_message(&self) -> String {
        match self.status_code() {
            500 => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    // --- Constructors ---

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

#[cfg(feature = "sqlx-postgres")]
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DatabaseError::Constraint(db_err.to_string())
                } else {
                    DatabaseError::Query(db_err.to_string())
                }
            }
            sqlx::Error::PoolClosed => DatabaseError::Connection("Pool closed".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::Connection("Pool timed out".to_string()),
            _ => DatabaseError::Query(err.to_string()),
        }
    }
}

#[cfg(feature = "sqlx-postgres")]
impl From<sqlx::Error> for ContextError {
    fn from(err: sqlx::Error) -> Self {
        ContextError::Database(DatabaseError::from(err))
    }
}

pub type ContextResult<T> = Result<T, ContextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ContextError::bad_request("x").status_code(), 400);
        assert_eq!(ContextError::SessionNotFound.status_code(), 401);
        assert_eq!(ContextError::forbidden("x").status_code(), 403);
        assert_eq!(ContextError::not_found("x").status_code(), 404);
        assert_eq!(ContextError::conflict("x").status_code(), 409);
        assert_eq!(
            ContextError::from(DatabaseError::Query("boom".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = ContextError::from(DatabaseError::Connection("10.0.0.3 refused".into()));
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(
            ContextError::forbidden("Not a member of this organization").public_message(),
            "Not a member of this organization"
        );
    }
}
