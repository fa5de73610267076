//! Error types for the stack backend client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the stack backend
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (backend unreachable, connection reset, ...)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Credentials were missing, invalid or insufficient
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The backend refused the requested operation
    #[error("Operation rejected: {0}")]
    Rejected(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The stack (or the resource asked about) does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Create an error from a non-success status code and message
    ///
    /// 401 and 403 become [`ClientError::Unauthorized`], 404 becomes
    /// [`ClientError::NotFound`].
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            _ => Self::ApiError { status, message },
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if the backend could not authenticate the caller
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Turn a 4xx answer to a submit into a rejection
    pub(crate) fn into_rejection(self) -> Self {
        if self.is_client_error() {
            match self {
                Self::ApiError { message, .. } => Self::Rejected(message),
                other => other,
            }
        } else {
            self
        }
    }
}
