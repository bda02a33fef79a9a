//! Error types for delay queue client operations.
//!
//! Every failure is surfaced to the caller of the operation that detected it.
//! The client never retries; [`DelayQueueError::is_transient`] exists so that
//! callers with their own retry policy can classify failures.

use thiserror::Error;

use crate::handler::Capability;

/// Errors returned by [`DelayQueueClient`](crate::DelayQueueClient) operations.
#[derive(Debug, Error)]
pub enum DelayQueueError {
    /// The handler identifier is not present in the handler registry.
    #[error("can not find handler [{handler}]")]
    ClassNotFound { handler: String },

    /// The handler identifier is registered but lacks the required capability.
    #[error("[{handler}] does not implement [{capability}]")]
    SubClass {
        handler: String,
        capability: Capability,
    },

    /// The server response did not have the expected shape.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// The server answered with a non-zero status code.
    #[error("Operation failed ({code}): {message}")]
    Operation { code: i64, message: String },

    /// The server answered with a redirect. Redirects are never followed.
    #[error("Unexpected redirect: {status} to {}", location.as_deref().unwrap_or("<none>"))]
    UnexpectedRedirect {
        status: u16,
        location: Option<String>,
    },

    /// The HTTP layer rejected the exchange with a 4xx or 5xx status.
    #[error("HTTP error: {status} - {body}")]
    HttpStatus { status: u16, body: String },

    /// Network, TLS or timeout failure reported by the HTTP client.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The job body could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The client configuration is unusable.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DelayQueueError {
    /// Check if this error represents a condition that may succeed if the
    /// caller tries again.
    ///
    /// Transport failures and server errors (5xx, 429) are transient.
    /// Validation, protocol and server-reported operation errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ClassNotFound { .. } => false,
            Self::SubClass { .. } => false,
            Self::InvalidResponse { .. } => false,
            Self::Operation { .. } => false,
            Self::UnexpectedRedirect { .. } => false,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::Transport(_) => true,
            Self::Serialization(_) => false,
            Self::Configuration { .. } => false,
        }
    }

    /// Alias for [`is_transient`](Self::is_transient).
    pub fn should_retry(&self) -> bool {
        self.is_transient()
    }

    /// True when the failure was detected locally, before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::ClassNotFound { .. }
                | Self::SubClass { .. }
                | Self::Serialization(_)
                | Self::Configuration { .. }
        )
    }

    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

/// Input validation errors for the identifier types of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("Required field missing: {field}")]
    Required { field: String },

    /// A field has an invalid format.
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    /// A field value is out of the acceptable range.
    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
