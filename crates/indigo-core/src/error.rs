//! Error types for Indigo operations.
//!
//! Every failure of an API call is labelled with the stage that produced it:
//! encoding the request body, sending it over HTTP, or decoding the response.
//! Nothing is retried or recovered here; callers decide what to do with each
//! variant.

use thiserror::Error;

/// Main error type for Indigo operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Request body could not be serialized
    #[error("Failed to encode request: {0}")]
    EncodeError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Operation timed out in the transport
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Indigo API is unreachable or answered with a server error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Token was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request was rejected by the API
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Call was cancelled through its request context
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// Call ran past the deadline of its request context
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invalid UUID format
    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),
}

/// Specialized result type for Indigo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of an API call at which an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Serializing the request value
    Encode,
    /// Building, sending or awaiting the HTTP exchange
    Send,
    /// Deserializing the response body
    Decode,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Encode => "encode",
            Self::Send => "send",
            Self::Decode => "decode",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EncodeError(_) => "ENCODE_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Cancelled(_) => "CANCELLED",
            Self::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            Self::DecodeError(_) => "DECODE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidUuid(_) => "INVALID_UUID",
        }
    }

    /// Returns the call stage that produced this error, if it came from a call.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::EncodeError(_) => Some(Stage::Encode),
            Self::HttpError(_)
            | Self::Timeout(_)
            | Self::ServiceUnavailable(_)
            | Self::Unauthorized(_)
            | Self::NotFound(_)
            | Self::BadRequest(_)
            | Self::Cancelled(_)
            | Self::DeadlineExceeded(_) => Some(Stage::Send),
            Self::DecodeError(_) => Some(Stage::Decode),
            Self::ConfigError(_)
            | Self::InvalidEndpoint(_)
            | Self::ValidationError(_)
            | Self::InvalidUuid(_) => None,
        }
    }

    /// Returns true for failures of the HTTP exchange itself.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self.stage(), Some(Stage::Send))
    }

    /// Returns true if repeating the same call could succeed.
    ///
    /// The client never retries on its own; this is a hint for callers that
    /// layer their own policy on top.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ServiceUnavailable(_))
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::EncodeError(_) | Self::DecodeError(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_builder() {
            Self::InvalidEndpoint(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Self::InvalidUuid(err.to_string())
    }
}
