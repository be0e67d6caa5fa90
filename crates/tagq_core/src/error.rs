//! Typed errors shared by the tagq builders, client and upsert layer.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Typed error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // Request body
    Encoding,

    // Transport errors
    Transport,
    Timeout,
    InvalidUrl,

    // Response body
    Decoding,

    // Record / schema mismatch
    FieldNotFound,

    // Driver errors
    Database,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Encoding => "ENCODING",
            Self::Transport => "TRANSPORT",
            Self::Timeout => "TIMEOUT",
            Self::InvalidUrl => "INVALID_URL",
            Self::Decoding => "DECODING",
            Self::FieldNotFound => "FIELD_NOT_FOUND",
            Self::Database => "DATABASE",
        }
    }

    /// Returns true if the failure is transient.
    ///
    /// Nothing in tagq retries; this only tells the caller whether a retry
    /// of their own could succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport | Self::Timeout)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned by every fallible tagq operation.
#[derive(Error, Debug, Clone)]
#[error("[{code}] {message}")]
pub struct TagqError {
    /// Typed error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// The collaborator error this one was raised from, kept as-is.
    #[source]
    pub source: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl TagqError {
    /// Creates a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying error.
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Encoding, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transport, message)
    }

    pub fn timeout() -> Self {
        Self::new(ErrorCode::Timeout, "Request timed out")
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidUrl, message)
    }

    pub fn decoding(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Decoding, message)
    }

    /// Creates an error for a tag that no field of `type_name` carries.
    pub fn field_not_found(type_name: &str, tag: &str) -> Self {
        Self::new(
            ErrorCode::FieldNotFound,
            format!("no field with tag {tag:?} found on {type_name}"),
        )
    }

    /// Wraps a driver error, keeping it as the source.
    pub fn database(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::new(ErrorCode::Database, err.to_string()).with_source(err)
    }

    /// Returns the underlying collaborator error if it is an `E`.
    pub fn source_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|e| e.downcast_ref::<E>())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl Serialize for TagqError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("TagqError", 2)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

impl From<serde_json::Error> for TagqError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let code = match err.classify() {
            Category::Io => ErrorCode::Transport,
            Category::Syntax | Category::Data | Category::Eof => ErrorCode::Decoding,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

/// Type alias for tagq results.
pub type Result<T> = std::result::Result<T, TagqError>;
