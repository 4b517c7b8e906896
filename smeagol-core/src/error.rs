//! Error types for booking construction and the wire codec.

use thiserror::Error;

/// Errors raised while building bookings or mapping them to and from JSON.
#[derive(Error, Debug)]
pub enum BookingError {
    /// A value violates a booking or recurrence invariant.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Wire text could not be read: bad JSON, a missing required field,
    /// or a token that does not parse as its target type.
    #[error("Parse error: {message}")]
    Parse {
        field: Option<&'static str>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BookingError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        BookingError::InvalidArgument(msg.into())
    }

    pub(crate) fn parse(field: &'static str, msg: impl std::fmt::Display) -> Self {
        BookingError::Parse {
            field: Some(field),
            message: format!("{}: {}", field, msg),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, BookingError::InvalidArgument(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, BookingError::Parse { .. })
    }

    /// Wire field the error refers to, when known.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            BookingError::Parse { field, .. } => *field,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BookingError {
    fn from(err: serde_json::Error) -> Self {
        BookingError::Parse {
            field: None,
            message: err.to_string(),
        }
    }
}

/// Result type alias for booking operations.
pub type BookingResult<T> = Result<T, BookingError>;
