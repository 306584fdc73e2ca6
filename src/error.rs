//! Error taxonomy surfaced by every consumption style.
//!
//! # Design Decisions
//! - One error type (`FuelError`) for all failure paths; callers match on it
//!   or on its `ErrorKind`
//! - Only the dispatch engine classifies failures into variants
//! - `Configuration` is the only variant raised synchronously (builder misuse)

use bytes::Bytes;
use thiserror::Error;

use crate::redirect::RedirectError;
use crate::transport::TransportError;

/// Boxed error produced by a deserializer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a request, delivered alongside whatever response was available.
#[derive(Debug, Error)]
pub enum FuelError {
    /// I/O, connect or timeout failure in the transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Status code rejected by the request's validator.
    #[error("HTTP status {status_code} rejected: {message}")]
    Validation {
        status_code: u16,
        message: String,
        /// Raw response body, kept so callers can inspect the server's error payload.
        body: Bytes,
    },

    /// Missing or malformed `Location`, or too many hops.
    #[error("redirect error: {0}")]
    Redirect(#[from] RedirectError),

    /// The deserializer rejected the response body.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] BoxError),

    /// The request was cancelled before it completed.
    #[error("request cancelled")]
    Cancelled,

    /// Misuse of the request builder or manager.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A request interceptor stopped the chain without supplying a response.
    #[error("request interceptor chain stopped before dispatch")]
    Intercepted,

    /// Local file I/O while streaming an upload source or download destination.
    #[error("transfer error: {0}")]
    Transfer(#[source] std::io::Error),

    /// User code (an interceptor, provider, callback or deserializer) panicked
    /// on the worker.
    #[error("request task panicked: {0}")]
    Panicked(String),
}

/// Coarse classification of a `FuelError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Validation,
    Redirect,
    Deserialization,
    Cancelled,
    Configuration,
    Intercepted,
    Transfer,
    Panicked,
}

impl FuelError {
    pub fn configuration(message: impl Into<String>) -> Self {
        FuelError::Configuration(message.into())
    }

    pub fn deserialization<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        FuelError::Deserialization(error.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FuelError::Transport(_) => ErrorKind::Transport,
            FuelError::Validation { .. } => ErrorKind::Validation,
            FuelError::Redirect(_) => ErrorKind::Redirect,
            FuelError::Deserialization(_) => ErrorKind::Deserialization,
            FuelError::Cancelled => ErrorKind::Cancelled,
            FuelError::Configuration(_) => ErrorKind::Configuration,
            FuelError::Intercepted => ErrorKind::Intercepted,
            FuelError::Transfer(_) => ErrorKind::Transfer,
            FuelError::Panicked(_) => ErrorKind::Panicked,
        }
    }

    /// Status code of the rejected response, for validation failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FuelError::Validation { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Raw body of the rejected response; empty for non-validation failures.
    pub fn error_data(&self) -> &[u8] {
        match self {
            FuelError::Validation { body, .. } => body,
            _ => &[],
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FuelError::Cancelled)
    }

    /// Classify a panic payload caught on the worker.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        FuelError::Panicked(message)
    }
}

/// Convenience Result type for fuel operations.
pub type Result<T> = std::result::Result<T, FuelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_exposes_status_and_body() {
        let err = FuelError::Validation {
            status_code: 418,
            message: "I'm a teapot".into(),
            body: Bytes::from_static(b"short and stout"),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), Some(418));
        assert_eq!(err.error_data(), b"short and stout");
        assert!(err.to_string().contains("418"));
    }

    #[test]
    fn test_other_errors_have_no_status() {
        let err = FuelError::Cancelled;
        assert!(err.is_cancelled());
        assert_eq!(err.status_code(), None);
        assert!(err.error_data().is_empty());

        let err = FuelError::deserialization("bad json");
        assert_eq!(err.kind(), ErrorKind::Deserialization);
    }

    #[test]
    fn test_panic_payloads_keep_their_message() {
        let err = FuelError::from_panic(&"interceptor bug");
        assert_eq!(err.kind(), ErrorKind::Panicked);
        assert!(err.to_string().contains("interceptor bug"));

        let err = FuelError::from_panic(&String::from("owned message"));
        assert!(err.to_string().contains("owned message"));

        let err = FuelError::from_panic(&42u32);
        assert!(err.to_string().contains("non-string"));
    }
}
