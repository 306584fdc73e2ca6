//! Transport subsystem: one network attempt per call.
//!
//! # Data Flow
//! ```text
//! dispatch engine (per hop)
//!     → TransportRequest (method, url, headers, materialized body, timeouts)
//!     → Transport::execute
//!     → http.rs (reqwest client, redirects disabled)
//!     → Response (fully buffered) or TransportError
//! ```
//!
//! # Design Decisions
//! - Redirects are never followed here; the dispatch engine owns that policy
//! - Connect/read timeouts are enforced by the transport and surface as
//!   `TransportError`
//! - Object-safe trait so tests can script responses without sockets

pub mod http;

use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use thiserror::Error;
use url::Url;

use crate::http::{Headers, Method, Response};

pub use self::http::ReqwestTransport;

/// Snapshot of a request at the moment it hits the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Bytes,
    pub connect_timeout: Duration,
    pub read_timeout: Option<Duration>,
}

/// Failure of a single network attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Performs exactly one HTTP exchange.
pub trait Transport: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: &'a TransportRequest,
    ) -> BoxFuture<'a, Result<Response, TransportError>>;
}
