//! Interceptor subsystem.
//!
//! # Data Flow
//! ```text
//! request chain (per hop):   A → B → core(admit) → B → A      over Request
//! response chain (final):    A → B → core(identity) → B → A   over Exchange
//! ```
//!
//! # Design Decisions
//! - Interceptors are `Fn(Next<T>) -> Next<T>`; not calling `next` short-circuits
//! - The request core marks the request admitted; a request that comes back
//!   unadmitted never reaches the transport (a stub response stands in, if set)
//! - Response interceptors transform how an exchange is reported, never the
//!   transport call itself
//! - Status validation is an ordinary, default-registered response interceptor

pub mod chain;
pub mod logging;
pub mod validator;

use crate::error::FuelError;
use crate::http::{Request, Response};

pub use chain::{link, ChainSnapshot, Interceptor, InterceptorChain, InterceptorId, Next};
pub use logging::{
    curl_logging_request_interceptor, logging_request_interceptor, logging_response_interceptor,
};
pub use validator::validator_response_interceptor;

/// Final request/response pair plus its outcome so far, threaded through the
/// response chain.
#[derive(Debug)]
pub struct Exchange {
    pub request: Request,
    pub response: Response,
    pub result: Result<(), FuelError>,
}

impl Exchange {
    pub fn new(request: Request, response: Response) -> Self {
        Self {
            request,
            response,
            result: Ok(()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Mark the exchange failed unless it already is.
    pub fn fail(&mut self, error: FuelError) {
        if self.result.is_ok() {
            self.result = Err(error);
        }
    }
}
