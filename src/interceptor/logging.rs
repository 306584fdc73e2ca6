//! Diagnostic interceptors. Emit at `debug`.

use crate::http::Request;
use crate::interceptor::{link, Exchange, Next};

/// Log the `Display` rendering of every outgoing request (each hop).
pub fn logging_request_interceptor() -> impl Fn(Next<Request>) -> Next<Request> + Send + Sync + 'static
{
    |next: Next<Request>| {
        link(move |request: Request| {
            tracing::debug!(request = %request, "Outgoing request");
            next(request)
        })
    }
}

/// Log every outgoing request as an equivalent cURL command.
pub fn curl_logging_request_interceptor(
) -> impl Fn(Next<Request>) -> Next<Request> + Send + Sync + 'static {
    |next: Next<Request>| {
        link(move |request: Request| {
            tracing::debug!(curl = %request.curl_string(), "Outgoing request");
            next(request)
        })
    }
}

/// Log the final response before it is reported.
pub fn logging_response_interceptor(
) -> impl Fn(Next<Exchange>) -> Next<Exchange> + Send + Sync + 'static {
    |next: Next<Exchange>| {
        link(move |exchange: Exchange| {
            tracing::debug!(
                response = %exchange.response,
                success = exchange.is_success(),
                "Incoming response"
            );
            next(exchange)
        })
    }
}
