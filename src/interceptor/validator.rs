//! Default status-code validation.

use crate::error::FuelError;
use crate::interceptor::{link, Exchange, Next};

/// Fail the exchange when the request's validator rejects the status code.
///
/// Registered by default on every manager. The raw body travels with the
/// error so callers can inspect the server's error payload.
pub fn validator_response_interceptor(
) -> impl Fn(Next<Exchange>) -> Next<Exchange> + Send + Sync + 'static {
    |next: Next<Exchange>| {
        link(move |mut exchange: Exchange| {
            let status = exchange.response.status_code();
            if exchange.is_success() && !exchange.request.validator().accepts(status) {
                let reason = exchange.response.status_message();
                let message = if reason.is_empty() {
                    format!("HTTP Exception {}", status)
                } else {
                    format!("HTTP Exception {} {}", status, reason)
                };
                exchange.fail(FuelError::Validation {
                    status_code: status,
                    message,
                    body: exchange.response.body().clone(),
                });
            }
            next(exchange)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Request, Response};

    fn exchange(status: u16, request: Request) -> Exchange {
        let response = Response::new(request.url().clone(), status)
            .with_message("I'm a teapot")
            .with_body("short and stout");
        Exchange::new(request, response)
    }

    fn run(exchange: Exchange) -> Exchange {
        let validate = validator_response_interceptor();
        validate(link(|e| e))(exchange)
    }

    #[test]
    fn test_rejected_status_carries_code_and_body() {
        let request = Request::parse(Method::Get, "http://example.test/teapot").unwrap();
        let result = run(exchange(418, request)).result;
        let err = result.unwrap_err();
        assert_eq!(err.status_code(), Some(418));
        assert_eq!(err.error_data(), b"short and stout");
    }

    #[test]
    fn test_widened_validator_accepts() {
        let request = Request::parse(Method::Get, "http://example.test/teapot")
            .unwrap()
            .validate(100..=599);
        assert!(run(exchange(418, request)).is_success());
    }
}
