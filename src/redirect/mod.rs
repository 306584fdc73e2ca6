//! Redirect resolution.
//!
//! # Responsibilities
//! - Classify redirect status codes
//! - Build the request for the next hop (method, body, URL, headers)
//!
//! # Rules
//! ```text
//! 301/302/303 → GET with empty body (GET/HEAD keep their method)
//! 307/308     → same method, same body
//! Location    → resolved against the current URL
//! Authorization dropped when the target host differs
//! ```
//!
//! The hop limit is enforced by the dispatch engine, which counts hops.

use thiserror::Error;

use crate::http::{Body, Method, Request, RequestKind, Response};

/// Hop limit used when the manager is not configured otherwise.
pub const DEFAULT_MAX_HOPS: usize = 10;

#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("redirect status {status} without a Location header")]
    MissingLocation { status: u16 },

    #[error("invalid redirect Location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("too many redirects (limit {max_hops})")]
    TooManyRedirects { max_hops: usize },
}

pub fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Whether `status` rewrites the request to a body-less GET.
fn switches_to_get(status: u16, method: Method) -> bool {
    matches!(status, 301 | 302 | 303) && !matches!(method, Method::Get | Method::Head)
}

/// Build the next hop for `request` given its redirect `response`.
///
/// `request` is the request that was actually sent for the current hop, so a
/// preserved body is byte-for-byte what went on the wire.
pub fn resolve(request: &Request, response: &Response) -> Result<Request, RedirectError> {
    let status = response.status_code();
    let location = response
        .headers()
        .get("Location")
        .ok_or(RedirectError::MissingLocation { status })?;

    let target = request
        .url()
        .join(location)
        .map_err(|e| RedirectError::InvalidLocation {
            location: location.to_string(),
            reason: e.to_string(),
        })?;
    if !matches!(target.scheme(), "http" | "https") {
        return Err(RedirectError::InvalidLocation {
            location: location.to_string(),
            reason: format!("unsupported scheme '{}'", target.scheme()),
        });
    }

    let mut next = request.clone();
    next.admitted = false;
    next.stub = None;

    if switches_to_get(status, request.method()) {
        next.method = Method::Get;
        next.body = Body::empty();
        if matches!(next.kind, RequestKind::Upload(_)) {
            next.kind = RequestKind::Plain;
        }
    }

    if request.url().host_str() != target.host_str() {
        next.headers.remove("Authorization");
    }
    next.url = target;

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect(status: u16, location: Option<&str>) -> Response {
        let response = Response::new(url::Url::parse("http://origin.test/start").unwrap(), status);
        match location {
            Some(location) => response.with_header("Location", location),
            None => response,
        }
    }

    fn post() -> Request {
        Request::parse(Method::Post, "http://origin.test/start")
            .unwrap()
            .header("Authorization", "Basic abc")
            .body("payload")
    }

    #[test]
    fn test_redirect_statuses() {
        for status in [301, 302, 303, 307, 308] {
            assert!(is_redirect(status));
        }
        for status in [200, 300, 304, 305, 400] {
            assert!(!is_redirect(status));
        }
    }

    #[test]
    fn test_see_other_turns_post_into_empty_get() {
        for status in [301, 302, 303] {
            let next = resolve(&post(), &redirect(status, Some("/next"))).unwrap();
            assert_eq!(next.method(), Method::Get);
            assert_eq!(next.body_bytes().map(|b| b.len()), Some(0));
            assert_eq!(next.url().as_str(), "http://origin.test/next");
        }
    }

    #[test]
    fn test_head_keeps_method_on_302() {
        let head = Request::parse(Method::Head, "http://origin.test/a").unwrap();
        let next = resolve(&head, &redirect(302, Some("/b"))).unwrap();
        assert_eq!(next.method(), Method::Head);
    }

    #[test]
    fn test_temporary_redirect_preserves_method_and_body() {
        for status in [307, 308] {
            let next = resolve(&post(), &redirect(status, Some("http://origin.test/again"))).unwrap();
            assert_eq!(next.method(), Method::Post);
            assert_eq!(next.body_bytes().map(|b| b.as_ref()), Some(&b"payload"[..]));
        }
    }

    #[test]
    fn test_authorization_dropped_only_across_hosts() {
        let same = resolve(&post(), &redirect(307, Some("http://origin.test:8080/x"))).unwrap();
        assert_eq!(same.headers().get("Authorization"), Some("Basic abc"));

        let cross = resolve(&post(), &redirect(307, Some("http://other.test/x"))).unwrap();
        assert!(!cross.headers().contains("Authorization"));
    }

    #[test]
    fn test_missing_or_bad_location_fails() {
        assert!(matches!(
            resolve(&post(), &redirect(302, None)),
            Err(RedirectError::MissingLocation { status: 302 })
        ));
        assert!(matches!(
            resolve(&post(), &redirect(302, Some("http://[::1"))),
            Err(RedirectError::InvalidLocation { .. })
        ));
        assert!(matches!(
            resolve(&post(), &redirect(302, Some("ftp://files.test/x"))),
            Err(RedirectError::InvalidLocation { .. })
        ));
    }
}
