//! URL and parameter encoding.
//!
//! # Responsibilities
//! - Resolve a request path against an optional base path
//! - Encode parameters into the query string or a form body

use url::{form_urlencoded, Url};

use crate::error::FuelError;

/// Resolve `path` to an absolute URL.
///
/// Absolute http(s) URLs are used as-is. Anything else is appended to `base_path`,
/// inserting exactly one `/` between them.
pub fn resolve_url(base_path: Option<&str>, path: &str) -> Result<Url, FuelError> {
    if let Ok(url) = Url::parse(path) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url);
        }
    }

    let base = base_path.ok_or_else(|| {
        FuelError::configuration(format!("relative path '{}' requires a base path", path))
    })?;

    let joined = match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) if !path.is_empty() => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    };

    Url::parse(&joined)
        .map_err(|e| FuelError::configuration(format!("invalid URL '{}': {}", joined, e)))
}

/// Append parameters to the URL's query, keeping any existing pairs.
pub fn append_query(url: &mut Url, params: &[(String, String)]) {
    if params.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in params {
        pairs.append_pair(key, value);
    }
}

/// Encode parameters as an `application/x-www-form-urlencoded` body.
pub fn form_body(params: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_ignores_base() {
        let url = resolve_url(Some("http://base.test"), "https://other.test/x").unwrap();
        assert_eq!(url.as_str(), "https://other.test/x");
    }

    #[test]
    fn test_relative_path_joins_with_single_slash() {
        let a = resolve_url(Some("http://base.test/api/"), "/users").unwrap();
        let b = resolve_url(Some("http://base.test/api"), "users").unwrap();
        assert_eq!(a.as_str(), "http://base.test/api/users");
        assert_eq!(b.as_str(), "http://base.test/api/users");
    }

    #[test]
    fn test_relative_without_base_is_configuration_error() {
        let err = resolve_url(None, "/users").unwrap_err();
        assert!(matches!(err, FuelError::Configuration(_)));
    }

    #[test]
    fn test_query_and_form_encoding() {
        let mut url = Url::parse("http://base.test/get?a=1").unwrap();
        let params = vec![("foo".to_string(), "bar baz".to_string())];
        append_query(&mut url, &params);
        assert_eq!(url.query(), Some("a=1&foo=bar+baz"));
        assert_eq!(form_body(&params), "foo=bar+baz");
    }
}
