//! Endpoint descriptions.
//!
//! An API is described as a type (usually an enum) implementing `Routing`;
//! `FuelManager::route` turns a value into a `Request`.

use bytes::Bytes;

use crate::http::Method;

pub trait Routing {
    /// Overrides the manager's base path for this endpoint.
    fn base_path(&self) -> Option<String> {
        None
    }

    fn method(&self) -> Method;

    /// Absolute URL, or a path relative to the base path.
    fn path(&self) -> String;

    fn params(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Explicit body; replaces any form-encoded parameters.
    fn body(&self) -> Option<Bytes> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FuelManager;

    enum HttpBin {
        Get { name: String, value: String },
        PostJson { id: String },
    }

    impl Routing for HttpBin {
        fn base_path(&self) -> Option<String> {
            Some("http://httpbin.test".to_string())
        }

        fn method(&self) -> Method {
            match self {
                HttpBin::Get { .. } => Method::Get,
                HttpBin::PostJson { .. } => Method::Post,
            }
        }

        fn path(&self) -> String {
            match self {
                HttpBin::Get { .. } => "/get".to_string(),
                HttpBin::PostJson { .. } => "/post".to_string(),
            }
        }

        fn params(&self) -> Vec<(String, String)> {
            match self {
                HttpBin::Get { name, value } => vec![(name.clone(), value.clone())],
                HttpBin::PostJson { .. } => vec![("ignored".into(), "yes".into())],
            }
        }

        fn headers(&self) -> Vec<(String, String)> {
            match self {
                HttpBin::PostJson { .. } => {
                    vec![("Content-Type".into(), "application/json".into())]
                }
                HttpBin::Get { .. } => Vec::new(),
            }
        }

        fn body(&self) -> Option<Bytes> {
            match self {
                HttpBin::PostJson { id } => Some(Bytes::from(format!(r#"{{"id":"{}"}}"#, id))),
                HttpBin::Get { .. } => None,
            }
        }
    }

    fn manager() -> FuelManager {
        FuelManager::builder()
            .base_path("http://default.test")
            .own_workers()
            .build()
            .unwrap()
    }

    #[test]
    fn test_route_base_path_and_params() {
        let request = manager()
            .route(&HttpBin::Get {
                name: "foo".into(),
                value: "bar".into(),
            })
            .unwrap();
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "http://httpbin.test/get?foo=bar");
    }

    #[test]
    fn test_route_body_and_headers() {
        let request = manager().route(&HttpBin::PostJson { id: "7".into() }).unwrap();
        assert_eq!(request.headers().get("Content-Type"), Some("application/json"));
        assert_eq!(request.body_bytes().map(|b| b.as_ref()), Some(&br#"{"id":"7"}"#[..]));
    }
}
