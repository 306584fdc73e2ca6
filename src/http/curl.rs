//! Textual renderings of a request: cURL command and multi-line summary.

use std::fmt;

use crate::http::request::{Body, Request};
use crate::http::Method;

impl Request {
    /// Equivalent `curl` command line, for debugging.
    pub fn curl_string(&self) -> String {
        let mut parts = vec!["$ curl -i".to_string()];

        if self.method != Method::Get {
            parts.push(format!("-X {}", self.method));
        }

        if let Body::Bytes(body) = &self.body {
            if !body.is_empty() {
                let text = String::from_utf8_lossy(body);
                parts.push(format!("-d \"{}\"", escape(&text)));
            }
        }

        for (name, value) in self.headers.iter() {
            parts.push(format!("-H \"{}:{}\"", escape(name), escape(value)));
        }

        parts.push(format!("\"{}\"", self.url));
        parts.join(" ")
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--> {} ({})", self.method, self.url)?;
        match &self.body {
            Body::Bytes(body) if body.is_empty() => writeln!(f, "Body : (empty)")?,
            Body::Bytes(body) => writeln!(f, "Body : {}", String::from_utf8_lossy(body))?,
            Body::Lazy(_) => writeln!(f, "Body : (deferred)")?,
        }
        writeln!(f, "Headers : ({})", self.headers.len())?;
        write!(f, "{}", self.headers)
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{Method, Request};

    #[test]
    fn test_curl_for_plain_get() {
        let request = Request::parse(Method::Get, "http://example.test/get?a=1").unwrap();
        assert_eq!(request.curl_string(), "$ curl -i \"http://example.test/get?a=1\"");
    }

    #[test]
    fn test_curl_with_method_body_and_headers() {
        let request = Request::parse(Method::Post, "http://example.test/post")
            .unwrap()
            .header("Content-Type", "application/json")
            .body(r#"{"a":"b"}"#);
        assert_eq!(
            request.curl_string(),
            r#"$ curl -i -X POST -d "{\"a\":\"b\"}" -H "Content-Type:application/json" "http://example.test/post""#
        );
    }

    #[test]
    fn test_display_summarises_request() {
        let request = Request::parse(Method::Delete, "http://example.test/item/1")
            .unwrap()
            .header("Accept", "*/*");
        let rendered = request.to_string();
        assert!(rendered.starts_with("--> DELETE (http://example.test/item/1)"));
        assert!(rendered.contains("Body : (empty)"));
        assert!(rendered.contains("Accept : */*"));
    }
}
