//! Response value.
//!
//! # Responsibilities
//! - Hold status, headers and the fully buffered body of one exchange
//! - Provide the empty response paired with failures that never reached a server
//!
//! # Design Decisions
//! - Bodies are buffered `Bytes`; downloads stream to disk separately
//! - `status_code == 0` marks "no response received"

use std::fmt;

use bytes::Bytes;
use url::Url;

use crate::http::Headers;

#[derive(Debug, Clone)]
pub struct Response {
    url: Url,
    status_code: u16,
    status_message: String,
    headers: Headers,
    body: Bytes,
    content_length: Option<u64>,
}

impl Response {
    pub fn new(url: Url, status_code: u16) -> Self {
        Self {
            url,
            status_code,
            status_message: String::new(),
            headers: Headers::new(),
            body: Bytes::new(),
            content_length: None,
        }
    }

    /// Placeholder paired with failures that produced no server response.
    pub fn empty(url: Url) -> Self {
        Self::new(url, 0)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = message.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        if self.content_length.is_none() {
            self.content_length = Some(body.len() as u64);
        }
        self.body = body;
        self
    }

    pub fn with_content_length(mut self, length: Option<u64>) -> Self {
        self.content_length = length;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Declared length, falling back to the buffered body size.
    pub fn content_length(&self) -> u64 {
        self.content_length.unwrap_or(self.body.len() as u64)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_empty_response(&self) -> bool {
        self.status_code == 0
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<-- {} ({})", self.status_code, self.url)?;
        writeln!(f, "Response : {}", self.status_message)?;
        writeln!(f, "Length : {}", self.content_length())?;
        let body = if self.body.is_empty() {
            "(empty)".to_string()
        } else {
            self.text_lossy()
        };
        writeln!(f, "Body : {}", body)?;
        writeln!(f, "Headers : ({})", self.headers.len())?;
        write!(f, "{}", self.headers)
    }
}
