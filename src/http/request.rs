//! Request value and builder.
//!
//! # Responsibilities
//! - Describe one logical HTTP call (method, URL, headers, body, timeouts)
//! - Carry per-request hooks: validator, progress, interrupt, body providers
//! - Reject builder misuse synchronously with `FuelError::Configuration`
//!
//! # Design Decisions
//! - Consuming builder: every mutator takes and returns `Self`, no I/O
//! - Upload/download specifics live in `RequestKind`, fixed at construction
//! - Hooks are `Arc`'d so a `Request` is cheap to clone for each redirect hop
//! - Clones share one cancellation token

use std::fmt;
use std::io;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::dispatch::cancel::CancelToken;
use crate::error::FuelError;
use crate::http::{Headers, Method, Response};
use crate::transfer::{BodyDestination, BodySource, DataPart};

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Progress sink: `(bytes_transferred, total_bytes)`.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Invoked once when a request is cancelled.
pub type InterruptCallback = Arc<dyn Fn(&Request) + Send + Sync>;

/// Produces the body lazily on the worker, when the request is first sent.
pub type BodyCallback = Arc<dyn Fn() -> io::Result<Bytes> + Send + Sync>;

/// Request payload.
#[derive(Clone)]
pub enum Body {
    Bytes(Bytes),
    Lazy(BodyCallback),
}

impl Body {
    pub fn empty() -> Self {
        Body::Bytes(Bytes::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Bytes(b) if b.is_empty())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Bytes(b) => write!(f, "Body::Bytes({} bytes)", b.len()),
            Body::Lazy(_) => f.write_str("Body::Lazy"),
        }
    }
}

/// Predicate over the response status code.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(u16) -> bool + Send + Sync>);

impl Validator {
    pub fn range(range: RangeInclusive<u16>) -> Self {
        Validator(Arc::new(move |status| range.contains(&status)))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        Validator(Arc::new(f))
    }

    pub fn accepts(&self, status: u16) -> bool {
        (self.0)(status)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Validator::range(200..=299)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator")
    }
}

/// Upload-only settings.
#[derive(Clone)]
pub struct UploadOptions {
    pub(crate) source: Option<Arc<dyn BodySource>>,
    pub(crate) progress: Option<ProgressCallback>,
}

/// Download-only settings.
#[derive(Clone)]
pub struct DownloadOptions {
    pub(crate) destination: Option<Arc<dyn BodyDestination>>,
    pub(crate) progress: Option<ProgressCallback>,
}

/// What the dispatch engine does with the body on either side of the exchange.
#[derive(Clone)]
pub enum RequestKind {
    Plain,
    Upload(UploadOptions),
    Download(DownloadOptions),
}

impl RequestKind {
    pub fn upload() -> Self {
        RequestKind::Upload(UploadOptions {
            source: None,
            progress: None,
        })
    }

    pub fn download() -> Self {
        RequestKind::Download(DownloadOptions {
            destination: None,
            progress: None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RequestKind::Plain => "plain",
            RequestKind::Upload(_) => "upload",
            RequestKind::Download(_) => "download",
        }
    }
}

impl fmt::Debug for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One HTTP request, owned by the caller until submitted.
#[derive(Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: Headers,
    pub(crate) body: Body,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) validator: Validator,
    pub(crate) kind: RequestKind,
    pub(crate) allow_redirects: bool,
    pub(crate) interrupt: Option<InterruptCallback>,
    pub(crate) cancel: CancelToken,
    pub(crate) stub: Option<Response>,
    pub(crate) admitted: bool,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: Body::empty(),
            params: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            validator: Validator::default(),
            kind: RequestKind::Plain,
            allow_redirects: true,
            interrupt: None,
            cancel: CancelToken::new(),
            stub: None,
            admitted: false,
        }
    }

    /// Parse `url` and build a plain request.
    pub fn parse(method: Method, url: &str) -> Result<Self, FuelError> {
        let url = Url::parse(url)
            .map_err(|e| FuelError::configuration(format!("invalid URL '{}': {}", url, e)))?;
        Ok(Self::new(method, url))
    }

    /// Switch the request kind. Drops any kind-specific hooks set so far.
    pub fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    // --- Accessors ---

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn payload(&self) -> &Body {
        &self.body
    }

    /// Materialized body bytes; `None` while the body is still a lazy callback.
    pub fn body_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            Body::Bytes(b) => Some(b),
            Body::Lazy(_) => None,
        }
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    pub fn redirects_allowed(&self) -> bool {
        self.allow_redirects
    }

    pub fn stubbed_response(&self) -> Option<&Response> {
        self.stub.as_ref()
    }

    // --- Headers ---

    /// Set a single header, replacing existing values.
    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.set(name, value.to_string());
        self
    }

    /// Merge several headers. With `replace = false` existing values win.
    pub fn headers_from<I, K, V>(mut self, pairs: I, replace: bool) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (name, value) in pairs {
            if replace {
                self.headers.set(name, value.to_string());
            } else {
                self.headers.set_if_absent(name, value.to_string());
            }
        }
        self
    }

    /// Add another value for a header without replacing.
    pub fn append_header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.append(name, value.to_string());
        self
    }

    /// Set `Authorization: Basic base64(user:pass)`.
    pub fn authenticate(self, username: &str, password: &str) -> Self {
        let encoded = BASE64.encode(format!("{}:{}", username, password));
        self.header("Authorization", format!("Basic {}", encoded))
    }

    // --- Body ---

    /// Overwrite the body (and any body callback).
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Bytes(body.into());
        self
    }

    /// Overwrite the body with text and replace any `Content-Type`.
    pub fn body_string(mut self, text: impl Into<String>, content_type: Option<&str>) -> Self {
        self.headers.remove("Content-Type");
        if let Some(content_type) = content_type {
            self.headers.set("Content-Type", content_type);
        }
        self.body = Body::Bytes(Bytes::from(text.into()));
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json_body<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, FuelError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| FuelError::configuration(format!("unserializable JSON body: {}", e)))?;
        let mut request = self.body(bytes);
        request.headers.set("Content-Type", "application/json");
        Ok(request)
    }

    /// Produce the body lazily on the worker. Redirect hops that keep the
    /// body reuse the bytes produced for the first hop.
    pub fn body_with<F>(mut self, callback: F) -> Self
    where
        F: Fn() -> io::Result<Bytes> + Send + Sync + 'static,
    {
        self.body = Body::Lazy(Arc::new(callback));
        self
    }

    /// Parameters sent as multipart text parts (upload) after the files.
    pub fn params_from<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    // --- Behaviour ---

    pub fn timeout(mut self, connect: Duration) -> Self {
        self.connect_timeout = connect;
        self
    }

    pub fn timeout_read(mut self, read: Duration) -> Self {
        self.read_timeout = Some(read);
        self
    }

    pub fn validate(mut self, range: RangeInclusive<u16>) -> Self {
        self.validator = Validator::range(range);
        self
    }

    pub fn validate_with<F>(mut self, f: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.validator = Validator::from_fn(f);
        self
    }

    pub fn allow_redirects(mut self, allow: bool) -> Self {
        self.allow_redirects = allow;
        self
    }

    pub fn interrupt<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.interrupt = Some(Arc::new(callback));
        self
    }

    /// Supply a response in place of the network call. Meant for caching and
    /// mocking request interceptors.
    pub fn stub_response(mut self, response: Response) -> Self {
        self.stub = Some(response);
        self
    }

    /// Progress sink for upload/download requests.
    pub fn progress<F>(mut self, callback: F) -> Result<Self, FuelError>
    where
        F: Fn(u64, u64) + Send + Sync + 'static,
    {
        let callback: ProgressCallback = Arc::new(callback);
        match &mut self.kind {
            RequestKind::Upload(upload) => upload.progress = Some(callback),
            RequestKind::Download(download) => download.progress = Some(callback),
            RequestKind::Plain => {
                return Err(FuelError::configuration(
                    "progress is only used with upload or download requests",
                ))
            }
        }
        Ok(self)
    }

    /// Files to upload. Only valid on upload requests.
    pub fn source<F>(self, source: F) -> Result<Self, FuelError>
    where
        F: Fn(&Request, &Url) -> io::Result<Vec<DataPart>> + Send + Sync + 'static,
    {
        self.source_provider(Arc::new(source))
    }

    pub fn source_provider(mut self, source: Arc<dyn BodySource>) -> Result<Self, FuelError> {
        match &mut self.kind {
            RequestKind::Upload(upload) => {
                upload.source = Some(source);
                Ok(self)
            }
            _ => Err(FuelError::configuration("source is only used with upload requests")),
        }
    }

    /// Where to persist the response body. Only valid on download requests.
    pub fn destination<F>(self, destination: F) -> Result<Self, FuelError>
    where
        F: Fn(&Response, &Url) -> io::Result<PathBuf> + Send + Sync + 'static,
    {
        self.destination_provider(Arc::new(destination))
    }

    pub fn destination_provider(
        mut self,
        destination: Arc<dyn BodyDestination>,
    ) -> Result<Self, FuelError> {
        match &mut self.kind {
            RequestKind::Download(download) => {
                download.destination = Some(destination);
                Ok(self)
            }
            _ => Err(FuelError::configuration(
                "destination is only used with download requests",
            )),
        }
    }

    // --- Cancellation ---

    /// Cancel the request. The interrupt callback fires on the first call only.
    pub fn cancel(&self) {
        if self.cancel.cancel() {
            if let Some(interrupt) = &self.interrupt {
                interrupt(self);
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("kind", &self.kind)
            .field("allow_redirects", &self.allow_redirects)
            .finish_non_exhaustive()
    }
}
