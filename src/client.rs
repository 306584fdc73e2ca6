//! The `FuelManager` client value.
//!
//! # Responsibilities
//! - Own the interceptor chains, base headers/params/path and the transport
//! - Build requests from paths or `Routing` descriptions
//! - Own (or borrow) the worker pool that runs dispatches
//!
//! # Design Decisions
//! - Callers construct and pass a manager explicitly; `default_manager()` is a
//!   convenience only
//! - Base settings sit behind `ArcSwap` so they can change while requests run;
//!   a request sees the values current at construction time
//! - The response chain starts with the status validator registered

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use bytes::Bytes;
use tokio::runtime::{Builder as RuntimeBuilder, Handle, Runtime};

use crate::adapter::callback::{CallbackExecutor, InlineExecutor};
use crate::config::{ClientConfig, RedirectConfig, TimeoutConfig};
use crate::dispatch::Dispatcher;
use crate::error::FuelError;
use crate::http::encoding::{append_query, form_body, resolve_url};
use crate::http::{Method, Request, RequestKind};
use crate::interceptor::{
    validator_response_interceptor, Exchange, InterceptorChain, InterceptorId, Next,
};
use crate::routing::Routing;
use crate::transport::{ReqwestTransport, Transport};

/// Values merged into every request the manager builds.
#[derive(Debug, Clone, Default)]
struct BaseSettings {
    base_path: Option<String>,
    headers: BTreeMap<String, String>,
    params: Vec<(String, String)>,
}

/// Where dispatches run.
enum WorkerPool {
    Owned(Option<Runtime>),
    Shared(Handle),
}

impl WorkerPool {
    fn owned(threads: usize) -> Result<Self, FuelError> {
        let runtime = RuntimeBuilder::new_multi_thread()
            .worker_threads(threads)
            .thread_name("fuel-worker")
            .enable_all()
            .build()
            .map_err(|e| FuelError::configuration(format!("cannot start worker pool: {}", e)))?;
        Ok(WorkerPool::Owned(Some(runtime)))
    }

    fn handle(&self) -> Option<Handle> {
        match self {
            WorkerPool::Owned(runtime) => runtime.as_ref().map(|rt| rt.handle().clone()),
            WorkerPool::Shared(handle) => Some(handle.clone()),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let WorkerPool::Owned(runtime) = self {
            if let Some(runtime) = runtime.take() {
                runtime.shutdown_background();
            }
        }
    }
}

enum WorkerSource {
    /// The ambient runtime when built inside one, otherwise an owned pool.
    Auto,
    Owned,
    Handle(Handle),
}

/// HTTP client: request factory, interceptor registry and dispatcher.
pub struct FuelManager {
    base: ArcSwap<BaseSettings>,
    request_interceptors: InterceptorChain<Request>,
    response_interceptors: InterceptorChain<Exchange>,
    transport: Arc<dyn Transport>,
    workers: WorkerPool,
    callback_executor: Arc<dyn CallbackExecutor>,
    timeouts: TimeoutConfig,
    redirects: RedirectConfig,
}

impl FuelManager {
    pub fn builder() -> FuelManagerBuilder {
        FuelManagerBuilder::new()
    }

    /// Manager with default configuration and the reqwest transport.
    pub fn new() -> Result<Self, FuelError> {
        Self::builder().build()
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, FuelError> {
        Self::builder().config(config).build()
    }

    // --- Request factory ---

    /// Build a request for `path` (absolute URL, or relative to the base path).
    ///
    /// Parameters become the query string, or a form body for POST/PUT/PATCH.
    pub fn request<I, K, V>(&self, method: Method, path: &str, params: I) -> Result<Request, FuelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let params = collect_params(params);
        self.build(method, RequestKind::Plain, None, path, params, Vec::new())
    }

    pub fn get(&self, path: &str) -> Result<Request, FuelError> {
        self.build(Method::Get, RequestKind::Plain, None, path, Vec::new(), Vec::new())
    }

    pub fn post(&self, path: &str) -> Result<Request, FuelError> {
        self.build(Method::Post, RequestKind::Plain, None, path, Vec::new(), Vec::new())
    }

    pub fn put(&self, path: &str) -> Result<Request, FuelError> {
        self.build(Method::Put, RequestKind::Plain, None, path, Vec::new(), Vec::new())
    }

    pub fn patch(&self, path: &str) -> Result<Request, FuelError> {
        self.build(Method::Patch, RequestKind::Plain, None, path, Vec::new(), Vec::new())
    }

    pub fn delete(&self, path: &str) -> Result<Request, FuelError> {
        self.build(Method::Delete, RequestKind::Plain, None, path, Vec::new(), Vec::new())
    }

    pub fn head(&self, path: &str) -> Result<Request, FuelError> {
        self.build(Method::Head, RequestKind::Plain, None, path, Vec::new(), Vec::new())
    }

    /// GET whose body is written to a destination file.
    pub fn download(&self, path: &str) -> Result<Request, FuelError> {
        self.build(Method::Get, RequestKind::download(), None, path, Vec::new(), Vec::new())
    }

    /// Multipart upload; parameters travel as text parts after the files.
    pub fn upload<I, K, V>(&self, method: Method, path: &str, params: I) -> Result<Request, FuelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let params = collect_params(params);
        self.build(method, RequestKind::upload(), None, path, params, Vec::new())
    }

    /// Build a request from an endpoint description.
    pub fn route<R: Routing + ?Sized>(&self, route: &R) -> Result<Request, FuelError> {
        let base_path = route.base_path();
        let request = self.build(
            route.method(),
            RequestKind::Plain,
            base_path.as_deref(),
            &route.path(),
            route.params(),
            route.headers(),
        )?;
        Ok(match route.body() {
            Some(body) => request.body(body),
            None => request,
        })
    }

    fn build(
        &self,
        method: Method,
        kind: RequestKind,
        base_path: Option<&str>,
        path: &str,
        mut params: Vec<(String, String)>,
        headers: Vec<(String, String)>,
    ) -> Result<Request, FuelError> {
        let base = self.base.load();
        let base_path = base_path.or(base.base_path.as_deref());
        let mut url = resolve_url(base_path, path)?;
        params.extend(base.params.iter().cloned());

        let is_upload = matches!(kind, RequestKind::Upload(_));
        if !is_upload && !method.encodes_params_in_body() {
            append_query(&mut url, &params);
        }

        let mut request = Request::new(method, url)
            .with_kind(kind)
            .timeout(self.timeouts.connect())
            .allow_redirects(self.redirects.allow)
            .headers_from(headers, true)
            .headers_from(base.headers.iter().map(|(k, v)| (k.clone(), v)), false);
        if let Some(read) = self.timeouts.read() {
            request = request.timeout_read(read);
        }

        if is_upload {
            request = request.params_from(params);
        } else if method.encodes_params_in_body() && !params.is_empty() {
            let form = form_body(&params);
            if !request.headers().contains("Content-Type") {
                request = request.header("Content-Type", "application/x-www-form-urlencoded");
            }
            request = request.body(Bytes::from(form));
        }

        Ok(request)
    }

    // --- Base settings ---

    pub fn base_path(&self) -> Option<String> {
        self.base.load().base_path.clone()
    }

    pub fn set_base_path(&self, base_path: Option<String>) {
        self.base.rcu(|current| BaseSettings {
            base_path: base_path.clone(),
            ..(**current).clone()
        });
    }

    pub fn set_base_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        self.base.rcu(|current| {
            let mut next = (**current).clone();
            next.headers.insert(name.clone(), value.clone());
            next
        });
    }

    pub fn set_base_params(&self, params: Vec<(String, String)>) {
        self.base.rcu(|current| BaseSettings {
            params: params.clone(),
            ..(**current).clone()
        });
    }

    // --- Interceptors ---

    pub fn add_request_interceptor<F>(&self, interceptor: F) -> InterceptorId
    where
        F: Fn(Next<Request>) -> Next<Request> + Send + Sync + 'static,
    {
        self.request_interceptors.add(interceptor)
    }

    pub fn remove_request_interceptor(&self, id: InterceptorId) -> bool {
        self.request_interceptors.remove(id)
    }

    pub fn remove_all_request_interceptors(&self) {
        self.request_interceptors.clear();
    }

    pub fn add_response_interceptor<F>(&self, interceptor: F) -> InterceptorId
    where
        F: Fn(Next<Exchange>) -> Next<Exchange> + Send + Sync + 'static,
    {
        self.response_interceptors.add(interceptor)
    }

    pub fn remove_response_interceptor(&self, id: InterceptorId) -> bool {
        self.response_interceptors.remove(id)
    }

    /// Clears the chain, including the default validator.
    pub fn remove_all_response_interceptors(&self) {
        self.response_interceptors.clear();
    }

    // --- Dispatch plumbing ---

    /// Dispatcher with interceptor chains snapshotted now.
    pub(crate) fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.transport.clone(),
            self.request_interceptors.snapshot(),
            self.response_interceptors.snapshot(),
            self.redirects.max_hops,
        )
    }

    pub(crate) fn worker_handle(&self) -> Option<Handle> {
        self.workers.handle()
    }

    pub(crate) fn callback_executor(&self) -> Arc<dyn CallbackExecutor> {
        self.callback_executor.clone()
    }
}

fn collect_params<I, K, V>(params: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToString,
{
    params
        .into_iter()
        .map(|(k, v)| (k.into(), v.to_string()))
        .collect()
}

/// Builder for `FuelManager`.
pub struct FuelManagerBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    callback_executor: Arc<dyn CallbackExecutor>,
    workers: WorkerSource,
}

impl FuelManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
            callback_executor: Arc::new(InlineExecutor),
            workers: WorkerSource::Auto,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.base_path = Some(base_path.into());
        self
    }

    pub fn base_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.base_headers.insert(name.into(), value.into());
        self
    }

    pub fn base_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.config.base_params.push((name.into(), value.to_string()));
        self
    }

    pub fn max_redirects(mut self, max_hops: usize) -> Self {
        self.config.redirects.max_hops = max_hops;
        self
    }

    /// Replace the network transport (tests, custom stacks).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Where callback-style results are delivered.
    pub fn callback_executor(mut self, executor: Arc<dyn CallbackExecutor>) -> Self {
        self.callback_executor = executor;
        self
    }

    /// Run dispatches on an existing runtime.
    pub fn worker_handle(mut self, handle: Handle) -> Self {
        self.workers = WorkerSource::Handle(handle);
        self
    }

    /// Always start a dedicated worker runtime sized by `workers.threads`.
    pub fn own_workers(mut self) -> Self {
        self.workers = WorkerSource::Owned;
        self
    }

    pub fn build(self) -> Result<FuelManager, FuelError> {
        if let Err(errors) = crate::config::validate_config(&self.config) {
            let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(FuelError::configuration(joined.join(", ")));
        }

        let config = self.config;
        let workers = match self.workers {
            WorkerSource::Handle(handle) => WorkerPool::Shared(handle),
            WorkerSource::Owned => WorkerPool::owned(config.workers.threads)?,
            WorkerSource::Auto => match Handle::try_current() {
                Ok(handle) => WorkerPool::Shared(handle),
                Err(_) => WorkerPool::owned(config.workers.threads)?,
            },
        };
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new(config.tls.accept_invalid_certs)));

        let response_interceptors = InterceptorChain::new();
        response_interceptors.add(validator_response_interceptor());

        tracing::debug!(
            base_path = ?config.base_path,
            max_hops = config.redirects.max_hops,
            "FuelManager created"
        );

        Ok(FuelManager {
            base: ArcSwap::from_pointee(BaseSettings {
                base_path: config.base_path,
                headers: config.base_headers,
                params: config.base_params,
            }),
            request_interceptors: InterceptorChain::new(),
            response_interceptors,
            transport,
            workers,
            callback_executor: self.callback_executor,
            timeouts: config.timeouts,
            redirects: config.redirects,
        })
    }
}

impl Default for FuelManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_MANAGER: OnceLock<FuelManager> = OnceLock::new();

/// Process-wide manager with default settings and its own worker runtime.
pub fn default_manager() -> Result<&'static FuelManager, FuelError> {
    if let Some(manager) = DEFAULT_MANAGER.get() {
        return Ok(manager);
    }
    let manager = FuelManager::builder().own_workers().build()?;
    let _ = DEFAULT_MANAGER.set(manager);
    DEFAULT_MANAGER
        .get()
        .ok_or_else(|| FuelError::configuration("default manager unavailable"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> FuelManager {
        FuelManager::builder()
            .base_path("http://api.test/v1")
            .base_header("User-Agent", "fuel")
            .base_param("key", "k")
            .own_workers()
            .build()
            .unwrap()
    }

    #[test]
    fn test_get_params_go_to_query() {
        let request = manager()
            .request(Method::Get, "/items", [("page", 2)])
            .unwrap();
        assert_eq!(request.url().as_str(), "http://api.test/v1/items?page=2&key=k");
        assert_eq!(request.headers().get("user-agent"), Some("fuel"));
    }

    #[test]
    fn test_post_params_go_to_form_body() {
        let request = manager()
            .request(Method::Post, "items", [("name", "a b")])
            .unwrap();
        assert_eq!(request.url().as_str(), "http://api.test/v1/items");
        assert_eq!(
            request.headers().get("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.body_bytes().map(|b| b.as_ref()), Some(&b"name=a+b&key=k"[..]));
    }

    #[test]
    fn test_relative_path_without_base_fails() {
        let manager = FuelManager::builder().own_workers().build().unwrap();
        assert!(matches!(manager.get("/x"), Err(FuelError::Configuration(_))));
        assert!(manager.get("http://other.test/x").is_ok());
    }

    #[test]
    fn test_base_settings_update_affects_new_requests() {
        let manager = manager();
        let before = manager.get("/a").unwrap();
        manager.set_base_path(Some("http://api2.test".into()));
        manager.set_base_header("User-Agent", "other");
        let after = manager.get("/a").unwrap();
        assert_eq!(before.url().host_str(), Some("api.test"));
        assert_eq!(after.url().as_str(), "http://api2.test/a?key=k");
        assert_eq!(after.headers().get("User-Agent"), Some("other"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ClientConfig::default();
        config.workers.threads = 0;
        assert!(matches!(FuelManager::from_config(config), Err(FuelError::Configuration(_))));
    }

    #[test]
    fn test_default_validator_is_registered() {
        let manager = manager();
        assert_eq!(manager.response_interceptors.len(), 1);
        manager.remove_all_response_interceptors();
        assert!(manager.response_interceptors.is_empty());
    }

    #[test]
    fn test_default_manager_is_shared() {
        let a = default_manager().unwrap() as *const FuelManager;
        let b = default_manager().unwrap() as *const FuelManager;
        assert_eq!(a, b);
    }
}
