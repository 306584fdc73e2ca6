//! Callback-style consumption and the shared submission primitive.
//!
//! # Responsibilities
//! - Spawn a dispatch on the worker pool (`FuelManager::execute`)
//! - Hand the completion to a `CallbackExecutor`, which decides the thread
//!   results are observed on
//! - Return a `CancellableRequest` handle
//! - Deliver a `Panicked` failure when user code panics on the worker, so
//!   every submission produces exactly one completion

use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::FuelManager;
use crate::deserialize::{BytesDeserializer, Deserializer, JsonDeserializer, StringDeserializer};
use crate::error::FuelError;
use crate::http::{Request, Response};

/// Unit of work posted to a callback executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where completions are delivered.
pub trait CallbackExecutor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Runs callbacks directly on the worker that finished the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl CallbackExecutor for InlineExecutor {
    fn execute(&self, job: Job) {
        job()
    }
}

/// Runs callbacks on one dedicated thread, in completion order.
#[derive(Debug)]
pub struct ThreadExecutor {
    jobs: mpsc::UnboundedSender<Job>,
}

impl ThreadExecutor {
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();
        thread::Builder::new().name(name.into()).spawn(move || {
            while let Some(job) = rx.blocking_recv() {
                job();
            }
        })?;
        Ok(Self { jobs })
    }
}

impl CallbackExecutor for ThreadExecutor {
    fn execute(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            tracing::warn!("Callback thread has stopped; dropping result");
        }
    }
}

/// Handle to a submitted request.
#[derive(Debug)]
pub struct CancellableRequest {
    request: Request,
    task: Option<JoinHandle<()>>,
}

impl CancellableRequest {
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Cooperatively cancel; the result is still delivered, as `Cancelled`.
    pub fn cancel(&self) {
        self.request.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.request.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait until the worker has delivered the result.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl FuelManager {
    /// Submit `request`; `on_result` runs on the manager's callback executor.
    ///
    /// This is the primitive every consumption style is built on.
    pub fn execute<D, F>(&self, request: Request, deserializer: D, on_result: F) -> CancellableRequest
    where
        D: Deserializer,
        F: FnOnce(Request, Response, Result<D::Output, FuelError>) + Send + 'static,
    {
        self.submit(request, deserializer, self.callback_executor(), on_result)
    }

    pub(crate) fn submit<D, F>(
        &self,
        request: Request,
        deserializer: D,
        executor: Arc<dyn CallbackExecutor>,
        on_result: F,
    ) -> CancellableRequest
    where
        D: Deserializer,
        F: FnOnce(Request, Response, Result<D::Output, FuelError>) + Send + 'static,
    {
        let handle_request = request.clone();

        let Some(handle) = self.worker_handle() else {
            let response = Response::empty(request.url().clone());
            let error = FuelError::configuration("worker pool has shut down");
            executor.execute(Box::new(move || on_result(request, response, Err(error))));
            return CancellableRequest {
                request: handle_request,
                task: None,
            };
        };

        let dispatcher = self.dispatcher();
        let submitted = request.clone();
        let task = handle.spawn(async move {
            let run = AssertUnwindSafe(dispatcher.run(request, &deserializer));
            let (request, response, result) = match run.catch_unwind().await {
                Ok(completion) => completion,
                Err(payload) => {
                    let error = FuelError::from_panic(payload.as_ref());
                    tracing::error!(url = %submitted.url(), error = %error, "Request task panicked");
                    let response = Response::empty(submitted.url().clone());
                    (submitted, response, Err(error))
                }
            };
            executor.execute(Box::new(move || on_result(request, response, result)));
        });

        CancellableRequest {
            request: handle_request,
            task: Some(task),
        }
    }

    pub fn response_string<F>(&self, request: Request, on_result: F) -> CancellableRequest
    where
        F: FnOnce(Request, Response, Result<String, FuelError>) + Send + 'static,
    {
        self.execute(request, StringDeserializer::default(), on_result)
    }

    pub fn response_bytes<F>(&self, request: Request, on_result: F) -> CancellableRequest
    where
        F: FnOnce(Request, Response, Result<Bytes, FuelError>) + Send + 'static,
    {
        self.execute(request, BytesDeserializer, on_result)
    }

    pub fn response_json<T, F>(&self, request: Request, on_result: F) -> CancellableRequest
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Request, Response, Result<T, FuelError>) + Send + 'static,
    {
        self.execute(request, JsonDeserializer::<T>::new(), on_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;

    #[test]
    fn test_thread_executor_runs_jobs_off_caller_thread() {
        let executor = ThreadExecutor::spawn("fuel-callback-test").unwrap();
        let (tx, rx) = std_mpsc::channel();
        executor.execute(Box::new(move || {
            let name = thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        }));
        let name = rx.recv().unwrap();
        assert_eq!(name.as_deref(), Some("fuel-callback-test"));
    }

    #[test]
    fn test_inline_executor_runs_immediately() {
        let (tx, rx) = std_mpsc::channel();
        InlineExecutor.execute(Box::new(move || tx.send(1).unwrap()));
        assert_eq!(rx.try_recv().unwrap(), 1);
    }
}
