//! Blocking consumption.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::adapter::callback::InlineExecutor;
use crate::client::FuelManager;
use crate::deserialize::{BytesDeserializer, Deserializer, JsonDeserializer, StringDeserializer};
use crate::dispatch::Completion;
use crate::error::FuelError;
use crate::http::{Request, Response};

impl FuelManager {
    /// Run `request` on the worker pool and block the calling thread until done.
    ///
    /// Must not be called from inside an async runtime; doing so returns a
    /// `Configuration` error instead of blocking a runtime thread.
    pub fn blocking<D: Deserializer>(&self, request: Request, deserializer: D) -> Completion<D::Output> {
        if Handle::try_current().is_ok() {
            let response = Response::empty(request.url().clone());
            let error = FuelError::configuration(
                "blocking request issued from inside an async runtime; use send() instead",
            );
            return (request, response, Err(error));
        }

        let fallback = request.clone();
        let (tx, rx) = oneshot::channel();
        self.submit(request, deserializer, Arc::new(InlineExecutor), move |req, resp, result| {
            let _ = tx.send((req, resp, result));
        });

        match rx.blocking_recv() {
            Ok(completion) => completion,
            Err(_) => {
                let response = Response::empty(fallback.url().clone());
                let error =
                    FuelError::configuration("worker pool shut down before the request completed");
                (fallback, response, Err(error))
            }
        }
    }

    pub fn blocking_string(&self, request: Request) -> Completion<String> {
        self.blocking(request, StringDeserializer::default())
    }

    pub fn blocking_bytes(&self, request: Request) -> Completion<Bytes> {
        self.blocking(request, BytesDeserializer)
    }

    pub fn blocking_json<T>(&self, request: Request) -> Completion<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.blocking(request, JsonDeserializer::<T>::new())
    }
}
