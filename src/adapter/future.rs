//! Future and single-value stream consumption.
//!
//! Dropping an unfinished `ResponseFuture` cancels the underlying request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::stream::{self, Stream};
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;

use crate::adapter::callback::InlineExecutor;
use crate::client::FuelManager;
use crate::deserialize::{BytesDeserializer, Deserializer, JsonDeserializer, StringDeserializer};
use crate::dispatch::Completion;
use crate::error::FuelError;
use crate::http::{Request, Response};

/// Resolves to the request's completion.
pub struct ResponseFuture<T> {
    request: Request,
    rx: oneshot::Receiver<Completion<T>>,
    done: bool,
}

impl<T> ResponseFuture<T> {
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn cancel(&self) {
        self.request.cancel();
    }

    /// Only the deserialized value (or error).
    pub async fn value(self) -> Result<T, FuelError> {
        let (_, _, result) = self.await;
        result
    }

    /// Single-item stream yielding the completion.
    pub fn into_stream(self) -> impl Stream<Item = Completion<T>> {
        stream::once(self)
    }
}

impl<T> Future for ResponseFuture<T> {
    type Output = Completion<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(received) => {
                this.done = true;
                Poll::Ready(received.unwrap_or_else(|_| {
                    let response = Response::empty(this.request.url().clone());
                    let error = FuelError::configuration(
                        "worker pool shut down before the request completed",
                    );
                    (this.request.clone(), response, Err(error))
                }))
            }
        }
    }
}

impl<T> Drop for ResponseFuture<T> {
    fn drop(&mut self) {
        if !self.done {
            self.request.cancel();
        }
    }
}

impl FuelManager {
    /// Submit `request` and return a future of its completion.
    pub fn send<D: Deserializer>(&self, request: Request, deserializer: D) -> ResponseFuture<D::Output> {
        let handle_request = request.clone();
        let (tx, rx) = oneshot::channel();
        self.submit(request, deserializer, Arc::new(InlineExecutor), move |req, resp, result| {
            let _ = tx.send((req, resp, result));
        });
        ResponseFuture {
            request: handle_request,
            rx,
            done: false,
        }
    }

    pub fn send_string(&self, request: Request) -> ResponseFuture<String> {
        self.send(request, StringDeserializer::default())
    }

    pub fn send_bytes(&self, request: Request) -> ResponseFuture<Bytes> {
        self.send(request, BytesDeserializer)
    }

    pub fn send_json<T>(&self, request: Request) -> ResponseFuture<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.send(request, JsonDeserializer::<T>::new())
    }
}
