//! Per-request dispatch engine.
//!
//! # Responsibilities
//! - Drive one request through interception, execution, redirects, response
//!   interception, download transfer and deserialization, strictly in order
//! - Classify every failure into `FuelError`
//! - Always produce a `Response` (an empty one carrying the URL when no
//!   exchange happened)

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use crate::deserialize::Deserializer;
use crate::dispatch::cancel::CancelToken;
use crate::dispatch::state::{DispatchState, Outcome, StateTracker};
use crate::error::FuelError;
use crate::http::{Body, Request, RequestKind, Response};
use crate::interceptor::{link, ChainSnapshot, Exchange, Next};
use crate::observability::metrics;
use crate::redirect::{self, RedirectError};
use crate::transfer::{download, upload};
use crate::transport::{Transport, TransportRequest};

/// What every consumption style eventually receives.
pub type Completion<T> = (Request, Response, Result<T, FuelError>);

type HopFailure = (Response, FuelError);

/// Dispatch context for one submission.
///
/// Interceptor chains are snapshots taken at submission; edits to the manager
/// afterwards do not affect this request.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    request_chain: ChainSnapshot<Request>,
    response_chain: ChainSnapshot<Exchange>,
    max_hops: usize,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        request_chain: ChainSnapshot<Request>,
        response_chain: ChainSnapshot<Exchange>,
        max_hops: usize,
    ) -> Self {
        Self {
            transport,
            request_chain,
            response_chain,
            max_hops,
        }
    }

    /// Run `request` to completion.
    pub async fn run<D>(&self, request: Request, deserializer: &D) -> Completion<D::Output>
    where
        D: Deserializer,
    {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "dispatch",
            request_id = %request_id,
            method = %request.method(),
            url = %request.url(),
        );

        let method = request.method();
        let started = Instant::now();
        let (request, response, result) = self.run_inner(request, deserializer).instrument(span).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) if e.is_cancelled() => "cancelled",
            Err(_) => "failure",
        };
        metrics::record_request(method.as_str(), outcome, started.elapsed());

        (request, response, result)
    }

    async fn run_inner<D>(&self, request: Request, deserializer: &D) -> Completion<D::Output>
    where
        D: Deserializer,
    {
        let mut state = StateTracker::new();
        let submitted = request.clone();
        let token = request.cancel_token().clone();

        let (last_hop, response) = match self.execute_hops(request, &token, &mut state).await {
            Ok(exchange) => exchange,
            Err((response, error)) => return fail(&mut state, submitted, response, error),
        };

        state.advance(DispatchState::ResponseIntercepted);
        let core: Next<Exchange> = link(|exchange| exchange);
        let Exchange {
            request: last_hop,
            response,
            result,
        } = self.response_chain.apply(core, Exchange::new(last_hop, response));
        if let Err(error) = result {
            return fail(&mut state, submitted, response, error);
        }
        state.advance(DispatchState::Validated);

        if let RequestKind::Download(options) = last_hop.kind() {
            state.advance(DispatchState::Transferring);
            if let Err(error) = download::write_body(&response, options, &token).await {
                return fail(&mut state, submitted, response, error);
            }
        }

        state.advance(DispatchState::Deserializing);
        match deserializer.deserialize(&response) {
            Ok(value) => {
                state.advance(DispatchState::Completed(Outcome::Success));
                tracing::debug!(status = response.status_code(), "Request completed");
                (submitted, response, Ok(value))
            }
            Err(e) => fail(&mut state, submitted, response, FuelError::Deserialization(e)),
        }
    }

    /// Issue hops until a non-redirect response (or a failure).
    async fn execute_hops(
        &self,
        request: Request,
        token: &CancelToken,
        state: &mut StateTracker,
    ) -> Result<(Request, Response), HopFailure> {
        let mut current = request;
        let mut hops = 0usize;

        loop {
            token
                .checkpoint()
                .map_err(|e| (Response::empty(current.url().clone()), e))?;

            let admit: Next<Request> = link(|mut request: Request| {
                request.admitted = true;
                request
            });
            let mut hop = self.request_chain.apply(admit, current);
            state.advance(DispatchState::RequestIntercepted);

            let response = match hop.stub.clone() {
                Some(stub) => {
                    state.advance(DispatchState::Executing);
                    tracing::debug!(status = stub.status_code(), "Using stubbed response");
                    stub
                }
                None if !hop.admitted => {
                    return Err((Response::empty(hop.url().clone()), FuelError::Intercepted));
                }
                None => {
                    let empty = Response::empty(hop.url().clone());
                    materialize_body(&mut hop, token)
                        .await
                        .map_err(|e| (empty.clone(), e))?;
                    token.checkpoint().map_err(|e| (empty.clone(), e))?;
                    state.advance(DispatchState::Executing);
                    self.send(&hop, token).await.map_err(|e| (empty, e))?
                }
            };

            if !hop.redirects_allowed() || !redirect::is_redirect(response.status_code()) {
                return Ok((hop, response));
            }

            if hops >= self.max_hops {
                let error = RedirectError::TooManyRedirects {
                    max_hops: self.max_hops,
                };
                return Err((response, error.into()));
            }
            let next = match redirect::resolve(&hop, &response) {
                Ok(next) => next,
                Err(e) => return Err((response, e.into())),
            };

            hops += 1;
            state.advance(DispatchState::RedirectLoop);
            metrics::record_redirect(response.status_code());
            tracing::debug!(
                hop = hops,
                status = response.status_code(),
                location = %next.url(),
                "Following redirect"
            );
            current = next;
        }
    }

    async fn send(&self, hop: &Request, token: &CancelToken) -> Result<Response, FuelError> {
        let transport_request = TransportRequest {
            method: hop.method(),
            url: hop.url().clone(),
            headers: hop.headers().clone(),
            body: hop.body_bytes().cloned().unwrap_or_default(),
            connect_timeout: hop.connect_timeout(),
            read_timeout: hop.read_timeout(),
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(FuelError::Cancelled),
            result = self.transport.execute(&transport_request) => Ok(result?),
        }
    }
}

/// Resolve lazy and multipart bodies into bytes for this hop.
async fn materialize_body(hop: &mut Request, token: &CancelToken) -> Result<(), FuelError> {
    if let RequestKind::Upload(options) = hop.kind.clone() {
        let multipart = upload::build_multipart(hop, &options, token).await?;
        hop.headers.set("Content-Type", multipart.content_type);
        hop.body = Body::Bytes(multipart.body);
        hop.kind = RequestKind::Plain;
        return Ok(());
    }

    if let Body::Lazy(callback) = &hop.body {
        let bytes = callback().map_err(FuelError::Transfer)?;
        hop.body = Body::Bytes(bytes);
    }
    Ok(())
}

fn fail<T>(
    state: &mut StateTracker,
    request: Request,
    response: Response,
    error: FuelError,
) -> Completion<T> {
    state.fail();
    tracing::debug!(
        status = response.status_code(),
        kind = ?error.kind(),
        error = %error,
        "Request failed"
    );
    (request, response, Err(error))
}
