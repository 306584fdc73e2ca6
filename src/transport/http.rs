//! reqwest-backed transport.
//!
//! # Responsibilities
//! - Issue one HTTP request with redirects disabled
//! - Apply the request's connect and read timeouts
//! - Buffer the response into a `Response`

use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::redirect::Policy;

use crate::http::{Headers, Response};
use crate::transport::{Transport, TransportError, TransportRequest};

/// Transport over `reqwest`.
///
/// reqwest fixes connect and read timeouts per client, so one client is built
/// per distinct pair and reused; clones share the connection pool. The read
/// timeout bounds each read, not the whole exchange.
pub struct ReqwestTransport {
    clients: DashMap<(Duration, Option<Duration>), reqwest::Client>,
    accept_invalid_certs: bool,
}

impl ReqwestTransport {
    pub fn new(accept_invalid_certs: bool) -> Self {
        Self {
            clients: DashMap::new(),
            accept_invalid_certs,
        }
    }

    fn client(
        &self,
        connect_timeout: Duration,
        read_timeout: Option<Duration>,
    ) -> Result<reqwest::Client, TransportError> {
        let key = (connect_timeout, read_timeout);
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .connect_timeout(connect_timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs);
        if let Some(read_timeout) = read_timeout {
            builder = builder.read_timeout(read_timeout);
        }
        let client = builder.build()?;
        self.clients.insert(key, client.clone());
        Ok(client)
    }

    async fn send(&self, request: &TransportRequest) -> Result<Response, TransportError> {
        let client = self.client(request.connect_timeout, request.read_timeout)?;

        let mut builder = client.request(request.method.into(), request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let timeout = request.read_timeout.unwrap_or(request.connect_timeout);
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Client(e)
            }
        };

        let resp = builder.send().await.map_err(classify)?;

        let status = resp.status();
        let url = resp.url().clone();
        let content_length = resp.content_length();
        let headers: Headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = resp.bytes().await.map_err(classify)?;

        Ok(Response::new(url, status.as_u16())
            .with_message(status.canonical_reason().unwrap_or(""))
            .with_headers(headers)
            .with_content_length(content_length)
            .with_body(body))
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Transport for ReqwestTransport {
    fn execute<'a>(
        &'a self,
        request: &'a TransportRequest,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        async move {
            let result = self.send(request).await;
            if let Err(e) = &result {
                tracing::warn!(
                    method = %request.method,
                    url = %request.url,
                    error = %e,
                    "Transport request failed"
                );
            }
            result
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_is_reused_per_timeout_pair() {
        let transport = ReqwestTransport::default();
        let read = Some(Duration::from_millis(500));
        transport.client(Duration::from_secs(1), None).unwrap();
        transport.client(Duration::from_secs(1), None).unwrap();
        transport.client(Duration::from_secs(1), read).unwrap();
        transport.client(Duration::from_secs(2), read).unwrap();
        transport.client(Duration::from_secs(2), read).unwrap();
        assert_eq!(transport.clients.len(), 3);
    }
}
