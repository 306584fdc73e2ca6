//! fuel: an HTTP client built around an explicit request pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!   FuelManager::get / post / route ...        (client.rs, http/encoding.rs)
//!        │  Request (consuming builder)        (http/request.rs)
//!        ▼
//!   adapter: execute / blocking / send         (adapter/)
//!        │  spawn on worker pool, snapshot interceptor chains
//!        ▼
//!   ┌──────────────────── Dispatcher ─────────────────────┐  (dispatch/)
//!   │ request chain ─► transport ─► redirect? ─┐          │  (interceptor/, transport/, redirect/)
//!   │      ▲                                   │ yes      │
//!   │      └───────────────────────────────────┘          │
//!   │ response chain (validator, logging)                 │
//!   │ download transfer ─► deserializer                   │  (transfer/, deserialize/)
//!   └─────────────────────────────────────────────────────┘
//!        │  (Request, Response, Result<T, FuelError>)
//!        ▼
//!   callback executor / blocking caller / future
//! ```

pub mod adapter;
pub mod client;
pub mod config;
pub mod deserialize;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod observability;
pub mod redirect;
pub mod routing;
pub mod transfer;
pub mod transport;

pub use adapter::{CallbackExecutor, CancellableRequest, ResponseFuture, ThreadExecutor};
pub use client::{default_manager, FuelManager, FuelManagerBuilder};
pub use config::ClientConfig;
pub use deserialize::{
    BytesDeserializer, Charset, Deserializer, JsonDeserializer, StringDeserializer,
    TextDeserializer,
};
pub use dispatch::Completion;
pub use error::{ErrorKind, FuelError};
pub use http::{Headers, Method, Request, RequestKind, Response};
pub use interceptor::{Exchange, InterceptorId, Next};
pub use routing::Routing;
pub use transfer::DataPart;
