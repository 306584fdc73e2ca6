//! Consumption adapters.
//!
//! # Data Flow
//! ```text
//! FuelManager::submit(request, deserializer, executor, on_result)
//!     → worker pool: Dispatcher::run
//!     → CallbackExecutor::execute(on_result)
//!         ├─ callback.rs: caller's closure on the configured executor
//!         ├─ blocking.rs: oneshot, caller thread blocks on it
//!         └─ future.rs:   oneshot wrapped in a future / single-value stream
//! ```
//!
//! # Design Decisions
//! - One primitive; every style is a thin layer over it
//! - Blocking and future adapters receive results inline on the worker and
//!   hand them over through a oneshot channel
//! - Dropping an unfinished future cancels the request

pub mod blocking;
pub mod callback;
pub mod future;

pub use callback::{CallbackExecutor, CancellableRequest, InlineExecutor, Job, ThreadExecutor};
pub use future::ResponseFuture;
