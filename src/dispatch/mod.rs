//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request (caller-owned)
//!     → task.rs: request chain (per hop) → transport or stub
//!         → redirect resolve → request chain ... (bounded by max_hops)
//!     → response chain (validation, logging)
//!     → download transfer (download requests)
//!     → deserializer
//!     → (Request, Response, Result<T, FuelError>)
//! ```
//!
//! # Design Decisions
//! - One dispatch per submission; all steps for a request are sequential
//! - Cancellation is cooperative and checked before each network call, per
//!   transfer chunk, and raced against the in-flight transport call
//! - `state.rs` tracks transitions for diagnostics and rejects illegal ones

pub mod cancel;
pub mod state;
pub mod task;

pub use cancel::CancelToken;
pub use state::{DispatchState, Outcome, StateTracker};
pub use task::{Completion, Dispatcher};
