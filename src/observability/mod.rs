//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch engine, interceptors, transport
//!     → tracing events (span per request, carrying request_id)
//!     → logging.rs (EnvFilter + pretty/JSON fmt layer)
//!     → metrics.rs (counters and histograms via the metrics facade)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
