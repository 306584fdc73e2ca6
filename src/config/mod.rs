//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → FuelManager::from_config
//! ```
//!
//! # Design Decisions
//! - Every section is `#[serde(default)]`; an empty file is a valid config
//! - serde rejects malformed input, `validate_config` rejects nonsense values
//!   and reports all of them at once

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, LoggingConfig, RedirectConfig, TimeoutConfig, TlsConfig, WorkerConfig,
};
pub use validation::{validate_config, ValidationError};
