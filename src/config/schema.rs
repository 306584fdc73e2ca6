//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! section has defaults so an empty file is a valid configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for a `FuelManager`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for relative request paths.
    pub base_path: Option<String>,

    /// Headers merged into every new request (request values win).
    pub base_headers: BTreeMap<String, String>,

    /// Parameters appended to every new request.
    pub base_params: Vec<(String, String)>,

    pub timeouts: TimeoutConfig,

    pub redirects: RedirectConfig,

    pub workers: WorkerConfig,

    pub tls: TlsConfig,

    pub logging: LoggingConfig,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Read timeout in milliseconds; unset leaves it to the transport.
    pub read_ms: Option<u64>,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn read(&self) -> Option<Duration> {
        self.read_ms.map(Duration::from_millis)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 15_000,
            read_ms: None,
        }
    }
}

/// Redirect policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RedirectConfig {
    /// Follow redirects by default.
    pub allow: bool,

    /// Maximum hops before failing with "too many redirects".
    pub max_hops: usize,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            allow: true,
            max_hops: 10,
        }
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Threads of the owned worker runtime.
    pub threads: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { threads: 4 }
    }
}

/// TLS pass-through options.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TlsConfig {
    pub accept_invalid_certs: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directives, overridden by `RUST_LOG`.
    pub filter: String,

    /// JSON output instead of human-readable lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "fuel=info".to_string(),
            json: false,
        }
    }
}
