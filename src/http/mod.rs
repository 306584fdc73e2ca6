//! HTTP value types.
//!
//! # Data Flow
//! ```text
//! FuelManager::request(method, path, params)
//!     → encoding.rs (resolve against base path, encode params)
//!     → request.rs (caller customises via the consuming builder)
//!     → [dispatch engine]
//!     → response.rs (status, headers, buffered body)
//! ```

pub mod curl;
pub mod encoding;
pub mod headers;
pub mod method;
pub mod request;
pub mod response;

pub use headers::Headers;
pub use method::Method;
pub use request::{
    Body, DownloadOptions, ProgressCallback, Request, RequestKind, UploadOptions, Validator,
};
pub use response::Response;
