//! File transfer collaborators for upload and download requests.
//!
//! # Data Flow
//! ```text
//! upload:   BodySource::parts → upload.rs (multipart framing, 8 KiB copy loop)
//!           → materialized body + multipart Content-Type
//! download: final response (validated) → BodyDestination::path
//!           → download.rs (8 KiB copy loop) → file on disk
//! ```
//!
//! # Design Decisions
//! - Both copy loops report progress and check cancellation once per chunk
//! - Providers are plain traits with blanket impls for closures
//! - Files are read and written with `tokio::fs` on the worker

pub mod download;
pub mod upload;

use std::io;
use std::path::{Path, PathBuf};

use url::Url;

use crate::http::{Request, Response};

/// Chunk size for both copy loops.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// One file part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPart {
    pub name: String,
    pub path: PathBuf,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl DataPart {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            filename: None,
            content_type: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Explicit file name, or the last path component.
    pub fn file_name(&self) -> String {
        self.filename.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    /// Explicit content type, or one guessed from the file extension.
    pub fn media_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| guess_content_type(&self.path).to_string())
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Supplies the files of an upload.
pub trait BodySource: Send + Sync {
    fn parts(&self, request: &Request, url: &Url) -> io::Result<Vec<DataPart>>;
}

impl<F> BodySource for F
where
    F: Fn(&Request, &Url) -> io::Result<Vec<DataPart>> + Send + Sync,
{
    fn parts(&self, request: &Request, url: &Url) -> io::Result<Vec<DataPart>> {
        self(request, url)
    }
}

/// Chooses where a download is written.
pub trait BodyDestination: Send + Sync {
    fn path(&self, response: &Response, url: &Url) -> io::Result<PathBuf>;
}

impl<F> BodyDestination for F
where
    F: Fn(&Response, &Url) -> io::Result<PathBuf> + Send + Sync,
{
    fn path(&self, response: &Response, url: &Url) -> io::Result<PathBuf> {
        self(response, url)
    }
}
