//! Writing a validated response body to its destination.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::dispatch::cancel::CancelToken;
use crate::error::FuelError;
use crate::http::{DownloadOptions, Response};
use crate::transfer::CHUNK_SIZE;

/// Write `response`'s body to the destination chosen by `options`.
///
/// A cancelled or failed copy removes the partial file.
pub async fn write_body(
    response: &Response,
    options: &DownloadOptions,
    token: &CancelToken,
) -> Result<PathBuf, FuelError> {
    let destination = options
        .destination
        .as_ref()
        .ok_or_else(|| FuelError::configuration("download request has no destination"))?;
    let path = destination
        .path(response, response.url())
        .map_err(FuelError::Transfer)?;

    match copy(response, options, token, &path).await {
        Ok(written) => {
            tracing::debug!(path = %path.display(), bytes = written, "Download written");
            Ok(path)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&path).await;
            Err(e)
        }
    }
}

async fn copy(
    response: &Response,
    options: &DownloadOptions,
    token: &CancelToken,
    path: &Path,
) -> Result<u64, FuelError> {
    let body = response.body();
    let total = body.len() as u64;
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(FuelError::Transfer)?;

    let mut written = 0u64;
    for chunk in body.chunks(CHUNK_SIZE) {
        token.checkpoint()?;
        file.write_all(chunk).await.map_err(FuelError::Transfer)?;
        written += chunk.len() as u64;
        if let Some(progress) = &options.progress {
            progress(written, total);
        }
    }
    file.flush().await.map_err(FuelError::Transfer)?;
    Ok(written)
}
