//! Multipart upload body construction.
//!
//! Wire layout per part:
//! ```text
//! --{boundary}\r\n
//! Content-Disposition: form-data; name="{name}"; filename="{file}"\r\n
//! Content-Type: {type}\r\n
//! \r\n
//! {file bytes}\r\n
//! ```
//! followed by one `text/plain` part per parameter and `--{boundary}--\r\n`.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::AsyncReadExt;

use crate::dispatch::cancel::CancelToken;
use crate::error::FuelError;
use crate::http::{Request, UploadOptions};
use crate::transfer::{DataPart, CHUNK_SIZE};

const CRLF: &str = "\r\n";

/// Materialized multipart body and the `Content-Type` that describes it.
#[derive(Debug)]
pub struct MultipartBody {
    pub body: Bytes,
    pub content_type: String,
}

/// Boundary declared by an existing `multipart/form-data` Content-Type.
pub fn declared_boundary(content_type: &str) -> Option<String> {
    if !content_type
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        return None;
    }
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

fn generate_boundary() -> String {
    let token: String = std::iter::repeat_with(fastrand::alphanumeric).take(24).collect();
    format!("fuel-{}", token)
}

/// Build the multipart body for `request`, streaming each file in chunks.
pub async fn build_multipart(
    request: &Request,
    options: &UploadOptions,
    token: &CancelToken,
) -> Result<MultipartBody, FuelError> {
    let source = options
        .source
        .as_ref()
        .ok_or_else(|| FuelError::configuration("upload request has no source"))?;
    let parts = source
        .parts(request, request.url())
        .map_err(FuelError::Transfer)?;

    let boundary = request
        .headers()
        .get("Content-Type")
        .and_then(declared_boundary)
        .unwrap_or_else(generate_boundary);

    let mut total = 0u64;
    for part in &parts {
        let metadata = tokio::fs::metadata(&part.path)
            .await
            .map_err(FuelError::Transfer)?;
        total += metadata.len();
    }

    let mut body = BytesMut::new();
    let mut written = 0u64;

    for part in &parts {
        write_part_header(&mut body, &boundary, part);
        copy_file(part, &mut body, token, |chunk| {
            written += chunk;
            if let Some(progress) = &options.progress {
                progress(written, total);
            }
        })
        .await?;
        body.put_slice(CRLF.as_bytes());
    }

    for (name, value) in request.params() {
        body.put_slice(format!("--{}{}", boundary, CRLF).as_bytes());
        body.put_slice(
            format!("Content-Disposition: form-data; name=\"{}\"{}", name, CRLF).as_bytes(),
        );
        body.put_slice(format!("Content-Type: text/plain{}{}", CRLF, CRLF).as_bytes());
        body.put_slice(value.as_bytes());
        body.put_slice(CRLF.as_bytes());
    }
    body.put_slice(format!("--{}--{}", boundary, CRLF).as_bytes());

    tracing::debug!(parts = parts.len(), bytes = body.len(), "Multipart body built");

    Ok(MultipartBody {
        body: body.freeze(),
        content_type: format!("multipart/form-data; boundary={}", boundary),
    })
}

fn write_part_header(body: &mut BytesMut, boundary: &str, part: &DataPart) {
    body.put_slice(format!("--{}{}", boundary, CRLF).as_bytes());
    body.put_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"{}",
            part.name,
            part.file_name(),
            CRLF
        )
        .as_bytes(),
    );
    body.put_slice(format!("Content-Type: {}{}{}", part.media_type(), CRLF, CRLF).as_bytes());
}

async fn copy_file<F>(
    part: &DataPart,
    body: &mut BytesMut,
    token: &CancelToken,
    mut on_chunk: F,
) -> Result<(), FuelError>
where
    F: FnMut(u64),
{
    let mut file = tokio::fs::File::open(&part.path)
        .await
        .map_err(FuelError::Transfer)?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        token.checkpoint()?;
        let n = file.read(&mut buf).await.map_err(FuelError::Transfer)?;
        if n == 0 {
            return Ok(());
        }
        body.put_slice(&buf[..n]);
        on_chunk(n as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_boundary() {
        assert_eq!(
            declared_boundary("multipart/form-data; boundary=abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            declared_boundary("Multipart/Form-Data; charset=utf-8; Boundary=\"q\"").as_deref(),
            Some("q")
        );
        assert_eq!(declared_boundary("application/json; boundary=x"), None);
        assert_eq!(declared_boundary("multipart/form-data"), None);
    }

    #[test]
    fn test_generated_boundary_is_unique() {
        assert_ne!(generate_boundary(), generate_boundary());
    }
}
