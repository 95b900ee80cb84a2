//! Download routes: the allow-list page and single file streaming.

use super::allow_list::{authorize, downloadable_files};
use super::error::ShareError;
use super::paths;
use super::{BUFFER_SIZE, DOWNLOAD_PREFIX, ShareState, pages};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use futures_util::TryStreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// GET /downloads
pub async fn downloads_list_handler(State(state): State<ShareState>) -> Html<String> {
    let files = downloadable_files(&state).await;
    Html(pages::render_downloads(&files))
}

/// GET /download/{path}
pub async fn download_handler(
    State(state): State<ShareState>,
    uri: Uri,
) -> Result<Response, ShareError> {
    let raw = uri.path().strip_prefix(DOWNLOAD_PREFIX).unwrap_or_default();
    let target = authorize(&state, raw).await?;

    // The allow-list check already stat'ed the file; look again for the size we promise.
    let meta = match tokio::fs::metadata(&target).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ShareError::NotFound(format!(
                "File {} does not exist (under {})",
                target.display(),
                state.work_dir().display()
            )));
        }
        Err(e) => {
            return Err(ShareError::Internal(format!(
                "Failed to get file information: {}",
                e
            )));
        }
    };
    if meta.is_dir() {
        return Err(ShareError::BadRequest(format!(
            "{} is a directory, download is not supported",
            target.display()
        )));
    }

    let file = File::open(&target)
        .await
        .map_err(|e| ShareError::Internal(format!("Failed to open file: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(&target)?);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.len()));

    tracing::info!("Serving download {} ({} bytes)", target.display(), meta.len());

    // Each chunk goes out as its own body frame so the client sees progress.
    let shown = target.display().to_string();
    let stream = ReaderStream::with_capacity(file, BUFFER_SIZE).inspect_err(move |e| {
        tracing::error!("Failed to read download file {}: {}", shown, e);
    });

    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

/// `attachment; filename="..."`, with an RFC 5987 `filename*` for non-ASCII names.
fn content_disposition(path: &Path) -> Result<HeaderValue, ShareError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());

    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let value = if name.is_ascii() && fallback == name {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            paths::escape(&name)
        )
    };

    HeaderValue::from_str(&value)
        .map_err(|e| ShareError::Internal(format!("Failed to build response header: {}", e)))
}
