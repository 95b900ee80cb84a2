//! Multipart upload into the working directory.

use super::error::ShareError;
use super::paths;
use super::{BUFFER_SIZE, ShareState};
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Multipart field name the upload page sends files under
pub const UPLOAD_FIELD: &str = "files";

/// Mode applied to every saved file
#[cfg(unix)]
const SAVED_FILE_MODE: u32 = 0o644;

/// POST /upload
///
/// Parts are saved one after another. The first failure ends the request;
/// files saved before it stay on disk.
pub async fn upload_handler(
    State(state): State<ShareState>,
    mut multipart: Multipart,
) -> Result<String, ShareError> {
    let work_dir = state.work_dir();
    let mut saved: Vec<String> = Vec::new();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| ShareError::BadRequest(format!("Failed to parse form: {}", e)))?;
        let Some(field) = field else {
            break;
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // An empty filename is a plain form value, not a file
        let Some(raw_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let file_name = paths::upload_file_name(&raw_name).ok_or_else(|| {
            ShareError::BadRequest(format!("Invalid file name: {:?}", raw_name))
        })?;
        let dest = work_dir.join(&file_name);

        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            return Err(ShareError::Conflict(format!("File {} already exists", file_name)));
        }

        let written = save_field(field, &dest, &file_name).await?;
        tracing::info!("Saved upload {} ({} bytes)", dest.display(), written);
        saved.push(file_name);
    }

    if saved.is_empty() {
        return Err(ShareError::BadRequest("No files were uploaded".to_string()));
    }

    Ok(format!(
        "Successfully uploaded {} files: {}",
        saved.len(),
        saved.join(", ")
    ))
}

/// Stream one part to `dest`, removing the partial file if the copy fails.
async fn save_field(field: Field<'_>, dest: &Path, file_name: &str) -> Result<u64, ShareError> {
    // create_new makes a racing upload of the same name fail instead of overwriting
    let file = match OpenOptions::new().write(true).create_new(true).open(dest).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(ShareError::Conflict(format!("File {} already exists", file_name)));
        }
        Err(e) => {
            return Err(ShareError::Internal(format!(
                "Failed to create file {}: {}",
                file_name, e
            )));
        }
    };

    let result = copy_field(field, BufWriter::with_capacity(BUFFER_SIZE, file), file_name).await;
    match result {
        Ok(written) => {
            set_saved_permissions(dest).await;
            Ok(written)
        }
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(dest).await {
                tracing::warn!("Failed to remove partial upload {}: {}", dest.display(), rm);
            }
            Err(e)
        }
    }
}

async fn copy_field(
    mut field: Field<'_>,
    mut writer: BufWriter<tokio::fs::File>,
    file_name: &str,
) -> Result<u64, ShareError> {
    let mut written: u64 = 0;
    loop {
        let chunk = field.chunk().await.map_err(|e| {
            ShareError::Internal(format!("Failed to read file {}: {}", file_name, e))
        })?;
        let Some(chunk) = chunk else {
            break;
        };
        writer.write_all(&chunk).await.map_err(|e| {
            ShareError::Internal(format!("Failed to write file {}: {}", file_name, e))
        })?;
        written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| ShareError::Internal(format!("Failed to write file {}: {}", file_name, e)))?;
    Ok(written)
}

async fn set_saved_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(SAVED_FILE_MODE);
        if let Err(e) = tokio::fs::set_permissions(path, perms).await {
            tracing::warn!("Failed to set permissions for file {}: {}", path.display(), e);
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}
