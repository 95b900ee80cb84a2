//! Allow-list descriptors and the download path guard.

use super::error::ShareError;
use super::paths;
use crate::config::ServerConfig;
use std::path::{Path, PathBuf};

/// A configured download entry as it looks on disk right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFile {
    /// Last segment of the absolute path (e.g. `test.txt`)
    pub file_name: String,
    /// Path as configured, relative to the working directory
    pub rel_path: String,
    pub abs_path: PathBuf,
    /// True only for an existing regular file (directories don't count)
    pub exists: bool,
    pub size: u64,
}

impl DownloadFile {
    async fn probe(config: &ServerConfig, rel_path: &str) -> Self {
        let abs_path = config.resolve(rel_path);
        let file_name = abs_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| rel_path.to_string());

        let (exists, size) = match tokio::fs::metadata(&abs_path).await {
            Ok(meta) if !meta.is_dir() => (true, meta.len()),
            _ => (false, 0),
        };

        Self {
            file_name,
            rel_path: rel_path.to_string(),
            abs_path,
            exists,
            size,
        }
    }
}

/// Describe every allow-listed file. Never cached: each call stats the
/// filesystem again so uploads and deletions show up immediately.
pub async fn downloadable_files(config: &ServerConfig) -> Vec<DownloadFile> {
    let mut files = Vec::with_capacity(config.mode().paths().len());
    for rel_path in config.mode().paths() {
        files.push(DownloadFile::probe(config, rel_path).await);
    }
    files
}

/// Turn the raw suffix of a `/download/` request into an absolute path that
/// is inside the working directory and on the allow-list.
///
/// The checks run in order and stop at the first failure: empty suffix,
/// percent-decoding, containment of the normalized path, then allow-list
/// membership of an existing entry.
pub async fn authorize(config: &ServerConfig, raw: &str) -> Result<PathBuf, ShareError> {
    if raw.is_empty() {
        return Err(ShareError::BadRequest(format!(
            "Please specify relative path (under {}) e.g., /download/uploads/test.txt",
            config.work_dir().display()
        )));
    }

    let decoded = paths::decode(raw)
        .map_err(|e| ShareError::BadRequest(format!("Failed to decode file path: {}", e)))?;

    let candidate = paths::join_clean(config.work_dir(), Path::new(&decoded));
    if paths::strict_descendant(config.work_dir(), &candidate).is_none() {
        tracing::warn!("Rejected download outside working directory: {:?}", decoded);
        return Err(ShareError::Forbidden(format!(
            "Access denied: File must be within current directory ({})",
            config.work_dir().display()
        )));
    }

    let allowed = downloadable_files(config)
        .await
        .into_iter()
        .any(|file| file.exists && file.abs_path == candidate);
    if !allowed {
        return Err(ShareError::Forbidden(
            "Access denied: File is not in allowed download list".to_string(),
        ));
    }

    Ok(candidate)
}
