//! HTTP file sharing module
//!
//! Upload page, multipart upload, allow-listed download list and downloads.

pub mod allow_list;
pub mod download;
pub mod error;
pub mod pages;
pub mod paths;
pub mod server;
pub mod upload;

use crate::config::ServerConfig;
use std::sync::Arc;

pub use allow_list::{DownloadFile, downloadable_files};
pub use error::ShareError;
pub use pages::format_file_size;
pub use server::{HTTP_PORT, create_router, serve};

/// State shared by every handler. Read-only after startup.
pub type ShareState = Arc<ServerConfig>;

/// Copy buffer for uploads and chunk size for downloads (1MB)
pub const BUFFER_SIZE: usize = 1024 * 1024;

/// Route prefix of single file downloads
pub const DOWNLOAD_PREFIX: &str = "/download/";
