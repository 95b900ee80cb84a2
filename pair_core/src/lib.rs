//! Core of the `pair` LAN file exchange tool.
//!
//! The binary resolves a [`config::ServerConfig`] once, discovers the LAN
//! address with [`network::local_lan_ip`], starts the HTTP share server and
//! prints a QR code pointing at the most useful URL.

pub mod config;
pub mod http_share;
pub mod network;
pub mod qr;

pub use config::{ConfigError, DownloadMode, ServerConfig};
pub use http_share::HTTP_PORT;
