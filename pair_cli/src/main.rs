//! pair
//!
//! Transfer files between a PC and a phone on the same network by scanning a QR code.

use anyhow::{Context, Result};
use clap::Parser;
use pair_core::http_share::{self, HTTP_PORT, paths};
use pair_core::{DownloadMode, ServerConfig, network, qr};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const ACCESS_HELP: &str = "\
Access:
  Upload Page:      http://<lan-ip>:8080
  Download List:    http://<lan-ip>:8080/downloads (shows all downloadable files)
  Direct Download:  http://<lan-ip>:8080/download/<relative path>

Example:
  pair -x uploads/file1.txt,uploads/file2.pdf,docs/readme.md";

#[derive(Parser)]
#[command(
    name = "pair",
    version,
    about = "CLI to transfer files between PC and mobile via QR code scanning.",
    after_help = ACCESS_HELP
)]
struct Cli {
    /// Single file to allow download (relative to current dir)
    #[arg(short = 'f', value_name = "PATH")]
    file: Option<String>,

    /// Multiple files to allow download (comma-separated, relative to current dir)
    #[arg(short = 'x', value_name = "PATHS")]
    files: Option<String>,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pair=info,pair_core=info,tower_http=info".into()
            }),
        )
        .with_target(false)
        .init();
}

/// Console summary of where the server can be reached and what it serves
fn print_startup(config: &ServerConfig, ip: Ipv4Addr) {
    let base = format!("http://{}:{}", ip, HTTP_PORT);

    println!("Local IP address: {}", ip);
    println!(
        "Server started, current working directory: {}",
        config.work_dir().display()
    );
    println!("- Upload Page: {}", base);

    match config.mode() {
        DownloadMode::Single(path) => {
            println!(
                "- Allowed download file: {} (absolute: {})",
                path,
                config.resolve(path).display()
            );
            println!("  Direct download URL: {}/download/{}", base, paths::escape(path));
        }
        DownloadMode::Multi(list) => {
            println!("- Download List Page: {}/downloads (shows all configured files)", base);
            println!("- Allowed download files (total: {}):", list.len());
            for (i, path) in list.iter().enumerate() {
                println!(
                    "  {}. {} (absolute: {})",
                    i + 1,
                    path,
                    config.resolve(path).display()
                );
                println!("     Direct download URL: {}/download/{}", base, paths::escape(path));
            }
        }
        DownloadMode::None => {
            println!("- No download files configured (use -f for single file or -x for multiple files)");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = ServerConfig::from_options(cli.file.as_deref(), cli.files.as_deref())?;
    if let DownloadMode::Multi(list) = config.mode() {
        println!("- Configured {} files for download via -x parameter", list.len());
    }
    let config = Arc::new(config);

    let ip = network::local_lan_ip().context("Failed to get local IP address")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], HTTP_PORT));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    print_startup(&config, ip);
    qr::spawn_share_qr(qr::share_target(&config, ip, HTTP_PORT));

    let cancel_token = CancellationToken::new();
    let ct = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ct.cancel();
        }
    });

    tracing::info!("HTTP server listening on http://{}", addr);
    http_share::serve(listener, config, Some(cancel_token))
        .await
        .context("Failed to start server")
}
