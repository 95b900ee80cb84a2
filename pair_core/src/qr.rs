//! Terminal QR code for the share URL.

use crate::config::{DownloadMode, ServerConfig};
use crate::http_share::{DOWNLOAD_PREFIX, paths};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Write;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Light modules around the code, in modules
const QUIET_ZONE: usize = 1;

// Two module rows per text line: top half first, bottom half second.
// Light modules are drawn as ink so the code reads on dark terminals.
const DARK_DARK: char = ' ';
const LIGHT_DARK: char = '▀';
const LIGHT_LIGHT: char = '█';
const DARK_LIGHT: char = '▄';

#[derive(Debug, Error)]
pub enum QrError {
    #[error("failed to encode QR code: {0}")]
    Encode(String),
    #[error("failed to write QR code: {0}")]
    Io(#[from] std::io::Error),
}

/// What the QR code points at, chosen from the download mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTarget {
    pub url: String,
    pub headline: String,
}

/// Single file → its direct download URL; several files → the list page;
/// nothing allow-listed → the upload page.
pub fn share_target(config: &ServerConfig, ip: Ipv4Addr, port: u16) -> ShareTarget {
    let base = format!("http://{}:{}", ip, port);
    match config.mode() {
        DownloadMode::Single(path) => ShareTarget {
            url: format!("{}{}{}", base, DOWNLOAD_PREFIX, paths::escape(path)),
            headline: format!("Scan below qrcode to download file: {}", path),
        },
        DownloadMode::Multi(_) => ShareTarget {
            url: format!("{}/downloads", base),
            headline: "Scan below qrcode to access downloadable files list.".to_string(),
        },
        DownloadMode::None => ShareTarget {
            url: base,
            headline: "Scan below qrcode to upload files.".to_string(),
        },
    }
}

/// Render `data` as half-block text, one line per two module rows.
pub fn render_terminal(data: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| QrError::Encode(e.to_string()))?;
    let width = code.width();
    let colors = code.to_colors();
    let size = width + 2 * QUIET_ZONE;

    let is_dark = |x: usize, y: usize| -> bool {
        if x < QUIET_ZONE || y < QUIET_ZONE {
            return false;
        }
        let (mx, my) = (x - QUIET_ZONE, y - QUIET_ZONE);
        mx < width && my < width && colors[my * width + mx] == Color::Dark
    };

    let mut out = String::with_capacity((size + 1) * size.div_ceil(2) * 3);
    for y in (0..size).step_by(2) {
        for x in 0..size {
            let c = match (is_dark(x, y), is_dark(x, y + 1)) {
                (true, true) => DARK_DARK,
                (false, true) => LIGHT_DARK,
                (false, false) => LIGHT_LIGHT,
                (true, false) => DARK_LIGHT,
            };
            out.push(c);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Print the headline and code to stdout
pub fn print_share_qr(target: &ShareTarget) -> Result<(), QrError> {
    let rendered = render_terminal(&target.url)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "\n{}", target.headline)?;
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Render the code on a detached blocking task so server startup never waits on it.
pub fn spawn_share_qr(target: ShareTarget) {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = print_share_qr(&target) {
            tracing::warn!("Could not display QR code for {}: {}", target.url, e);
        }
    });
}
