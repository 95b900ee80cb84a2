//! HTML rendering for the upload and download list pages.

use super::allow_list::DownloadFile;
use super::paths;
use std::fmt::Write;

/// Static upload page: file picker plus XHR upload with a progress bar
pub const INDEX_HTML: &str = include_str!("static/index.html");

const DOWNLOADS_CSS: &str = include_str!("static/downloads.css");

/// Human readable size: "N B" below 1 KiB, otherwise one decimal with a
/// binary unit prefix, e.g. "1.5 MB".
pub fn format_file_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Render the download list for the given descriptors.
pub fn render_downloads(files: &[DownloadFile]) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Download Files List</title>\n<style>\n",
    );
    html.push_str(DOWNLOADS_CSS);
    html.push_str(
        "</style>\n</head>\n<body>\n<div class=\"panel\">\n\
         <h1>Downloadable Files</h1>\n\
         <a href=\"/\" class=\"back\">&larr; Back to Upload</a>\n",
    );

    if files.is_empty() {
        html.push_str(
            "<div class=\"empty\">No downloadable files configured (use -f or -x parameter)</div>\n",
        );
    } else {
        html.push_str(
            "<div class=\"scroll\">\n<table>\n\
             <tr><th>Filename</th><th>Size</th><th>Action</th></tr>\n",
        );
        for file in files {
            let action = if file.exists {
                format!(
                    "<a href=\"/download/{}\" class=\"get\">Download</a>",
                    paths::escape(&file.rel_path)
                )
            } else {
                "<span class=\"get off\" aria-disabled=\"true\">Download</span>".to_string()
            };
            let size = if file.exists {
                format_file_size(file.size)
            } else {
                "-".to_string()
            };
            // Writing into a String cannot fail
            let _ = write!(
                html,
                "<tr><td class=\"name\">{}</td><td class=\"size\">{}</td><td class=\"action\">{}</td></tr>\n",
                escape_html(&file.file_name),
                size,
                action
            );
        }
        html.push_str("</table>\n</div>\n");
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}
