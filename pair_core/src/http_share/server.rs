//! HTTP server for file sharing
//!
//! Routes, response headers and the serve loop.

use super::download::{download_handler, downloads_list_handler};
use super::error::ShareError;
use super::pages::INDEX_HTML;
use super::upload::upload_handler;
use super::{DOWNLOAD_PREFIX, ShareState};
use anyhow::Result;
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{Html, Response},
    routing::{MethodRouter, get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Default HTTP port for file sharing
pub const HTTP_PORT: u16 = 8080;

/// Handler for the root route - serves the upload page
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Handler for unknown routes and non-GET requests on page routes
async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found\n")
}

async fn only_post() -> ShareError {
    ShareError::MethodNotAllowed("Only POST method is supported")
}

async fn only_get() -> ShareError {
    ShareError::MethodNotAllowed("Only GET method is supported")
}

/// Middleware to add security headers
async fn add_security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

/// GET only. axum answers HEAD with the GET handler unless HEAD is routed explicitly.
fn download_methods() -> MethodRouter<ShareState> {
    get(download_handler).head(only_get).fallback(only_get)
}

/// Build the axum router over an immutable server configuration
pub fn create_router(state: ShareState) -> Router {
    let download_route = format!("{}{{*path}}", DOWNLOAD_PREFIX);

    Router::new()
        .route(
            "/",
            get(index_handler)
                .head(not_found_handler)
                .fallback(not_found_handler),
        )
        .route(
            "/upload",
            post(upload_handler)
                .fallback(only_post)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/downloads",
            get(downloads_list_handler)
                .head(not_found_handler)
                .fallback(not_found_handler),
        )
        .route(DOWNLOAD_PREFIX, download_methods())
        .route(&download_route, download_methods())
        .fallback(not_found_handler)
        .layer(middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until the token is cancelled
pub async fn serve(
    listener: TcpListener,
    state: ShareState,
    cancel_token: Option<CancellationToken>,
) -> Result<()> {
    let router = create_router(state);

    if let Some(ct) = cancel_token {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                ct.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully");
            })
            .await?;
    } else {
        axum::serve(listener, router).await?;
    }

    Ok(())
}
