use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Request-local failure, rendered as a status code with a plain-text body.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    MethodNotAllowed(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ShareError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShareError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ShareError::Forbidden(_) => StatusCode::FORBIDDEN,
            ShareError::NotFound(_) => StatusCode::NOT_FOUND,
            ShareError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ShareError::Conflict(_) => StatusCode::CONFLICT,
            ShareError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("{}\n", self),
        )
            .into_response()
    }
}
