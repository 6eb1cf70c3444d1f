use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

/// Every way a single request can fail. Mapped to a status once, here.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed `Content-Length`, or a body that could not be read in full.
    #[error("request body: {0}")]
    Body(String),

    #[error("decode request body: {0}")]
    Decode(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("encode response: {0}")]
    Encode(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, %status, "request failed");
        } else {
            warn!(error = %self, %status, "request failed");
        }
        // Callers get an opaque status; details stay in the logs.
        status.into_response()
    }
}
