use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::storage::{ErrorKind, StoreError};
use thiserror::Error;

/// Transport-level failures. Everything else travels inside the envelope.
#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"memstore\"")],
            )
                .into_response(),
            AppError::BadRequest(msg) => {
                tracing::debug!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
        }
    }
}

/// Failure of a single RPC call. The `Display` text is what the caller sees.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("invalid params: {0}")]
    Params(serde_json::Error),

    #[error("can't encode result: {0}")]
    Encode(serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::UnknownMethod(_) | RpcError::Params(_) => ErrorKind::BadRequest,
            RpcError::Encode(_) => ErrorKind::Internal,
            RpcError::Store(e) => e.kind(),
        }
    }

    /// Log at a level matching how surprising the failure is.
    pub fn log(&self) {
        match self.kind() {
            ErrorKind::Internal => tracing::error!(error = %self, "RPC call failed"),
            ErrorKind::Conflict | ErrorKind::Unauthorized => {
                tracing::warn!(error = %self, "RPC call rejected")
            }
            ErrorKind::BadRequest | ErrorKind::NotFound => {
                tracing::debug!(error = %self, "RPC call failed")
            }
        }
    }
}
