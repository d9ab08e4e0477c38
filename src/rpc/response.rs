//! Call outcomes and their wire form.
//!
//! Per-call errors terminate only the call that raised them. They are
//! rendered as `{"error": {"code", "message"}}` with a matching HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Result of a call through the interceptor chain.
pub type RpcResult = Result<Value, RpcError>;

/// Errors surfaced to the caller of a single RPC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("unsupported request version {requested}; supported: {supported}")]
    UnsupportedVersion { requested: String, supported: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("unknown service: {0}")]
    NotFound(String),

    #[error("method not implemented: {0}")]
    Unimplemented(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    /// Stable machine-readable code, also used as a log/metric label.
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            RpcError::InvalidArgument(_) => "INVALID_ARGUMENT",
            RpcError::FailedPrecondition(_) => "FAILED_PRECONDITION",
            RpcError::NotFound(_) => "NOT_FOUND",
            RpcError::Unimplemented(_) => "UNIMPLEMENTED",
            RpcError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::UnsupportedVersion { .. } | RpcError::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            RpcError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Unimplemented(_) => StatusCode::NOT_IMPLEMENTED,
            RpcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));
        (self.status(), body).into_response()
    }
}
