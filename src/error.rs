//! Service error taxonomy.
//!
//! Every failure surfaced to a caller is one of these variants; transport and
//! registry error signals are classified into them inside the registry access
//! layer and nowhere else.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("contest {0} not found")]
    NotFound(u64),
    #[error("join validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),
    #[error("no operator signing identity configured")]
    AdminNotConfigured,
    #[error("transaction cancelled by the signer")]
    UserCancelled,
    #[error("insufficient funds to cover stake and gas")]
    InsufficientFunds,
    #[error("registry rejected the call: {0}")]
    RegistryRejected(String),
    #[error("registry unreachable: {0}")]
    NetworkUnavailable(String),
    #[error("join not visible in participant list; transaction may still be pending or failed")]
    PendingOrFailed,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// Machine-readable kind carried in every error response body.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::ValidationFailed(_) => "validation_failed",
            ServiceError::AdminNotConfigured => "admin_not_configured",
            ServiceError::UserCancelled => "user_cancelled",
            ServiceError::InsufficientFunds => "insufficient_funds",
            ServiceError::RegistryRejected(_) => "registry_rejected",
            ServiceError::NetworkUnavailable(_) => "network_unavailable",
            ServiceError::PendingOrFailed => "pending_or_failed",
            ServiceError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ServiceError::AdminNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::UserCancelled => StatusCode::BAD_REQUEST,
            ServiceError::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            ServiceError::RegistryRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::NetworkUnavailable(_) => StatusCode::BAD_GATEWAY,
            ServiceError::PendingOrFailed => StatusCode::CONFLICT,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let ServiceError::ValidationFailed(reasons) = &self {
            body["allowed"] = json!(false);
            body["reasons"] = json!(reasons);
        }
        (self.status(), Json(body)).into_response()
    }
}
