//! API error handling with structured responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::gateway::ControlDocumentError;
use crate::orchestrator::CallError;

/// API error type with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Call(#[from] CallError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            Self::Call(err) if err.gateway_error().is_some_and(|e| e.is_timeout()) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Call(err) => match err {
                CallError::SessionUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                CallError::ParticipantCreateFailed(_)
                | CallError::JoinFailed(_)
                | CallError::EndCallFailed(_) => StatusCode::BAD_GATEWAY,
                CallError::TransferAlreadyPending { .. }
                | CallError::NoPendingTransfer { .. }
                | CallError::OutOfOrderCallback { .. }
                | CallError::UnknownCallLeg { .. } => StatusCode::CONFLICT,
                CallError::NoActiveCall { .. } | CallError::NotFound(_) => StatusCode::NOT_FOUND,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn error_code(&self) -> &'static str {
        match self {
            Self::Call(err) if err.gateway_error().is_some_and(|e| e.is_timeout()) => {
                "GATEWAY_TIMEOUT"
            }
            Self::Call(err) => match err {
                CallError::SessionUnavailable { .. } => "SESSION_UNAVAILABLE",
                CallError::ParticipantCreateFailed(_) => "PARTICIPANT_CREATE_FAILED",
                CallError::JoinFailed(_) => "JOIN_FAILED",
                CallError::EndCallFailed(_) => "END_CALL_FAILED",
                CallError::TransferAlreadyPending { .. } => "TRANSFER_ALREADY_PENDING",
                CallError::NoPendingTransfer { .. } => "NO_PENDING_TRANSFER",
                CallError::OutOfOrderCallback { .. } => "OUT_OF_ORDER_CALLBACK",
                CallError::UnknownCallLeg { .. } => "UNKNOWN_CALL_LEG",
                CallError::NoActiveCall { .. } => "NO_ACTIVE_CALL",
                CallError::NotFound(_) => "NOT_FOUND",
            },
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ControlDocumentError> for ApiError {
    fn from(err: ControlDocumentError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Structured error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(error_code = code, message = %message, "API error");
        } else if status == StatusCode::CONFLICT {
            warn!(error_code = code, message = %message, "Rejected request");
        } else {
            debug!(error_code = code, message = %message, "Client error");
        }

        let details = match &self {
            Self::Call(err) => err
                .gateway_error()
                .map(|e| format!("operation: {}", e.operation)),
            _ => None,
        };

        let body = ErrorResponse {
            error: message,
            code,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
