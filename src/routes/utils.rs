use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::domain::LedgerError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Ledger failure rendered as a JSON HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

#[inline]
pub fn status_for(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::AccountNotFound { .. } | LedgerError::TransactionNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        LedgerError::InvalidAmount { .. }
        | LedgerError::InvalidIdentifier { .. }
        | LedgerError::InvalidKind { .. }
        | LedgerError::InvalidState { .. }
        | LedgerError::InvalidTimestamp { .. }
        | LedgerError::IllegalTransition { .. } => StatusCode::BAD_REQUEST,
        LedgerError::DuplicateTransaction { .. } => StatusCode::CONFLICT,
        LedgerError::LimitExceeded { .. } | LedgerError::InsufficientFunds { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let message = if self.0.is_client_error() {
            tracing::warn!("Request refused: {}", self.0);
            self.0.to_string()
        } else {
            // storage details stay in the logs
            tracing::error!("Request failed: {}", self.0);
            "internal storage failure".to_string()
        };
        let body = ErrorBody {
            error: self.0.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Text of a JSON amount, accepting both numbers and strings. Numbers keep their
/// literal digits.
#[inline]
pub fn amount_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
