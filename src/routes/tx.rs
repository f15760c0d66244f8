use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{parse_identifier, LedgerError, TransactionKind, TransactionState};
use crate::services::{TransactionProcessor, TransactionRequest};

use super::utils::{amount_text, ApiError};

/// Incoming transaction, as sent by clients.
///
/// Only `PENDING` may be submitted as a state; approval is the processor's decision.
#[derive(Debug, Deserialize)]
pub struct CreateTransaction {
    pub account_id: String,
    #[serde(default)]
    pub amount: Value,
    pub kind: String,
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub state: Option<String>,
}

impl TryFrom<CreateTransaction> for TransactionRequest {
    type Error = LedgerError;

    fn try_from(body: CreateTransaction) -> Result<Self, Self::Error> {
        if let Some(state) = body.state.as_deref() {
            let state: TransactionState = state.parse()?;
            if state != TransactionState::Pending {
                return Err(LedgerError::InvalidState {
                    value: state.to_string(),
                    expected: TransactionState::Pending.to_string(),
                });
            }
        }

        let account_id = parse_identifier("account_id", &body.account_id)?;
        let kind: TransactionKind = body.kind.parse()?;
        let mut request = TransactionRequest::new(account_id, kind, amount_text(&body.amount));

        if let Some(id) = body.id.as_deref() {
            request = request.with_id(parse_identifier("id", id)?);
        }
        if let Some(timestamp) = body.timestamp {
            let parsed = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|_| LedgerError::InvalidTimestamp { value: timestamp.clone() })?;
            request = request.with_timestamp(parsed.with_timezone(&Utc));
        }
        Ok(request)
    }
}

async fn create_transaction(
    State(processor): State<Arc<TransactionProcessor>>,
    Json(body): Json<CreateTransaction>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Starting transaction creation process");
    let request = TransactionRequest::try_from(body)?;
    let transaction = processor.process(request).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn list_transactions(
    State(processor): State<Arc<TransactionProcessor>>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_identifier("account_id", &account_id)?;
    let transactions = processor.list_for_account(account_id).await?;
    Ok(Json(transactions))
}

async fn get_transaction(
    State(processor): State<Arc<TransactionProcessor>>,
    Path((account_id, transaction_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_identifier("account_id", &account_id)?;
    let transaction_id = parse_identifier("transaction_id", &transaction_id)?;
    let transaction = processor.get_transaction(account_id, transaction_id).await?;
    Ok(Json(transaction))
}

async fn account_report(
    State(processor): State<Arc<TransactionProcessor>>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_identifier("account_id", &account_id)?;
    let report = processor.summarize(account_id).await?;
    tracing::info!(
        "Report built for {account_id} over {} transactions",
        report.transactions.len()
    );
    Ok(Json(report))
}

pub fn tx_routes(processor: Arc<TransactionProcessor>) -> Router {
    Router::new()
        .route("/transactions", post(create_transaction))
        .route("/transactions/:account_id", get(list_transactions))
        .route("/transactions/:account_id/:transaction_id", get(get_transaction))
        .route("/reports/:account_id", get(account_report))
        .with_state(processor)
}
