use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::domain::parse_identifier;
use crate::services::{AccountService, OpenAccount};

use super::utils::ApiError;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: String,
}

async fn create_account(
    State(service): State<Arc<AccountService>>,
    Json(req): Json<OpenAccount>,
) -> Result<impl IntoResponse, ApiError> {
    let account = service.open(req).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    State(service): State<Arc<AccountService>>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account_id = parse_identifier("account_id", &account_id)?;
    let account = service.get(account_id).await?;
    tracing::info!("Account found: {account_id}");
    Ok(Json(account))
}

async fn list_accounts(
    State(service): State<Arc<AccountService>>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = parse_identifier("owner_id", &query.owner_id)?;
    let accounts = service.list_for_owner(owner_id).await?;
    Ok(Json(accounts))
}

pub fn account_routes(service: Arc<AccountService>) -> Router {
    Router::new()
        .route("/accounts", post(create_account).get(list_accounts))
        .route("/accounts/:account_id", get(get_account))
        .with_state(service)
}
