pub mod account;
pub mod tx;
pub mod utils;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::services::{AccountService, TransactionProcessor};

pub use utils::ApiError;

async fn health() -> &'static str {
    "ok"
}

/// Build the full HTTP surface, versioned under `/v1`.
pub fn router(processor: Arc<TransactionProcessor>, accounts: Arc<AccountService>) -> Router {
    let head_route = Router::new().route("/", get(health));

    let api = account::account_routes(accounts)
        .merge(tx::tx_routes(processor))
        .route_layer(CompressionLayer::new().gzip(true));

    head_route
        .nest("/v1", api)
        .layer(TraceLayer::new_for_http())
        .route_layer(RequestBodyLimitLayer::new(1024 * 64)) // 64KB limit
}
