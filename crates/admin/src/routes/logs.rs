//! Rule log API handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use collection_gate_core::RuleLogEntry;

use crate::{db::DEFAULT_LOG_LIMIT, error::AppError, state::AppState};

const MAX_LOG_LIMIT: i64 = 500;

/// Build the logs router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/logs", get(index))
}

/// Query parameters for the log listing.
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}

/// Response for the log listing.
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<RuleLogEntry>,
}

/// Recent log entries for the shop, newest first.
///
/// # Errors
///
/// Returns an error if the rule store cannot be read.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    let logs = state.store().recent_logs(state.shop(), limit).await?;
    Ok(Json(LogsResponse { logs }))
}
