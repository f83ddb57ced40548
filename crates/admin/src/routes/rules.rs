//! Rule API handlers.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use collection_gate_core::{CollectionDescriptor, DiscountRule, NewRule, RuleMode};

use crate::{error::AppError, services::saved_message, state::AppState};

/// Build the rules router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/rules", get(show).put(save))
}

/// Response for the active rule.
#[derive(Debug, Serialize)]
pub struct RuleResponse {
    pub rule: Option<DiscountRule>,
}

/// Request for saving a rule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRuleRequest {
    pub mode: String,
    #[serde(default)]
    pub excluded_collections: Vec<CollectionDescriptor>,
}

/// Response after saving a rule.
#[derive(Debug, Serialize)]
pub struct SaveRuleResponse {
    pub success: bool,
    pub message: String,
    pub rule: DiscountRule,
}

/// Get the shop's active rule.
///
/// # Errors
///
/// Returns an error if the rule store cannot be read.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<RuleResponse>, AppError> {
    let rule = state.rules().active_rule(state.shop()).await?;
    Ok(Json(RuleResponse { rule }))
}

/// Create or replace the shop's rule.
///
/// # Errors
///
/// Returns `400 Invalid mode` for an unknown mode, or an error if the rule
/// cannot be stored.
#[instrument(skip(state, body), fields(mode = %body.mode, selected = body.excluded_collections.len()))]
pub async fn save(
    State(state): State<AppState>,
    Json(body): Json<SaveRuleRequest>,
) -> Result<Json<SaveRuleResponse>, AppError> {
    let mode: RuleMode = body
        .mode
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid mode".to_string()))?;

    let rule = state
        .rules()
        .save_rule(NewRule::new(
            state.shop().clone(),
            mode,
            body.excluded_collections,
        ))
        .await?;

    Ok(Json(SaveRuleResponse {
        success: true,
        message: saved_message(&rule),
        rule,
    }))
}
