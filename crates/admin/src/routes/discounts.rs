//! Discount API handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;
use tracing::instrument;

use collection_gate_core::DiscountKind;

use crate::{
    error::AppError,
    services::{ApplyOutcome, BulkApplyReport},
    shopify::DiscountSummary,
    state::AppState,
};

/// Build the discounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/discounts", get(index))
        .route("/api/discounts/apply", post(apply_all))
        .route("/api/discounts/{id}/apply", post(apply_one))
}

/// A discount with whether rules can be applied to it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountView {
    #[serde(flatten)]
    pub discount: DiscountSummary,
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incompatible_reason: Option<String>,
}

impl From<DiscountSummary> for DiscountView {
    fn from(discount: DiscountSummary) -> Self {
        let incompatible_reason = match &discount.kind {
            DiscountKind::CodeBasic | DiscountKind::AutomaticBasic => None,
            DiscountKind::Incompatible(kind) => Some(kind.reason().to_string()),
            DiscountKind::Unsupported(name) => Some(format!("Unsupported discount type: {name}")),
        };
        Self {
            compatible: incompatible_reason.is_none(),
            incompatible_reason,
            discount,
        }
    }
}

/// Response for the discount inventory.
#[derive(Debug, Serialize)]
pub struct DiscountsResponse {
    pub discounts: Vec<DiscountView>,
}

/// List every discount in the shop.
///
/// # Errors
///
/// Returns an error if Shopify cannot be reached.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<DiscountsResponse>, AppError> {
    let discounts = state.shopify().list_discounts().await?;
    Ok(Json(DiscountsResponse {
        discounts: discounts.into_iter().map(DiscountView::from).collect(),
    }))
}

/// Apply the active rule to one discount.
///
/// Failures are reported in the body with `success: false`.
#[instrument(skip(state))]
pub async fn apply_one(State(state): State<AppState>, Path(id): Path<String>) -> Json<ApplyOutcome> {
    Json(state.applier().apply_to_discount(state.shop(), &id).await)
}

/// Apply the active rule to every discount.
#[instrument(skip(state))]
pub async fn apply_all(State(state): State<AppState>) -> Json<BulkApplyReport> {
    Json(state.applier().apply_to_all(state.shop()).await)
}
