//! Collection inventory API handlers.

use std::collections::HashSet;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use collection_gate_core::{CollectionDescriptor, EntitlementSummary, numeric_id, summarize};

use crate::{error::AppError, shopify::Collection, state::AppState};

/// Build the collections router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/collections", get(index))
}

/// A collection with its entitlement under the active rule.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionView {
    #[serde(flatten)]
    pub collection: Collection,
    pub entitled: bool,
}

/// Response for the collection inventory.
#[derive(Debug, Serialize)]
pub struct CollectionsResponse {
    pub collections: Vec<CollectionView>,
    pub summary: EntitlementSummary,
}

/// List every collection and whether discounts currently apply to it.
///
/// # Errors
///
/// Returns an error if Shopify or the rule store cannot be reached.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<CollectionsResponse>, AppError> {
    let collections = state.shopify().list_collections().await?;
    let descriptors: Vec<CollectionDescriptor> =
        collections.iter().map(Collection::descriptor).collect();
    let entitled = state.rules().entitled(state.shop(), &descriptors).await?;
    let summary = summarize(&descriptors, &entitled);

    let entitled: HashSet<&str> = entitled.iter().map(String::as_str).collect();
    let collections = collections
        .into_iter()
        .map(|collection| CollectionView {
            entitled: numeric_id(&collection.id).is_some_and(|id| entitled.contains(id)),
            collection,
        })
        .collect();

    Ok(Json(CollectionsResponse {
        collections,
        summary,
    }))
}
