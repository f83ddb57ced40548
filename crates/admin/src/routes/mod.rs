//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Rules
//! GET  /api/rules                   - Active rule for the shop
//! PUT  /api/rules                   - Create or replace the rule
//!
//! # Inventory (read from Shopify)
//! GET  /api/collections             - Collections with their entitlement
//! GET  /api/discounts               - Discounts with rule compatibility
//!
//! # Application (write to Shopify)
//! POST /api/discounts/{id}/apply    - Apply the rule to one discount
//! POST /api/discounts/apply         - Apply the rule to every discount
//!
//! # Audit
//! GET  /api/logs                    - Recent rule log entries
//! ```
//!
//! Health endpoints are mounted by the binary.

pub mod collections;
pub mod discounts;
pub mod logs;
pub mod rules;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(rules::router())
        .merge(collections::router())
        .merge(discounts::router())
        .merge(logs::router())
}
