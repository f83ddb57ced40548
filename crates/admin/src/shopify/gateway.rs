//! The Shopify operations the rule services depend on.
//!
//! Services take `&dyn ShopifyGateway` (or an `Arc`) rather than a concrete
//! [`AdminClient`](super::AdminClient) so they can run against the in-memory
//! double in `crate::testing`.

use async_trait::async_trait;
use collection_gate_core::BasicDiscountKind;

use super::AdminShopifyError;
use super::types::{BasicDiscountUpdate, Collection, DiscountConfig, DiscountSummary, UserError};

/// Read and write access to a shop's collections and discounts.
#[async_trait]
pub trait ShopifyGateway: Send + Sync {
    /// Every collection in the shop.
    async fn list_collections(&self) -> Result<Vec<Collection>, AdminShopifyError>;

    /// Every discount in the shop, of every kind.
    async fn list_discounts(&self) -> Result<Vec<DiscountSummary>, AdminShopifyError>;

    /// Full configuration of a basic discount, looked up by `DiscountNode` GID.
    ///
    /// `Ok(None)` means the node is missing or not a basic discount.
    async fn discount_config(&self, gid: &str) -> Result<Option<DiscountConfig>, AdminShopifyError>;

    /// Run the update mutation for `kind` against `gid`.
    ///
    /// Field-level rejections come back as `Ok` with a non-empty list.
    async fn update_basic_discount(
        &self,
        kind: BasicDiscountKind,
        gid: &str,
        update: &BasicDiscountUpdate,
    ) -> Result<Vec<UserError>, AdminShopifyError>;
}
