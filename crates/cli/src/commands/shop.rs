//! Shop data commands.
//!
//! # Usage
//!
//! ```bash
//! cg-cli shop redact demo.myshopify.com
//! ```

use collection_gate_admin::db::RuleStore;
use collection_gate_core::ShopDomain;

use super::{CommandError, connect, print_json};

/// Delete every rule, selected collection and log entry for `shop`.
///
/// A `shop_redacted` entry recording the counts is left behind.
///
/// # Errors
///
/// Returns an error for an invalid shop domain or if the store is
/// unreachable.
pub async fn redact(shop: &str) -> Result<(), CommandError> {
    let shop = ShopDomain::parse(shop)
        .map_err(|e| CommandError::Invalid(format!("Invalid shop domain: {e}")))?;

    let store = connect().await?;
    let redaction = store.delete_shop(&shop).await?;
    store.close().await;

    tracing::info!(
        shop = %shop,
        rules = redaction.rules,
        collections = redaction.collections,
        logs = redaction.logs,
        "Shop data redacted"
    );
    print_json(&redaction)
}
