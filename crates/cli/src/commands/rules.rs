//! Rule commands.
//!
//! # Usage
//!
//! ```bash
//! # Print the active rule
//! cg-cli rules show
//!
//! # Exclude two collections from every discount
//! cg-cli rules save --mode exclude -c 123 -c gid://shopify/Collection/456
//! ```

use std::sync::Arc;

use collection_gate_admin::services::{RuleService, saved_message};
use collection_gate_admin::shopify::{Collection, ShopifyGateway};
use collection_gate_core::{CollectionDescriptor, NewRule, RuleMode, collection_gid};

use super::{CommandError, connect, print_json, shopify};

/// Print the active rule for the configured shop.
///
/// # Errors
///
/// Returns an error if configuration is missing or the store is unreachable.
pub async fn show() -> Result<(), CommandError> {
    let (config, _) = shopify()?;
    let store = Arc::new(connect().await?);
    let service = RuleService::new(store.clone());

    let rule = service.active_rule(&config.store).await?;
    store.close().await;

    match rule {
        Some(rule) => print_json(&rule),
        None => {
            tracing::info!(shop = %config.store, "No active rule");
            Ok(())
        }
    }
}

/// Create or replace the rule for the configured shop.
///
/// Collections are resolved against the live inventory so titles and
/// product counts are stored alongside the ids.
///
/// # Errors
///
/// Returns an error for an invalid mode or an unknown collection, or if
/// Shopify or the store is unreachable.
pub async fn save(mode: &str, collections: &[String]) -> Result<(), CommandError> {
    let mode: RuleMode = mode
        .parse()
        .map_err(|_| CommandError::Invalid("Invalid mode".to_string()))?;

    let (config, client) = shopify()?;
    let inventory = client.list_collections().await?;

    let selected = resolve(&inventory, collections)?;

    let store = Arc::new(connect().await?);
    let service = RuleService::new(store.clone());
    let rule = service
        .save_rule(NewRule::new(config.store.clone(), mode, selected))
        .await?;
    store.close().await;

    tracing::info!("{}", saved_message(&rule));
    print_json(&rule)
}

/// Look up each requested id (numeric or GID) in the inventory.
fn resolve(inventory: &[Collection], ids: &[String]) -> Result<Vec<CollectionDescriptor>, CommandError> {
    ids.iter()
        .map(|id| {
            let gid = if id.starts_with("gid://") {
                id.clone()
            } else {
                collection_gid(id)
            };
            inventory
                .iter()
                .find(|c| c.id == gid)
                .map(Collection::descriptor)
                .ok_or_else(|| CommandError::Invalid(format!("Unknown collection: {id}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_rejects_invalid_mode_before_any_io() {
        let result = save("sometimes", &[]).await;
        assert!(matches!(result, Err(CommandError::Invalid(ref m)) if m == "Invalid mode"));
    }

    fn inventory() -> Vec<Collection> {
        vec![Collection {
            id: collection_gid("7"),
            title: Some("Sale".to_string()),
            handle: Some("sale".to_string()),
            products_count: 3,
        }]
    }

    #[test]
    fn test_resolve_accepts_numeric_and_gid() {
        let ids = vec!["7".to_string(), "gid://shopify/Collection/7".to_string()];
        let Ok(selected) = resolve(&inventory(), &ids) else {
            panic!("expected both ids to resolve");
        };
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].title.as_deref(), Some("Sale"));
        assert_eq!(selected[0].products_count, 3);
    }

    #[test]
    fn test_resolve_rejects_unknown_collection() {
        let result = resolve(&inventory(), &["8".to_string()]);
        assert!(matches!(result, Err(CommandError::Invalid(ref m)) if m == "Unknown collection: 8"));
    }
}
