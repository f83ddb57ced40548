//! Rule persistence and entitlement evaluation.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use collection_gate_core::{
    CollectionDescriptor, DiscountRule, NewRule, RuleAction, ShopDomain, entitled_collections,
};

use crate::db::{RepositoryError, RuleStore};

/// Saves rules and evaluates them against a collection inventory.
#[derive(Clone)]
pub struct RuleService {
    store: Arc<dyn RuleStore>,
}

impl RuleService {
    /// Create a rule service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// The shop's active rule, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn active_rule(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<DiscountRule>, RepositoryError> {
        self.store.active_rule(shop).await
    }

    /// Numeric ids of the collections the shop's active rule entitles.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    #[instrument(skip(self, collections), fields(shop = %shop, collections = collections.len()))]
    pub async fn entitled(
        &self,
        shop: &ShopDomain,
        collections: &[CollectionDescriptor],
    ) -> Result<Vec<String>, RepositoryError> {
        let rule = self.store.active_rule(shop).await?;
        Ok(entitled_collections(rule.as_ref(), collections))
    }

    /// Create or replace the shop's rule and record it in the audit log.
    ///
    /// A failed save is logged as `rule_save_error` before the error is
    /// returned. A failure to write either log entry only produces a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule cannot be stored.
    #[instrument(skip(self, rule), fields(shop = %rule.shop, mode = %rule.mode))]
    pub async fn save_rule(&self, rule: NewRule) -> Result<DiscountRule, RepositoryError> {
        match self.store.upsert_rule(&rule).await {
            Ok(saved) => {
                let metadata = json!({
                    "mode": saved.mode,
                    "excludedCount": saved.excluded.len(),
                    "timestamp": Utc::now(),
                });
                if let Err(e) = self
                    .store
                    .append_log(&rule.shop, RuleAction::RULE_SAVED, Some(saved.id), Some(metadata))
                    .await
                {
                    tracing::warn!(error = %e, "Failed to record rule save");
                }
                Ok(saved)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save rule");
                let metadata = json!({ "error": e.to_string() });
                if let Err(log_error) = self
                    .store
                    .append_log(&rule.shop, RuleAction::RULE_SAVE_ERROR, None, Some(metadata))
                    .await
                {
                    tracing::warn!(error = %log_error, "Failed to record rule save error");
                }
                Err(e)
            }
        }
    }
}

/// Confirmation shown after a rule is saved.
#[must_use]
pub fn saved_message(rule: &DiscountRule) -> String {
    format!(
        "Rules saved successfully! {} collections {}.",
        rule.excluded.len(),
        rule.mode.verb()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use collection_gate_core::{RuleId, RuleMode};

    use super::*;
    use crate::testing::MemoryRuleStore;

    fn shop() -> ShopDomain {
        ShopDomain::parse("demo.myshopify.com").unwrap()
    }

    fn inventory() -> Vec<CollectionDescriptor> {
        vec![
            CollectionDescriptor::new("gid://shopify/Collection/1", "Sale", 4),
            CollectionDescriptor::new("gid://shopify/Collection/2", "New", 7),
            CollectionDescriptor::new("gid://shopify/Collection/3", "Gift cards", 1),
        ]
    }

    #[tokio::test]
    async fn test_entitled_without_rule_returns_everything() {
        let service = RuleService::new(Arc::new(MemoryRuleStore::new()));
        let mut ids = service.entitled(&shop(), &inventory()).await.unwrap();
        ids.sort();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_entitled_uses_saved_rule() {
        let service = RuleService::new(Arc::new(MemoryRuleStore::new()));
        service
            .save_rule(NewRule::new(
                shop(),
                RuleMode::Exclude,
                vec![CollectionDescriptor::new(
                    "gid://shopify/Collection/3",
                    "Gift cards",
                    1,
                )],
            ))
            .await
            .unwrap();

        let mut ids = service.entitled(&shop(), &inventory()).await.unwrap();
        ids.sort();
        assert_eq!(ids, ["1", "2"]);
    }

    #[tokio::test]
    async fn test_save_rule_logs_mode_and_count() {
        let store = Arc::new(MemoryRuleStore::new());
        let service = RuleService::new(store.clone());

        let saved = service
            .save_rule(NewRule::new(shop(), RuleMode::Include, inventory()))
            .await
            .unwrap();

        let logs = store.logs(&shop());
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, RuleAction::RULE_SAVED);
        assert_eq!(logs[0].rule_id, Some(saved.id));
        let metadata = logs[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["mode"], "include");
        assert_eq!(metadata["excludedCount"], 3);
        assert!(metadata.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_save_rule_replaces_previous_rule() {
        let service = RuleService::new(Arc::new(MemoryRuleStore::new()));
        let first = service
            .save_rule(NewRule::new(shop(), RuleMode::Exclude, inventory()))
            .await
            .unwrap();
        let second = service
            .save_rule(NewRule::new(shop(), RuleMode::Include, Vec::new()))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let active = service.active_rule(&shop()).await.unwrap().unwrap();
        assert_eq!(active.mode, RuleMode::Include);
        assert!(active.excluded.is_empty());
    }

    #[test]
    fn test_saved_message_uses_mode_verb() {
        let rule = DiscountRule {
            id: RuleId::new(1),
            shop: shop(),
            mode: RuleMode::Exclude,
            active: true,
            excluded: inventory(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            saved_message(&rule),
            "Rules saved successfully! 3 collections excluded."
        );

        let rule = DiscountRule {
            mode: RuleMode::Include,
            excluded: Vec::new(),
            ..rule
        };
        assert_eq!(
            saved_message(&rule),
            "Rules saved successfully! 0 collections included."
        );
    }
}
