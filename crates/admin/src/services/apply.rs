//! Rule application.
//!
//! Evaluates the shop's active rule against the live collection inventory
//! and synchronizes the result onto one discount or onto every discount in
//! the shop. Bulk runs are strictly sequential so the Admin API rate limit is
//! shared with nothing else; an optional pause spaces the calls further.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use collection_gate_core::{
    CollectionDescriptor, DiscountRule, EntitlementSummary, RuleAction, ShopDomain,
    entitled_collections, summarize,
};

use crate::db::RuleStore;
use crate::shopify::{DiscountSummary, ShopifyGateway};

use super::sync::{DiscountSynchronizer, SyncError, SyncOutcome};

/// Shown when a shop has no active rule.
pub const NO_ACTIVE_RULE: &str = "No active discount rules found. Please create rules first.";

/// Result of applying the rule to one discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub success: bool,
    pub message: String,
    /// Set when the synchronizer ran and failed.
    #[serde(skip)]
    pub failure: Option<SyncError>,
}

impl ApplyOutcome {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            failure: None,
        }
    }
}

/// Status of one discount in a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkStatus {
    /// Rule applied.
    Processed,
    /// Rule could not be applied to this discount.
    Failed,
    /// A transient error; re-running may succeed.
    Error,
}

/// One row of a [`BulkApplyReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItem {
    pub id: String,
    pub title: String,
    pub status: BulkStatus,
    pub message: String,
}

/// Aggregate result of [`RuleApplier::apply_to_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkApplyReport {
    /// Discounts the rule was applied to.
    pub success: usize,
    /// `total - success`.
    pub failed: usize,
    pub total: usize,
    pub details: Vec<BulkItem>,
    /// Set when the run could not start (inventory or rule unavailable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkApplyReport {
    fn aborted(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Entitlement evaluated once against a collection inventory snapshot.
struct Entitlement {
    ids: Vec<String>,
    summary: EntitlementSummary,
}

/// Applies the shop's active rule to its discounts.
#[derive(Clone)]
pub struct RuleApplier {
    store: Arc<dyn RuleStore>,
    gateway: Arc<dyn ShopifyGateway>,
    pause: Duration,
}

impl RuleApplier {
    /// Create an applier with no pause between bulk mutations.
    #[must_use]
    pub fn new(store: Arc<dyn RuleStore>, gateway: Arc<dyn ShopifyGateway>) -> Self {
        Self {
            store,
            gateway,
            pause: Duration::ZERO,
        }
    }

    /// Sleep `pause` between discounts during bulk runs.
    #[must_use]
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Apply the active rule to a single discount.
    ///
    /// `discount_id` may be the numeric id or any discount GID. Failures are
    /// reported in the outcome, never as an error.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn apply_to_discount(&self, shop: &ShopDomain, discount_id: &str) -> ApplyOutcome {
        let rule = match self.store.active_rule(shop).await {
            Ok(Some(rule)) => rule,
            Ok(None) => return ApplyOutcome::rejected(NO_ACTIVE_RULE),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load active rule");
                return ApplyOutcome::rejected(e.to_string());
            }
        };

        let discounts = match self.gateway.list_discounts().await {
            Ok(discounts) => discounts,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list discounts");
                return ApplyOutcome::rejected(e.detail());
            }
        };

        let Some(discount) = discounts.iter().find(|d| d.matches_id(discount_id)) else {
            return ApplyOutcome::rejected(format!("Discount with ID {discount_id} not found."));
        };

        let entitlement = match self.evaluate(&rule).await {
            Ok(entitlement) => entitlement,
            Err(message) => return ApplyOutcome::rejected(message),
        };

        let outcome = self.apply_one(discount, &entitlement).await;
        self.record(
            shop,
            &rule,
            RuleAction::RULE_APPLIED,
            json!({
                "discountId": discount.id,
                "discountTitle": discount.title,
                "success": outcome.success,
                "entitledCount": entitlement.summary.entitled,
                "excludedCount": entitlement.summary.excluded,
                "message": outcome.message,
            }),
        )
        .await;
        outcome
    }

    /// Apply the active rule to every discount in the shop.
    ///
    /// The inventory is fetched and the rule evaluated once; discounts are
    /// then synchronized one after another. A failing discount never stops
    /// the run.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn apply_to_all(&self, shop: &ShopDomain) -> BulkApplyReport {
        let rule = match self.store.active_rule(shop).await {
            Ok(rule) => rule,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load active rule");
                return BulkApplyReport::aborted(e.to_string());
            }
        };

        let discounts = match self.gateway.list_discounts().await {
            Ok(discounts) => discounts,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list discounts");
                return BulkApplyReport::aborted(e.detail());
            }
        };

        let Some(rule) = rule else {
            tracing::info!(discounts = discounts.len(), "No active rule, nothing applied");
            let details: Vec<BulkItem> = discounts
                .into_iter()
                .map(|d| BulkItem {
                    id: d.id,
                    title: d.title,
                    status: BulkStatus::Failed,
                    message: NO_ACTIVE_RULE.to_string(),
                })
                .collect();
            return BulkApplyReport {
                success: 0,
                failed: details.len(),
                total: details.len(),
                details,
                error: None,
            };
        };

        if discounts.is_empty() {
            return BulkApplyReport::default();
        }

        let entitlement = match self.evaluate(&rule).await {
            Ok(entitlement) => entitlement,
            Err(message) => return BulkApplyReport::aborted(message),
        };

        let mut details = Vec::with_capacity(discounts.len());
        for (index, discount) in discounts.iter().enumerate() {
            if index > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }

            let outcome = self.apply_one(discount, &entitlement).await;
            let status = match &outcome.failure {
                None if outcome.success => BulkStatus::Processed,
                Some(e) if e.is_transient() => BulkStatus::Error,
                _ => BulkStatus::Failed,
            };
            details.push(BulkItem {
                id: discount.id.clone(),
                title: discount.title.clone(),
                status,
                message: outcome.message,
            });
        }

        let success = details
            .iter()
            .filter(|d| d.status == BulkStatus::Processed)
            .count();
        let report = BulkApplyReport {
            success,
            failed: details.len() - success,
            total: details.len(),
            details,
            error: None,
        };

        tracing::info!(
            success = report.success,
            failed = report.failed,
            total = report.total,
            "Bulk apply finished"
        );
        self.record(
            shop,
            &rule,
            RuleAction::RULE_APPLIED_ALL,
            json!({
                "success": report.success,
                "failed": report.failed,
                "total": report.total,
            }),
        )
        .await;
        report
    }

    async fn evaluate(&self, rule: &DiscountRule) -> Result<Entitlement, String> {
        let collections = self.gateway.list_collections().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list collections");
            e.detail()
        })?;
        let descriptors: Vec<CollectionDescriptor> =
            collections.iter().map(|c| c.descriptor()).collect();
        let ids = entitled_collections(Some(rule), &descriptors);
        let summary = summarize(&descriptors, &ids);
        Ok(Entitlement { ids, summary })
    }

    async fn apply_one(&self, discount: &DiscountSummary, entitlement: &Entitlement) -> ApplyOutcome {
        let outcome = DiscountSynchronizer::new(self.gateway.as_ref())
            .sync(discount, &entitlement.ids)
            .await;
        applied_outcome(&discount.title, &entitlement.summary, outcome)
    }

    async fn record(
        &self,
        shop: &ShopDomain,
        rule: &DiscountRule,
        action: &str,
        metadata: serde_json::Value,
    ) {
        if let Err(e) = self
            .store
            .append_log(shop, action, Some(rule.id), Some(metadata))
            .await
        {
            tracing::warn!(error = %e, action, "Failed to record rule application");
        }
    }
}

fn applied_outcome(title: &str, summary: &EntitlementSummary, outcome: SyncOutcome) -> ApplyOutcome {
    if outcome.success {
        let message = if summary.entitled == 0 {
            format!(
                "Successfully applied rules to \"{title}\". All collections excluded - discount applies to no specific collections."
            )
        } else {
            format!(
                "Successfully applied rules to \"{title}\". {} collections active ({} excluded).",
                summary.entitled, summary.excluded
            )
        };
        return ApplyOutcome {
            success: true,
            message,
            failure: None,
        };
    }

    ApplyOutcome {
        success: false,
        message: format!(
            "Failed to apply rules: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        ),
        failure: outcome.failure,
    }
}
