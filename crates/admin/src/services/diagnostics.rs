//! Live mutation checks against a shop.
//!
//! Exercises the synchronizer end to end against real discounts: one basic
//! discount of each kind, a rejection check for every incompatible kind and
//! a short timed batch. The checks mutate discounts, so run them against a
//! development store.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::instrument;

use collection_gate_core::{DiscountKind, IncompatibleKind, ShopDomain};

use crate::shopify::{DiscountSummary, ShopifyGateway};

use super::apply::RuleApplier;

/// Pause between discounts in the timed batch.
pub const BATCH_PAUSE: Duration = Duration::from_millis(500);

/// Discounts included in the timed batch.
const BATCH_SIZE: usize = 3;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResult {
    pub name: String,
    pub success: bool,
    pub message: String,
    pub discount_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<String>,
}

impl DiagnosticResult {
    fn new(name: impl Into<String>, kind: impl Into<String>, success: bool, message: String) -> Self {
        Self {
            name: name.into(),
            success,
            message,
            discount_kind: kind.into(),
            discount_id: None,
        }
    }

    fn for_discount(mut self, id: &str) -> Self {
        self.discount_id = Some(id.to_string());
        self
    }
}

/// Runs the mutation checks.
pub struct Diagnostics<'a> {
    applier: &'a RuleApplier,
    gateway: &'a dyn ShopifyGateway,
    batch_pause: Duration,
}

impl<'a> Diagnostics<'a> {
    #[must_use]
    pub const fn new(applier: &'a RuleApplier, gateway: &'a dyn ShopifyGateway) -> Self {
        Self {
            applier,
            gateway,
            batch_pause: BATCH_PAUSE,
        }
    }

    /// Override the pause used by the timed batch.
    #[must_use]
    pub const fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Run every check. A failing check never stops the ones after it.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn run(&self, shop: &ShopDomain) -> Vec<DiagnosticResult> {
        let mut results = vec![self.connectivity().await];

        let discounts = match self.gateway.list_discounts().await {
            Ok(discounts) => discounts,
            Err(e) => {
                results.push(DiagnosticResult::new(
                    "Discount Inventory",
                    "Inventory Test",
                    false,
                    format!("Failed to list discounts: {}", e.detail()),
                ));
                return results;
            }
        };

        for kind in [DiscountKind::CodeBasic, DiscountKind::AutomaticBasic] {
            results.push(self.basic_check(shop, &discounts, &kind).await);
        }
        for kind in IncompatibleKind::ALL {
            results.push(self.rejection_check(shop, &discounts, kind).await);
        }
        results.push(self.batch_check(shop, &discounts).await);

        let passed = results.iter().filter(|r| r.success).count();
        tracing::info!(passed, total = results.len(), "Diagnostics finished");
        results
    }

    async fn connectivity(&self) -> DiagnosticResult {
        const NAME: &str = "GraphQL Connectivity Test";
        const KIND: &str = "Connectivity Test";
        match self.gateway.list_collections().await {
            Ok(collections) => DiagnosticResult::new(
                NAME,
                KIND,
                true,
                format!("Connected; {} collections visible", collections.len()),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Connectivity check failed");
                DiagnosticResult::new(
                    NAME,
                    KIND,
                    false,
                    format!("GraphQL connection failed: {}", e.detail()),
                )
            }
        }
    }

    async fn basic_check(
        &self,
        shop: &ShopDomain,
        discounts: &[DiscountSummary],
        kind: &DiscountKind,
    ) -> DiagnosticResult {
        let typename = kind.typename();
        let name = format!("{typename} Mutation");
        let Some(discount) = discounts.iter().find(|d| &d.kind == kind) else {
            return DiagnosticResult::new(
                name,
                typename,
                false,
                format!("No {typename} found for testing"),
            );
        };

        let outcome = self.applier.apply_to_discount(shop, &discount.id).await;
        let message = if outcome.success {
            format!("Successfully applied rules to {}", discount.title)
        } else {
            outcome.message
        };
        DiagnosticResult::new(name, typename, outcome.success, message).for_discount(&discount.id)
    }

    async fn rejection_check(
        &self,
        shop: &ShopDomain,
        discounts: &[DiscountSummary],
        kind: IncompatibleKind,
    ) -> DiagnosticResult {
        let typename = kind.typename();
        let name = format!("{typename} Rejection Test");
        let target = DiscountKind::Incompatible(kind);
        let Some(discount) = discounts.iter().find(|d| d.kind == target) else {
            return DiagnosticResult::new(
                name,
                typename,
                true,
                format!("No {typename} found (OK - not testing rejection)"),
            );
        };

        let outcome = self.applier.apply_to_discount(shop, &discount.id).await;
        let message = if outcome.success {
            "ERROR: Should have rejected unsupported type".to_string()
        } else {
            format!("Correctly rejected: {}", outcome.message)
        };
        DiagnosticResult::new(name, typename, !outcome.success, message).for_discount(&discount.id)
    }

    async fn batch_check(&self, shop: &ShopDomain, discounts: &[DiscountSummary]) -> DiagnosticResult {
        const NAME: &str = "Bulk Mutation Performance";
        const KIND: &str = "Performance Test";

        let batch: Vec<&DiscountSummary> = discounts
            .iter()
            .filter(|d| d.kind.basic().is_some())
            .take(BATCH_SIZE)
            .collect();
        if batch.is_empty() {
            return DiagnosticResult::new(
                NAME,
                KIND,
                false,
                "No supported discounts found for bulk testing".to_string(),
            );
        }

        let started = Instant::now();
        let mut succeeded = 0usize;
        for discount in &batch {
            if self.applier.apply_to_discount(shop, &discount.id).await.success {
                succeeded += 1;
            } else {
                tracing::warn!(discount_id = %discount.id, "Batch discount failed");
            }
            if !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        let elapsed = started.elapsed().as_millis();
        let average = elapsed / batch.len() as u128;
        DiagnosticResult::new(
            NAME,
            KIND,
            succeeded > 0,
            format!(
                "Processed {} discounts in {elapsed}ms (avg: {average}ms/discount)",
                batch.len()
            ),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use collection_gate_core::{CollectionDescriptor, NewRule, RuleMode, collection_gid};

    use super::*;
    use crate::db::RuleStore;
    use crate::shopify::DiscountValue;
    use crate::testing::{FakeShopify, MemoryRuleStore};

    fn shop() -> ShopDomain {
        ShopDomain::parse("demo.myshopify.com").unwrap()
    }

    async fn setup(fake: FakeShopify) -> (Arc<FakeShopify>, RuleApplier) {
        let store = Arc::new(MemoryRuleStore::new());
        store
            .upsert_rule(&NewRule::new(
                shop(),
                RuleMode::Exclude,
                vec![CollectionDescriptor::new(collection_gid("2"), "Hidden", 1)],
            ))
            .await
            .unwrap();
        let fake = Arc::new(fake);
        let applier = RuleApplier::new(store, fake.clone());
        (fake, applier)
    }

    fn value() -> Option<DiscountValue> {
        Some(DiscountValue::Percentage { percentage: 0.1 })
    }

    #[tokio::test]
    async fn test_run_reports_every_check() {
        let (fake, applier) = setup(
            FakeShopify::new()
                .with_collection("1", "Shown", 2)
                .with_collection("2", "Hidden", 1)
                .with_discount(
                    "gid://shopify/DiscountCodeNode/1",
                    "Code",
                    DiscountKind::CodeBasic,
                    value(),
                    Vec::new(),
                )
                .with_discount(
                    "gid://shopify/DiscountCodeNode/2",
                    "Ship",
                    DiscountKind::Incompatible(IncompatibleKind::CodeFreeShipping),
                    None,
                    Vec::new(),
                ),
        )
        .await;

        let results = Diagnostics::new(&applier, fake.as_ref())
            .with_batch_pause(Duration::ZERO)
            .run(&shop())
            .await;

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "GraphQL Connectivity Test",
                "DiscountCodeBasic Mutation",
                "DiscountAutomaticBasic Mutation",
                "DiscountCodeBxgy Rejection Test",
                "DiscountAutomaticBxgy Rejection Test",
                "DiscountCodeFreeShipping Rejection Test",
                "DiscountAutomaticFreeShipping Rejection Test",
                "Bulk Mutation Performance",
            ]
        );

        assert!(results[0].success);
        assert!(results[1].success);
        assert_eq!(results[1].message, "Successfully applied rules to Code");
        assert!(!results[2].success);
        assert_eq!(
            results[2].message,
            "No DiscountAutomaticBasic found for testing"
        );
        assert!(results[3].success);
        assert_eq!(
            results[3].message,
            "No DiscountCodeBxgy found (OK - not testing rejection)"
        );
        assert!(results[5].success);
        assert!(results[5].message.starts_with("Correctly rejected: "));
        assert_eq!(
            results[5].discount_id.as_deref(),
            Some("gid://shopify/DiscountCodeNode/2")
        );
        assert!(results[7].success);
        assert!(results[7].message.starts_with("Processed 1 discounts in "));
    }

    #[tokio::test]
    async fn test_run_stops_after_inventory_failure() {
        let (fake, applier) = setup(FakeShopify::new().with_list_failure("Unavailable")).await;

        let results = Diagnostics::new(&applier, fake.as_ref()).run(&shop()).await;

        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(
            results[1].message,
            "Failed to list discounts: Unavailable"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_pauses_between_discounts() {
        let (fake, applier) = setup(
            FakeShopify::new()
                .with_collection("1", "Shown", 2)
                .with_discount(
                    "gid://shopify/DiscountCodeNode/1",
                    "One",
                    DiscountKind::CodeBasic,
                    value(),
                    Vec::new(),
                )
                .with_discount(
                    "gid://shopify/DiscountAutomaticNode/2",
                    "Two",
                    DiscountKind::AutomaticBasic,
                    value(),
                    Vec::new(),
                ),
        )
        .await;

        let diagnostics = Diagnostics::new(&applier, fake.as_ref());
        let discounts = fake.list_discounts().await.unwrap();
        let before = tokio::time::Instant::now();
        let result = diagnostics.batch_check(&shop(), &discounts).await;

        assert!(result.success);
        assert!(before.elapsed() >= BATCH_PAUSE * 2);
    }
}
