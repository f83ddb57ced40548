//! Discount synchronizer.
//!
//! Converges a discount's eligible collections onto an entitled set. The
//! Admin API has no "set collections" operation, so a sync is two mutations:
//!
//! 1. **Clear**: if the discount has collections attached, rewrite it with
//!    `items: { all: true }`. Best effort; a failure is logged and the sync
//!    continues, since the API has been seen to reject the clear while still
//!    accepting the replace that follows.
//! 2. **Replace**: rewrite it with `items: { all: false, collections: { add } }`
//!    carrying the entitled collections, or `{ all: true }` when the entitled
//!    set is empty. The outcome of this phase is the outcome of the sync.
//!
//! Both mutations resend the discount's existing value, converted to the
//! mutation input shape. A value we cannot interpret fails the sync rather
//! than being replaced with a default.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use collection_gate_core::{
    BasicDiscountKind, DiscountKind, IncompatibleKind, collection_gid, discount_mutation_gid,
    discount_query_gid,
};

use crate::shopify::{
    AdminShopifyError, BasicDiscountUpdate, CustomerGetsInput, DiscountConfig, DiscountSummary,
    DiscountValue, ItemsInput, MutationValue, ShopifyGateway, UserError,
};

/// Why a sync did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The discount kind cannot be scoped by collection. Not retryable.
    #[error("Incompatible discount type {}: {}", .0.typename(), .0.reason())]
    Incompatible(IncompatibleKind),

    /// The discount kind is not recognised. Not retryable.
    #[error("Unsupported discount type: {0}")]
    UnsupportedType(String),

    /// The current configuration could not be read. The caller may retry.
    #[error("Could not retrieve full discount configuration: {0}")]
    ConfigUnavailable(String),

    /// The existing value is neither a percentage nor an amount.
    #[error("Could not determine the discount value; refusing to overwrite it")]
    UndeterminedValue,

    /// The replace mutation was rejected. Messages are reported verbatim.
    #[error("{0}")]
    Remote(String),

    /// The replace mutation never reached the API or its response was lost.
    #[error("{0}")]
    Transport(String),
}

impl SyncError {
    /// Whether re-running the sync later might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ConfigUnavailable(_) | Self::Transport(_))
    }
}

/// Result of one mutation phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum PhaseResult {
    /// The phase was not needed (or the sync stopped before reaching it).
    Skipped,
    /// The mutation was accepted.
    Succeeded,
    /// The mutation failed with this message.
    Failed(String),
}

/// Per-phase record of a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPhases {
    /// Clear phase. Informational only.
    pub clear: PhaseResult,
    /// Replace phase. Decides the outcome.
    pub replace: PhaseResult,
}

impl Default for SyncPhases {
    fn default() -> Self {
        Self {
            clear: PhaseResult::Skipped,
            replace: PhaseResult::Skipped,
        }
    }
}

/// Outcome of [`DiscountSynchronizer::sync`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Whether the replace phase succeeded.
    pub success: bool,
    /// Failure message, when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// What happened in each phase.
    pub phases: SyncPhases,
    /// Structured failure, for callers that need to classify it.
    #[serde(skip)]
    pub failure: Option<SyncError>,
}

impl SyncOutcome {
    fn succeeded(phases: SyncPhases) -> Self {
        Self {
            success: true,
            error: None,
            phases,
            failure: None,
        }
    }

    fn failed(error: SyncError, phases: SyncPhases) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            phases,
            failure: Some(error),
        }
    }
}

impl MutationValue {
    /// Convert a discount's current value into the mutation input shape.
    ///
    /// Percentages pass through unchanged. Fixed amounts become
    /// `discountAmount` with `appliesOnEachItem: false`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UndeterminedValue` when there is no value.
    pub fn from_existing(value: Option<&DiscountValue>) -> Result<Self, SyncError> {
        match value {
            Some(DiscountValue::Percentage { percentage }) => Ok(Self::Percentage(*percentage)),
            Some(DiscountValue::FixedAmount { amount, .. }) => Ok(Self::DiscountAmount {
                amount: *amount,
                applies_on_each_item: false,
            }),
            None => Err(SyncError::UndeterminedValue),
        }
    }
}

/// Join user errors the way they are shown to merchants.
#[must_use]
pub fn join_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrites discounts through a [`ShopifyGateway`].
pub struct DiscountSynchronizer<'a> {
    gateway: &'a dyn ShopifyGateway,
}

impl<'a> DiscountSynchronizer<'a> {
    /// Create a synchronizer over `gateway`.
    #[must_use]
    pub const fn new(gateway: &'a dyn ShopifyGateway) -> Self {
        Self { gateway }
    }

    /// Converge `discount` onto `entitled_ids` (numeric collection ids).
    ///
    /// Never returns an error; every failure is reported in the outcome.
    #[instrument(
        skip(self, discount, entitled_ids),
        fields(discount_id = %discount.id, kind = %discount.kind, entitled = entitled_ids.len())
    )]
    pub async fn sync(&self, discount: &DiscountSummary, entitled_ids: &[String]) -> SyncOutcome {
        let mut phases = SyncPhases::default();

        let kind = match &discount.kind {
            DiscountKind::CodeBasic => BasicDiscountKind::Code,
            DiscountKind::AutomaticBasic => BasicDiscountKind::Automatic,
            DiscountKind::Incompatible(kind) => {
                tracing::info!("Rejecting incompatible discount type");
                return SyncOutcome::failed(SyncError::Incompatible(*kind), phases);
            }
            DiscountKind::Unsupported(name) => {
                tracing::info!("Rejecting unsupported discount type");
                return SyncOutcome::failed(SyncError::UnsupportedType(name.clone()), phases);
            }
        };

        let config = match self.fetch_config(&discount.id).await {
            Ok(config) => config,
            Err(e) => return SyncOutcome::failed(e, phases),
        };

        let value = match MutationValue::from_existing(config.value.as_ref()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Discount value shape not recognised");
                return SyncOutcome::failed(e, phases);
            }
        };

        let mutation_gid = discount_mutation_gid(&discount.id, kind);

        if !config.collection_ids.is_empty() {
            phases.clear = self
                .clear(kind, &mutation_gid, value.clone(), config.collection_ids.len())
                .await;
        }

        let gids: Vec<String> = entitled_ids.iter().map(|id| collection_gid(id)).collect();
        let update = BasicDiscountUpdate {
            customer_gets: CustomerGetsInput {
                value,
                items: ItemsInput::collections(gids),
            },
            applies_once_per_customer: config.applies_once_per_customer,
        };

        match self
            .gateway
            .update_basic_discount(kind, &mutation_gid, &update)
            .await
        {
            Ok(errors) if errors.is_empty() => {
                phases.replace = PhaseResult::Succeeded;
                tracing::info!("Discount collections replaced");
                SyncOutcome::succeeded(phases)
            }
            Ok(errors) => {
                let message = join_user_errors(&errors);
                phases.replace = PhaseResult::Failed(message.clone());
                tracing::warn!(error = %message, "Replace phase rejected");
                SyncOutcome::failed(SyncError::Remote(message), phases)
            }
            Err(e) => {
                let message = e.detail();
                phases.replace = PhaseResult::Failed(message.clone());
                tracing::warn!(error = %message, "Replace phase failed");
                let error = match e {
                    AdminShopifyError::Http(_)
                    | AdminShopifyError::Parse(_)
                    | AdminShopifyError::RateLimited(_) => SyncError::Transport(message),
                    _ => SyncError::Remote(message),
                };
                SyncOutcome::failed(error, phases)
            }
        }
    }

    async fn fetch_config(&self, discount_gid: &str) -> Result<DiscountConfig, SyncError> {
        let query_gid = discount_query_gid(discount_gid);
        match self.gateway.discount_config(&query_gid).await {
            Ok(Some(config)) => Ok(config),
            Ok(None) => Err(SyncError::ConfigUnavailable(format!(
                "no basic discount found for {query_gid}"
            ))),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch discount configuration");
                Err(SyncError::ConfigUnavailable(e.detail()))
            }
        }
    }

    async fn clear(
        &self,
        kind: BasicDiscountKind,
        mutation_gid: &str,
        value: MutationValue,
        attached: usize,
    ) -> PhaseResult {
        let update = BasicDiscountUpdate {
            customer_gets: CustomerGetsInput {
                value,
                items: ItemsInput::all(),
            },
            applies_once_per_customer: None,
        };

        let result = match self
            .gateway
            .update_basic_discount(kind, mutation_gid, &update)
            .await
        {
            Ok(errors) if errors.is_empty() => PhaseResult::Succeeded,
            Ok(errors) => PhaseResult::Failed(join_user_errors(&errors)),
            Err(e) => PhaseResult::Failed(e.detail()),
        };

        match &result {
            PhaseResult::Failed(message) => {
                tracing::warn!(error = %message, attached, "Clear phase failed, continuing with replace");
            }
            _ => tracing::debug!(attached, "Cleared existing collections"),
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::testing::{FakeShopify, MutationScript};

    #[test]
    fn test_mutation_value_percentage_passes_through() {
        let value = DiscountValue::Percentage { percentage: 20.0 };
        assert_eq!(
            MutationValue::from_existing(Some(&value)),
            Ok(MutationValue::Percentage(20.0))
        );
    }

    #[test]
    fn test_mutation_value_fixed_amount_wraps_in_discount_amount() {
        let value = DiscountValue::FixedAmount {
            amount: Decimal::new(1500, 2),
            currency_code: Some("USD".to_string()),
        };
        assert_eq!(
            MutationValue::from_existing(Some(&value)),
            Ok(MutationValue::DiscountAmount {
                amount: Decimal::new(1500, 2),
                applies_on_each_item: false,
            })
        );
    }

    #[test]
    fn test_mutation_value_missing_is_an_error() {
        assert_eq!(
            MutationValue::from_existing(None),
            Err(SyncError::UndeterminedValue)
        );
    }

    #[test]
    fn test_sync_error_messages() {
        let err = SyncError::Incompatible(IncompatibleKind::CodeBxgy);
        let message = err.to_string();
        assert!(message.starts_with("Incompatible discount type DiscountCodeBxgy"));
        assert!(message.contains("Not compatible"));

        let err = SyncError::Incompatible(IncompatibleKind::AutomaticFreeShipping);
        assert!(err.to_string().contains("don't use collection restrictions"));

        assert_eq!(
            SyncError::UnsupportedType("DiscountCodeApp".to_string()).to_string(),
            "Unsupported discount type: DiscountCodeApp"
        );
        assert_eq!(SyncError::Remote("a, b".to_string()).to_string(), "a, b");
    }

    #[test]
    fn test_sync_error_transience() {
        assert!(SyncError::ConfigUnavailable("timeout".to_string()).is_transient());
        assert!(SyncError::Transport("reset".to_string()).is_transient());
        assert!(!SyncError::Remote("invalid".to_string()).is_transient());
        assert!(!SyncError::Incompatible(IncompatibleKind::CodeBxgy).is_transient());
    }

    #[test]
    fn test_join_user_errors() {
        let errors = vec![
            UserError {
                field: Some(vec!["id".to_string()]),
                message: "Discount does not exist".to_string(),
            },
            UserError {
                field: None,
                message: "Value is invalid".to_string(),
            },
        ];
        assert_eq!(
            join_user_errors(&errors),
            "Discount does not exist, Value is invalid"
        );
    }

    fn percent(value: f64) -> Option<DiscountValue> {
        Some(DiscountValue::Percentage { percentage: value })
    }

    #[tokio::test]
    async fn test_sync_clears_then_replaces_attached_collections() {
        let fake = FakeShopify::new().with_discount(
            "gid://shopify/DiscountCodeNode/7",
            "Spring",
            DiscountKind::CodeBasic,
            percent(0.2),
            vec![collection_gid("1")],
        );
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake)
            .sync(&discount, &["2".to_string(), "3".to_string()])
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.phases.clear, PhaseResult::Succeeded);
        assert_eq!(outcome.phases.replace, PhaseResult::Succeeded);

        let calls = fake.mutations();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].gid, "gid://shopify/DiscountCodeNode/7");
        assert_eq!(calls[0].update.customer_gets.items, ItemsInput::all());
        assert_eq!(calls[0].update.applies_once_per_customer, None);
        assert_eq!(
            calls[1].update.customer_gets.items,
            ItemsInput::collections(vec![collection_gid("2"), collection_gid("3")])
        );
        assert_eq!(calls[1].update.applies_once_per_customer, Some(true));
        assert_eq!(
            calls[1].update.customer_gets.value,
            MutationValue::Percentage(0.2)
        );
    }

    #[tokio::test]
    async fn test_sync_skips_clear_when_nothing_attached() {
        let fake = FakeShopify::new().with_discount(
            "gid://shopify/DiscountAutomaticNode/8",
            "Auto",
            DiscountKind::AutomaticBasic,
            percent(10.0),
            Vec::new(),
        );
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake).sync(&discount, &[]).await;

        assert!(outcome.success);
        assert_eq!(outcome.phases.clear, PhaseResult::Skipped);
        let calls = fake.mutations();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, BasicDiscountKind::Automatic);
        assert_eq!(calls[0].gid, "gid://shopify/DiscountAutomaticNode/8");
        assert_eq!(calls[0].update.customer_gets.items, ItemsInput::all());
    }

    #[tokio::test]
    async fn test_sync_continues_after_clear_failure() {
        let fake = FakeShopify::new()
            .with_discount(
                "gid://shopify/DiscountCodeNode/7",
                "Spring",
                DiscountKind::CodeBasic,
                percent(0.2),
                vec![collection_gid("1")],
            )
            .with_mutation_scripts(vec![MutationScript::UserErrors(vec![
                "Items cannot be cleared".to_string(),
            ])]);
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake)
            .sync(&discount, &["2".to_string()])
            .await;

        assert!(outcome.success);
        assert_eq!(
            outcome.phases.clear,
            PhaseResult::Failed("Items cannot be cleared".to_string())
        );
        assert_eq!(fake.mutations().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_reports_replace_user_errors_verbatim() {
        let fake = FakeShopify::new()
            .with_discount(
                "gid://shopify/DiscountCodeNode/7",
                "Spring",
                DiscountKind::CodeBasic,
                percent(0.2),
                Vec::new(),
            )
            .with_mutation_scripts(vec![MutationScript::UserErrors(vec![
                "Collection does not exist".to_string(),
                "Value is invalid".to_string(),
            ])]);
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake)
            .sync(&discount, &["99".to_string()])
            .await;

        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Collection does not exist, Value is invalid")
        );
        assert!(matches!(outcome.failure, Some(SyncError::Remote(_))));
    }

    #[tokio::test]
    async fn test_sync_rate_limited_replace_is_transient() {
        let fake = FakeShopify::new()
            .with_discount(
                "gid://shopify/DiscountCodeNode/7",
                "Spring",
                DiscountKind::CodeBasic,
                percent(0.2),
                Vec::new(),
            )
            .with_mutation_scripts(vec![MutationScript::RateLimited(2)]);
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake).sync(&discount, &[]).await;

        assert!(!outcome.success);
        assert!(outcome.failure.as_ref().is_some_and(SyncError::is_transient));
    }

    #[tokio::test]
    async fn test_sync_rejects_incompatible_without_remote_calls() {
        let fake = FakeShopify::new().with_discount(
            "gid://shopify/DiscountCodeNode/9",
            "Free shipping",
            DiscountKind::Incompatible(IncompatibleKind::CodeFreeShipping),
            None,
            Vec::new(),
        );
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake).sync(&discount, &[]).await;

        assert!(!outcome.success);
        assert!(
            outcome
                .error
                .unwrap()
                .contains("Free shipping discounts don't use collection restrictions")
        );
        assert!(fake.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_sync_rejects_buy_x_get_y_without_mutation() {
        for (gid, kind) in [
            ("gid://shopify/DiscountCodeNode/11", IncompatibleKind::CodeBxgy),
            ("gid://shopify/DiscountAutomaticNode/12", IncompatibleKind::AutomaticBxgy),
        ] {
            let fake = FakeShopify::new().with_discount(
                gid,
                "Buy one get one",
                DiscountKind::Incompatible(kind),
                None,
                vec![collection_gid("1")],
            );
            let discount = fake.list_discounts().await.unwrap().remove(0);

            let outcome = DiscountSynchronizer::new(&fake)
                .sync(&discount, &["5".to_string()])
                .await;

            assert!(!outcome.success);
            assert!(matches!(outcome.failure, Some(SyncError::Incompatible(k)) if k == kind));
            assert_eq!(outcome.phases.clear, PhaseResult::Skipped);
            assert_eq!(outcome.phases.replace, PhaseResult::Skipped);
            assert!(fake.mutations().is_empty());
        }
    }

    #[tokio::test]
    async fn test_sync_sends_entitled_collections_with_whole_percentage() {
        let fake = FakeShopify::new().with_discount(
            "gid://shopify/DiscountCodeNode/20",
            "Twenty off",
            DiscountKind::CodeBasic,
            percent(20.0),
            Vec::new(),
        );
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake)
            .sync(&discount, &["5".to_string(), "9".to_string()])
            .await;

        assert!(outcome.success);
        let calls = fake.mutations();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            serde_json::to_value(&calls[0].update).unwrap(),
            serde_json::json!({
                "customerGets": {
                    "value": { "percentage": 20.0 },
                    "items": {
                        "all": false,
                        "collections": {
                            "add": ["gid://shopify/Collection/5", "gid://shopify/Collection/9"]
                        }
                    }
                },
                "appliesOncePerCustomer": true
            })
        );
    }

    #[tokio::test]
    async fn test_sync_rejects_unknown_type() {
        let fake = FakeShopify::new().with_discount(
            "gid://shopify/DiscountCodeNode/10",
            "App",
            DiscountKind::Unsupported("DiscountCodeApp".to_string()),
            None,
            Vec::new(),
        );
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake).sync(&discount, &[]).await;

        assert_eq!(
            outcome.error.as_deref(),
            Some("Unsupported discount type: DiscountCodeApp")
        );
        assert!(fake.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_sync_config_failure_is_transient_and_mutates_nothing() {
        let fake = FakeShopify::new()
            .with_discount(
                "gid://shopify/DiscountCodeNode/7",
                "Spring",
                DiscountKind::CodeBasic,
                percent(0.2),
                Vec::new(),
            )
            .with_config_failure("7", "Internal error");
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake).sync(&discount, &[]).await;

        assert!(!outcome.success);
        assert_eq!(
            outcome.failure,
            Some(SyncError::ConfigUnavailable("Internal error".to_string()))
        );
        assert!(fake.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_sync_refuses_to_overwrite_unknown_value() {
        let fake = FakeShopify::new().with_discount(
            "gid://shopify/DiscountCodeNode/7",
            "Spring",
            DiscountKind::CodeBasic,
            None,
            Vec::new(),
        );
        let discount = fake.list_discounts().await.unwrap().remove(0);

        let outcome = DiscountSynchronizer::new(&fake).sync(&discount, &[]).await;

        assert_eq!(outcome.failure, Some(SyncError::UndeterminedValue));
        assert!(fake.mutations().is_empty());
    }

    #[test]
    fn test_phase_result_serializes_with_status() {
        assert_eq!(
            serde_json::to_value(PhaseResult::Failed("boom".to_string())).unwrap(),
            serde_json::json!({ "status": "failed", "error": "boom" })
        );
        assert_eq!(
            serde_json::to_value(PhaseResult::Skipped).unwrap(),
            serde_json::json!({ "status": "skipped" })
        );
    }
}
