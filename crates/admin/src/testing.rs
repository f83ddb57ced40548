//! In-memory doubles for the Shopify gateway and the rule store.
//!
//! Enabled for unit tests and, through the `testing` feature, for the
//! integration test crate.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use collection_gate_core::{
    BasicDiscountKind, DiscountKind, DiscountRule, NewRule, RuleAction, RuleId, RuleLogEntry,
    RuleLogId, ShopDomain, numeric_id,
};

use crate::db::{RepositoryError, RuleStore, ShopRedaction};
use crate::shopify::{
    AdminShopifyError, BasicDiscountUpdate, Collection, DiscountConfig, DiscountSummary,
    DiscountValue, ShopifyGateway, UserError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A recorded call to `update_basic_discount`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMutation {
    pub kind: BasicDiscountKind,
    pub gid: String,
    pub update: BasicDiscountUpdate,
}

/// Scripted response for one mutation call.
#[derive(Debug, Clone)]
pub enum MutationScript {
    /// Accept the mutation.
    Accept,
    /// Reply with these user error messages.
    UserErrors(Vec<String>),
    /// Fail with a top-level GraphQL error.
    Rejected(String),
    /// Fail as throttled, retry after this many seconds.
    RateLimited(u64),
}

#[derive(Default)]
struct FakeShopifyState {
    collections: Vec<Collection>,
    discounts: Vec<DiscountSummary>,
    configs: HashMap<String, DiscountConfig>,
    config_failures: HashMap<String, String>,
    list_failure: Option<String>,
    scripts: Vec<MutationScript>,
    mutations: Vec<RecordedMutation>,
}

/// [`ShopifyGateway`] over in-memory collections and discounts.
///
/// Mutations are recorded and answered from a script queue; once the queue
/// is empty every mutation is accepted.
#[derive(Default)]
pub struct FakeShopify {
    state: Mutex<FakeShopifyState>,
}

impl FakeShopify {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection with the given numeric id.
    #[must_use]
    pub fn with_collection(self, numeric: &str, title: &str, products: i64) -> Self {
        lock(&self.state).collections.push(Collection {
            id: format!("gid://shopify/Collection/{numeric}"),
            title: Some(title.to_string()),
            handle: Some(title.to_lowercase().replace(' ', "-")),
            products_count: products,
        });
        self
    }

    /// Add a discount, plus a matching configuration for basic kinds.
    ///
    /// `attached` is the list of collection GIDs currently on the discount.
    #[must_use]
    pub fn with_discount(
        self,
        gid: &str,
        title: &str,
        kind: DiscountKind,
        value: Option<DiscountValue>,
        attached: Vec<String>,
    ) -> Self {
        {
            let mut state = lock(&self.state);
            let numeric = numeric_id(gid).unwrap_or_default().to_string();
            if let Some(basic) = kind.basic() {
                state.configs.insert(
                    format!("gid://shopify/DiscountNode/{numeric}"),
                    DiscountConfig {
                        kind: basic,
                        title: title.to_string(),
                        value: value.clone(),
                        collection_ids: attached.clone(),
                        applies_once_per_customer: match basic {
                            BasicDiscountKind::Code => Some(true),
                            BasicDiscountKind::Automatic => None,
                        },
                        usage_limit: None,
                        starts_at: None,
                        ends_at: None,
                    },
                );
            }
            state.discounts.push(DiscountSummary {
                id: gid.to_string(),
                numeric_id: numeric,
                title: title.to_string(),
                kind,
                status: Some("ACTIVE".to_string()),
                codes: Vec::new(),
                value,
            });
        }
        self
    }

    /// Make `discount_config` fail for the discount with this numeric id.
    #[must_use]
    pub fn with_config_failure(self, numeric: &str, message: &str) -> Self {
        lock(&self.state).config_failures.insert(
            format!("gid://shopify/DiscountNode/{numeric}"),
            message.to_string(),
        );
        self
    }

    /// Make the inventory listings fail.
    #[must_use]
    pub fn with_list_failure(self, message: &str) -> Self {
        lock(&self.state).list_failure = Some(message.to_string());
        self
    }

    /// Queue responses for the next mutation calls, in order.
    #[must_use]
    pub fn with_mutation_scripts(self, scripts: Vec<MutationScript>) -> Self {
        lock(&self.state).scripts.extend(scripts);
        self
    }

    /// Every mutation received so far.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedMutation> {
        lock(&self.state).mutations.clone()
    }
}

#[async_trait]
impl ShopifyGateway for FakeShopify {
    async fn list_collections(&self) -> Result<Vec<Collection>, AdminShopifyError> {
        let state = lock(&self.state);
        if let Some(message) = &state.list_failure {
            return Err(AdminShopifyError::graphql(message));
        }
        Ok(state.collections.clone())
    }

    async fn list_discounts(&self) -> Result<Vec<DiscountSummary>, AdminShopifyError> {
        let state = lock(&self.state);
        if let Some(message) = &state.list_failure {
            return Err(AdminShopifyError::graphql(message));
        }
        Ok(state.discounts.clone())
    }

    async fn discount_config(&self, gid: &str) -> Result<Option<DiscountConfig>, AdminShopifyError> {
        let state = lock(&self.state);
        if let Some(message) = state.config_failures.get(gid) {
            return Err(AdminShopifyError::graphql(message));
        }
        Ok(state.configs.get(gid).cloned())
    }

    async fn update_basic_discount(
        &self,
        kind: BasicDiscountKind,
        gid: &str,
        update: &BasicDiscountUpdate,
    ) -> Result<Vec<UserError>, AdminShopifyError> {
        let mut state = lock(&self.state);
        state.mutations.push(RecordedMutation {
            kind,
            gid: gid.to_string(),
            update: update.clone(),
        });
        let script = if state.scripts.is_empty() {
            MutationScript::Accept
        } else {
            state.scripts.remove(0)
        };
        match script {
            MutationScript::Accept => Ok(Vec::new()),
            MutationScript::UserErrors(messages) => Ok(messages
                .into_iter()
                .map(|message| UserError {
                    field: None,
                    message,
                })
                .collect()),
            MutationScript::Rejected(message) => Err(AdminShopifyError::graphql(message)),
            MutationScript::RateLimited(seconds) => Err(AdminShopifyError::RateLimited(seconds)),
        }
    }
}

#[derive(Default)]
struct MemoryState {
    rules: Vec<DiscountRule>,
    logs: Vec<RuleLogEntry>,
    next_rule: i64,
    next_log: i64,
}

/// [`RuleStore`] kept in memory. One rule per shop, like the database.
#[derive(Default)]
pub struct MemoryRuleStore {
    state: Mutex<MemoryState>,
}

impl MemoryRuleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every log entry for `shop`, oldest first.
    #[must_use]
    pub fn logs(&self, shop: &ShopDomain) -> Vec<RuleLogEntry> {
        lock(&self.state)
            .logs
            .iter()
            .filter(|l| &l.shop == shop)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn active_rule(&self, shop: &ShopDomain) -> Result<Option<DiscountRule>, RepositoryError> {
        Ok(lock(&self.state)
            .rules
            .iter()
            .filter(|r| &r.shop == shop && r.active)
            .max_by_key(|r| (r.updated_at, r.id.as_i64()))
            .cloned())
    }

    async fn upsert_rule(&self, rule: &NewRule) -> Result<DiscountRule, RepositoryError> {
        let mut state = lock(&self.state);
        let now = Utc::now();
        if let Some(existing) = state.rules.iter_mut().find(|r| r.shop == rule.shop) {
            existing.mode = rule.mode;
            existing.active = true;
            existing.excluded.clone_from(&rule.excluded);
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        state.next_rule += 1;
        let saved = DiscountRule {
            id: RuleId::new(state.next_rule),
            shop: rule.shop.clone(),
            mode: rule.mode,
            active: true,
            excluded: rule.excluded.clone(),
            created_at: now,
            updated_at: now,
        };
        state.rules.push(saved.clone());
        Ok(saved)
    }

    async fn append_log(
        &self,
        shop: &ShopDomain,
        action: &str,
        rule_id: Option<RuleId>,
        metadata: Option<serde_json::Value>,
    ) -> Result<RuleLogEntry, RepositoryError> {
        let mut state = lock(&self.state);
        state.next_log += 1;
        let entry = RuleLogEntry {
            id: RuleLogId::new(state.next_log),
            shop: shop.clone(),
            action: action.to_string(),
            rule_id,
            metadata,
            created_at: Utc::now(),
        };
        state.logs.push(entry.clone());
        Ok(entry)
    }

    async fn recent_logs(
        &self,
        shop: &ShopDomain,
        limit: i64,
    ) -> Result<Vec<RuleLogEntry>, RepositoryError> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(lock(&self.state)
            .logs
            .iter()
            .rev()
            .filter(|l| &l.shop == shop)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_shop(&self, shop: &ShopDomain) -> Result<ShopRedaction, RepositoryError> {
        let mut state = lock(&self.state);
        let rules_before = state.rules.len();
        let collections = state
            .rules
            .iter()
            .filter(|r| &r.shop == shop)
            .map(|r| r.excluded.len() as u64)
            .sum();
        state.rules.retain(|r| &r.shop != shop);
        let logs_before = state.logs.len();
        state.logs.retain(|l| &l.shop != shop);

        let redaction = ShopRedaction {
            rules: (rules_before - state.rules.len()) as u64,
            collections,
            logs: (logs_before - state.logs.len()) as u64,
        };

        state.next_log += 1;
        let entry = RuleLogEntry {
            id: RuleLogId::new(state.next_log),
            shop: shop.clone(),
            action: RuleAction::SHOP_REDACTED.to_string(),
            rule_id: None,
            metadata: serde_json::to_value(redaction).ok(),
            created_at: Utc::now(),
        };
        state.logs.push(entry);
        Ok(redaction)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
