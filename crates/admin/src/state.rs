//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use collection_gate_core::ShopDomain;

use crate::db::RuleStore;
use crate::services::{RuleApplier, RuleService};
use crate::shopify::ShopifyGateway;

/// Application state shared across all handlers.
///
/// The admin service is bound to a single store, so the shop domain lives
/// here rather than in a session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    shop: ShopDomain,
    store: Arc<dyn RuleStore>,
    shopify: Arc<dyn ShopifyGateway>,
    rules: RuleService,
    applier: RuleApplier,
}

impl AppState {
    /// Build the state from its collaborators.
    ///
    /// `apply_pause` spaces the mutations of bulk runs.
    #[must_use]
    pub fn new(
        shop: ShopDomain,
        store: Arc<dyn RuleStore>,
        shopify: Arc<dyn ShopifyGateway>,
        apply_pause: Duration,
    ) -> Self {
        let rules = RuleService::new(Arc::clone(&store));
        let applier =
            RuleApplier::new(Arc::clone(&store), Arc::clone(&shopify)).with_pause(apply_pause);
        Self {
            inner: Arc::new(AppStateInner {
                shop,
                store,
                shopify,
                rules,
                applier,
            }),
        }
    }

    #[must_use]
    pub fn shop(&self) -> &ShopDomain {
        &self.inner.shop
    }

    #[must_use]
    pub fn store(&self) -> &dyn RuleStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn shopify(&self) -> &dyn ShopifyGateway {
        self.inner.shopify.as_ref()
    }

    #[must_use]
    pub fn rules(&self) -> &RuleService {
        &self.inner.rules
    }

    #[must_use]
    pub fn applier(&self) -> &RuleApplier {
        &self.inner.applier
    }
}
