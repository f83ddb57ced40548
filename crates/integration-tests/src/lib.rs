//! Integration tests for Collection Gate.
//!
//! The admin router is driven in-process with `tower::ServiceExt::oneshot`
//! against the in-memory store and Shopify doubles from the admin crate's
//! `testing` feature, so no database or shop is required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p collection-gate-integration-tests
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use collection_gate_admin::routes::routes;
use collection_gate_admin::state::AppState;
use collection_gate_admin::testing::{FakeShopify, MemoryRuleStore};
use collection_gate_core::ShopDomain;

/// Shop every test context is bound to.
pub const TEST_SHOP: &str = "gate-test.myshopify.com";

/// The admin API wired to in-memory collaborators.
pub struct TestContext {
    pub shopify: Arc<FakeShopify>,
    pub store: Arc<MemoryRuleStore>,
    router: Router,
}

impl TestContext {
    /// Build a context around `shopify` with an empty rule store.
    #[must_use]
    pub fn new(shopify: FakeShopify) -> Self {
        let shopify = Arc::new(shopify);
        let store = Arc::new(MemoryRuleStore::new());
        let state = AppState::new(
            Self::shop(),
            store.clone(),
            shopify.clone(),
            Duration::ZERO,
        );
        Self {
            shopify,
            store,
            router: routes().with_state(state),
        }
    }

    /// The shop domain the API is bound to.
    ///
    /// # Panics
    ///
    /// Panics if [`TEST_SHOP`] is not a valid shop domain.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn shop() -> ShopDomain {
        ShopDomain::parse(TEST_SHOP).unwrap()
    }

    /// Send a request and return the status and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    #[allow(clippy::unwrap_used)]
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::POST, uri, None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }
}
