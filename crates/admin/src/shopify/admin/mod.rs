//! Shopify Admin API GraphQL client.
//!
//! Authenticates with a static Admin API access token
//! (`X-Shopify-Access-Token`).

use std::sync::Arc;

use async_trait::async_trait;
use collection_gate_core::BasicDiscountKind;
use graphql_client::GraphQLQuery;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyAdminConfig;

use super::{
    AdminShopifyError, GraphQLError, GraphQLErrorLocation, ShopifyGateway,
    types::{
        BasicDiscountUpdate, Collection, CollectionConnection, DiscountConfig,
        DiscountConnection, DiscountSummary, UserError,
    },
};

mod conversions;
pub mod queries;

use conversions::{
    convert_collection_connection, convert_discount_config, convert_discount_connection,
};
use queries::{
    DiscountAutomaticBasicUpdate, DiscountCodeBasicUpdate, GetCollections, GetDiscountConfig,
    GetDiscountNodes,
};

/// Largest page size the Admin API accepts.
const COLLECTION_PAGE_SIZE: i64 = 250;

/// Discount nodes nest a `codes` connection, so each page is costed per node.
const DISCOUNT_PAGE_SIZE: i64 = 50;

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; all clones share one HTTP connection pool.
///
/// # Security
///
/// This client carries an access token with HIGH PRIVILEGE access to the
/// store's discounts.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    store: String,
    api_version: String,
    access_token: SecretString,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Arguments
    ///
    /// * `config` - Shopify Admin API configuration
    #[must_use]
    pub fn new(config: &ShopifyAdminConfig) -> Self {
        let client = reqwest::Client::new();

        Self {
            inner: Arc::new(AdminClientInner {
                client,
                store: config.store.to_string(),
                api_version: config.api_version.clone(),
                access_token: config.access_token.clone(),
            }),
        }
    }

    /// Get the store domain.
    #[must_use]
    pub fn store(&self) -> &str {
        &self.inner.store
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.inner.store, self.inner.api_version
        )
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, AdminShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.endpoint())
            .header(
                "X-Shopify-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        // Check for rate limiting
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        // Check for unauthorized
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        let graphql_response: GraphQLResponse<Q::ResponseData> = response.json().await?;

        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    locations: e
                        .locations
                        .into_iter()
                        .map(|l| GraphQLErrorLocation {
                            line: l.line,
                            column: l.column,
                        })
                        .collect(),
                    path: e.path,
                })
                .collect();
            return Err(AdminShopifyError::GraphQL(converted_errors));
        }

        graphql_response
            .data
            .ok_or_else(|| AdminShopifyError::graphql("No data in response"))
    }

    // =========================================================================
    // Collection methods
    // =========================================================================

    /// Get a page of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<CollectionConnection, AdminShopifyError> {
        let variables = queries::get_collections::Variables { first, after };
        let response = self.execute::<GetCollections>(variables).await?;
        Ok(convert_collection_connection(response.collections))
    }

    /// Get every collection in the store, following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self), fields(store = %self.inner.store))]
    pub async fn all_collections(&self) -> Result<Vec<Collection>, AdminShopifyError> {
        let mut collections = Vec::new();
        let mut after = None;
        loop {
            let page = self.get_collections(COLLECTION_PAGE_SIZE, after).await?;
            collections.extend(page.collections);
            match page.page_info.end_cursor {
                Some(cursor) if page.page_info.has_next_page => after = Some(cursor),
                _ => break,
            }
        }
        tracing::debug!(count = collections.len(), "Fetched collections");
        Ok(collections)
    }

    // =========================================================================
    // Discount methods
    // =========================================================================

    /// Get a page of discounts of every kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_discounts(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<DiscountConnection, AdminShopifyError> {
        let variables = queries::get_discount_nodes::Variables { first, after };
        let response = self.execute::<GetDiscountNodes>(variables).await?;
        Ok(convert_discount_connection(response.discount_nodes))
    }

    /// Get every discount in the store, following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self), fields(store = %self.inner.store))]
    pub async fn all_discounts(&self) -> Result<Vec<DiscountSummary>, AdminShopifyError> {
        let mut discounts = Vec::new();
        let mut after = None;
        loop {
            let page = self.get_discounts(DISCOUNT_PAGE_SIZE, after).await?;
            discounts.extend(page.discounts);
            match page.page_info.end_cursor {
                Some(cursor) if page.page_info.has_next_page => after = Some(cursor),
                _ => break,
            }
        }
        tracing::debug!(count = discounts.len(), "Fetched discounts");
        Ok(discounts)
    }

    /// Get the full configuration of a basic discount.
    ///
    /// # Arguments
    ///
    /// * `id` - `DiscountNode` GID (e.g., `gid://shopify/DiscountNode/123`)
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. Returns `Ok(None)` if the
    /// node does not exist or is not a basic discount.
    #[instrument(skip(self), fields(discount_id = %id))]
    pub async fn get_discount_config(
        &self,
        id: &str,
    ) -> Result<Option<DiscountConfig>, AdminShopifyError> {
        let variables = queries::get_discount_config::Variables { id: id.to_string() };
        let response = self.execute::<GetDiscountConfig>(variables).await?;
        Ok(convert_discount_config(response.discount_node))
    }

    /// Rewrite the value and eligible items of a basic discount.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which update mutation to use
    /// * `id` - GID in the node type the mutation expects
    /// * `update` - Fields to write
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails. Field-level rejections are
    /// returned as `Ok` with the user errors so callers can decide how to
    /// surface them.
    #[instrument(skip(self, update), fields(discount_id = %id, kind = ?kind))]
    pub async fn update_basic_discount(
        &self,
        kind: BasicDiscountKind,
        id: &str,
        update: &BasicDiscountUpdate,
    ) -> Result<Vec<UserError>, AdminShopifyError> {
        let user_errors = match kind {
            BasicDiscountKind::Code => {
                let variables = queries::discount_code_basic_update::Variables {
                    id: id.to_string(),
                    basic_code_discount: update.clone(),
                };
                self.execute::<DiscountCodeBasicUpdate>(variables)
                    .await?
                    .discount_code_basic_update
                    .map(|p| p.user_errors)
                    .unwrap_or_default()
            }
            BasicDiscountKind::Automatic => {
                let variables = queries::discount_automatic_basic_update::Variables {
                    id: id.to_string(),
                    automatic_basic_discount: update.clone(),
                };
                self.execute::<DiscountAutomaticBasicUpdate>(variables)
                    .await?
                    .discount_automatic_basic_update
                    .map(|p| p.user_errors)
                    .unwrap_or_default()
            }
        };

        if !user_errors.is_empty() {
            tracing::warn!(
                mutation = kind.mutation_name(),
                errors = user_errors.len(),
                "Discount update returned user errors"
            );
        }

        Ok(user_errors
            .into_iter()
            .map(|e| UserError {
                field: e.field,
                message: e.message,
            })
            .collect())
    }
}

#[async_trait]
impl ShopifyGateway for AdminClient {
    async fn list_collections(&self) -> Result<Vec<Collection>, AdminShopifyError> {
        self.all_collections().await
    }

    async fn list_discounts(&self) -> Result<Vec<DiscountSummary>, AdminShopifyError> {
        self.all_discounts().await
    }

    async fn discount_config(&self, gid: &str) -> Result<Option<DiscountConfig>, AdminShopifyError> {
        self.get_discount_config(gid).await
    }

    async fn update_basic_discount(
        &self,
        kind: BasicDiscountKind,
        gid: &str,
        update: &BasicDiscountUpdate,
    ) -> Result<Vec<UserError>, AdminShopifyError> {
        Self::update_basic_discount(self, kind, gid, update).await
    }
}
