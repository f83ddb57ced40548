//! Shopify Admin API client (HIGH PRIVILEGE).
//!
//! # Security
//!
//! **This module holds the Shopify Admin API access token.** The token can
//! rewrite every discount in the store, so the admin service should only be
//! reachable from trusted infrastructure.
//!
//! # Architecture
//!
//! - Operations implement `graphql_client::GraphQLQuery` (see `admin::queries`)
//! - Direct API calls to Shopify (no local cache of collections or discounts)
//! - [`ShopifyGateway`] is the seam the rule services depend on; [`AdminClient`]
//!   is the production implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use collection_gate_admin::shopify::{AdminClient, ShopifyGateway};
//!
//! let client = AdminClient::new(&config.shopify);
//!
//! let collections = client.list_collections().await?;
//! let discounts = client.list_discounts().await?;
//! ```

mod admin;
pub mod gateway;
pub mod types;

pub use admin::AdminClient;
pub use gateway::ShopifyGateway;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

impl AdminShopifyError {
    /// Build a single GraphQL error from a message.
    #[must_use]
    pub fn graphql(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }

    /// The error text without the variant prefix.
    ///
    /// GraphQL errors are joined with `", "` so they can be surfaced to
    /// merchants verbatim.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::GraphQL(errors) => errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Self::UserError(message) | Self::NotFound(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_shopify_error_display() {
        let err = AdminShopifyError::NotFound("discount-123".to_string());
        assert_eq!(err.to_string(), "Not found: discount-123");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = AdminShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
        assert_eq!(err.detail(), "Field not found, Invalid ID");
    }

    #[test]
    fn test_rate_limited_display() {
        let err = AdminShopifyError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
        assert_eq!(err.detail(), "Rate limited, retry after 30 seconds");
    }

    #[test]
    fn test_graphql_constructor() {
        let err = AdminShopifyError::graphql("No data in response");
        assert_eq!(err.detail(), "No data in response");
    }
}
