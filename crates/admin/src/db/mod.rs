//! Rule storage for the admin service.
//!
//! ## Tables
//!
//! - `discount_rules` - One row per saved rule (mode, active flag, timestamps)
//! - `excluded_collections` - Selected collections of a rule, in selection order
//! - `rule_logs` - Per-shop audit log (JSONB metadata)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p collection-gate-cli -- migrate
//! ```

pub mod rules;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use collection_gate_core::{DiscountRule, NewRule, RuleId, RuleLogEntry, ShopDomain};

pub use rules::PgRuleStore;

/// Default number of log entries returned by [`RuleStore::recent_logs`].
pub const DEFAULT_LOG_LIMIT: i64 = 50;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Row counts removed by [`RuleStore::delete_shop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShopRedaction {
    /// Rules deleted.
    pub rules: u64,
    /// Excluded-collection rows deleted.
    pub collections: u64,
    /// Log entries deleted.
    pub logs: u64,
}

/// Persistence for rules and their audit log.
///
/// Upserts are last-write-wins: concurrent saves for the same shop race at
/// the storage layer and the later commit is the rule that survives.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// The most recently updated active rule for `shop`.
    async fn active_rule(&self, shop: &ShopDomain) -> Result<Option<DiscountRule>, RepositoryError>;

    /// Create the shop's rule, or wholesale replace the existing one.
    async fn upsert_rule(&self, rule: &NewRule) -> Result<DiscountRule, RepositoryError>;

    /// Append an entry to the shop's audit log.
    async fn append_log(
        &self,
        shop: &ShopDomain,
        action: &str,
        rule_id: Option<RuleId>,
        metadata: Option<serde_json::Value>,
    ) -> Result<RuleLogEntry, RepositoryError>;

    /// Latest `limit` log entries for `shop`, newest first.
    async fn recent_logs(
        &self,
        shop: &ShopDomain,
        limit: i64,
    ) -> Result<Vec<RuleLogEntry>, RepositoryError>;

    /// Remove every rule, selected collection and log entry for `shop`, then
    /// record a `shop_redacted` entry.
    async fn delete_shop(&self, shop: &ShopDomain) -> Result<ShopRedaction, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the admin migrations against `pool`.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or has been modified after
/// being applied.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        assert_eq!(
            RepositoryError::Conflict("too many collections".to_string()).to_string(),
            "constraint violation: too many collections"
        );
        assert_eq!(
            RepositoryError::DataCorruption("bad shop".to_string()).to_string(),
            "data corruption: bad shop"
        );
    }

    #[test]
    fn test_shop_redaction_serializes_counts() {
        let redaction = ShopRedaction {
            rules: 1,
            collections: 4,
            logs: 9,
        };
        assert_eq!(
            serde_json::to_value(redaction).unwrap_or_default(),
            serde_json::json!({ "rules": 1, "collections": 4, "logs": 9 })
        );
    }
}
