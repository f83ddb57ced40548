//! CLI subcommands.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SHOPIFY_STORE` - Shopify store domain
//! - `SHOPIFY_ADMIN_ACCESS_TOKEN` - Shopify Admin API access token

pub mod apply;
pub mod migrate;
pub mod rules;
pub mod shop;

use std::sync::Arc;

use collection_gate_admin::config::{self, ConfigError, ShopifyAdminConfig};
use collection_gate_admin::db::{self, PgRuleStore};
use collection_gate_admin::shopify::AdminClient;
use serde::Serialize;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Rule store operation failed.
    #[error(transparent)]
    Repository(#[from] db::RepositoryError),

    /// Shopify request failed.
    #[error(transparent)]
    Shopify(#[from] collection_gate_admin::shopify::AdminShopifyError),

    /// Invalid command-line input.
    #[error("{0}")]
    Invalid(String),

    /// The command ran but reported a failure.
    #[error("{0}")]
    Failed(String),
}

/// Connect to the rule database.
async fn connect() -> Result<PgRuleStore, CommandError> {
    dotenvy::dotenv().ok();
    let database_url = config::database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    Ok(PgRuleStore::new(pool))
}

/// Build the Shopify client from the environment.
fn shopify() -> Result<(ShopifyAdminConfig, Arc<AdminClient>), CommandError> {
    dotenvy::dotenv().ok();
    let config = ShopifyAdminConfig::from_env()?;
    let client = Arc::new(AdminClient::new(&config));
    Ok((config, client))
}

/// Print a value as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::Failed(format!("Failed to encode output: {e}")))?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
