//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! cg-cli migrate
//! ```
//!
//! # Migration Files
//!
//! Migrations live in `crates/admin/migrations/`:
//! ```text
//! migrations/
//! ├── 20260301000001_create_discount_rules.sql
//! └── 20260301000002_create_rule_logs.sql
//! ```

use collection_gate_admin::db;

use super::{CommandError, connect};

/// Run the admin database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let store = connect().await?;

    tracing::info!("Running migrations...");
    db::run_migrations(store.pool())
        .await
        .map_err(|e| CommandError::Failed(format!("Migration error: {e}")))?;

    store.close().await;
    tracing::info!("Migrations complete!");
    Ok(())
}
