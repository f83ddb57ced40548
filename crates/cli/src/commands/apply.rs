//! Rule application and diagnostics commands.
//!
//! # Usage
//!
//! ```bash
//! # Apply the rule to one discount
//! cg-cli apply --discount 987
//!
//! # Apply the rule to every discount, 250ms apart
//! cg-cli apply --pause-ms 250
//!
//! # Apply the rule to every discount, spaced by APPLY_PAUSE_MS
//! cg-cli apply
//!
//! # Run the live mutation checks
//! cg-cli diagnose
//! ```

use std::sync::Arc;
use std::time::Duration;

use collection_gate_admin::config;
use collection_gate_admin::services::{Diagnostics, RuleApplier};

use super::{CommandError, connect, print_json, shopify};

/// Apply the active rule to a single discount.
///
/// # Errors
///
/// Returns an error if configuration is missing or the rule could not be
/// applied.
pub async fn one(discount_id: &str) -> Result<(), CommandError> {
    let (config, client) = shopify()?;
    let store = Arc::new(connect().await?);
    let applier = RuleApplier::new(store.clone(), client);

    let outcome = applier.apply_to_discount(&config.store, discount_id).await;
    store.close().await;

    print_json(&outcome)?;
    if outcome.success {
        tracing::info!("{}", outcome.message);
        Ok(())
    } else {
        Err(CommandError::Failed(outcome.message))
    }
}

/// Apply the active rule to every discount.
///
/// Without `--pause-ms` the discounts are spaced by `APPLY_PAUSE_MS`, as in
/// the server.
///
/// # Errors
///
/// Returns an error if configuration is missing or the run could not start.
/// Individual discount failures are reported in the output only.
pub async fn all(pause_ms: Option<u64>) -> Result<(), CommandError> {
    let (config, client) = shopify()?;
    let pause = bulk_pause(pause_ms)?;
    let store = Arc::new(connect().await?);
    let applier = RuleApplier::new(store.clone(), client).with_pause(pause);

    let report = applier.apply_to_all(&config.store).await;
    store.close().await;

    print_json(&report)?;
    if let Some(error) = report.error {
        return Err(CommandError::Failed(error));
    }
    tracing::info!(
        success = report.success,
        failed = report.failed,
        total = report.total,
        "Bulk apply finished"
    );
    Ok(())
}

/// Run the live mutation checks.
///
/// # Errors
///
/// Returns an error if configuration is missing or any check fails.
pub async fn diagnose() -> Result<(), CommandError> {
    let (config, client) = shopify()?;
    let store = Arc::new(connect().await?);
    let applier = RuleApplier::new(store.clone(), client.clone());

    tracing::warn!(shop = %config.store, "Diagnostics rewrite discounts; use a development store");
    let results = Diagnostics::new(&applier, client.as_ref())
        .run(&config.store)
        .await;
    store.close().await;

    print_json(&results)?;
    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        return Err(CommandError::Failed(format!(
            "{failed} of {} checks failed",
            results.len()
        )));
    }
    Ok(())
}

/// The `--pause-ms` flag, falling back to the configured pause.
fn bulk_pause(pause_ms: Option<u64>) -> Result<Duration, CommandError> {
    match pause_ms {
        Some(ms) => Ok(Duration::from_millis(ms)),
        None => Ok(config::apply_pause_from_env()?),
    }
}
