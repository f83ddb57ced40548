//! `PostgreSQL` rule store.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use collection_gate_core::{
    CollectionDescriptor, DiscountRule, NewRule, RuleAction, RuleId, RuleLogEntry, RuleLogId,
    RuleMode, ShopDomain,
};

use super::{RepositoryError, RuleStore, ShopRedaction};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct RuleRow {
    id: i64,
    shop: String,
    mode: RuleMode,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ExcludedRow {
    collection_id: String,
    title: Option<String>,
    products_count: i64,
}

impl From<ExcludedRow> for CollectionDescriptor {
    fn from(row: ExcludedRow) -> Self {
        Self {
            id: row.collection_id,
            title: row.title,
            products_count: row.products_count,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: i64,
    shop: String,
    action: String,
    rule_id: Option<i64>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

fn parse_shop(shop: &str) -> Result<ShopDomain, RepositoryError> {
    ShopDomain::parse(shop)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid shop in database: {e}")))
}

impl RuleRow {
    fn into_rule(self, excluded: Vec<ExcludedRow>) -> Result<DiscountRule, RepositoryError> {
        Ok(DiscountRule {
            id: RuleId::new(self.id),
            shop: parse_shop(&self.shop)?,
            mode: self.mode,
            active: self.active,
            excluded: excluded.into_iter().map(Into::into).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<LogRow> for RuleLogEntry {
    type Error = RepositoryError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RuleLogId::new(row.id),
            shop: parse_shop(&row.shop)?,
            action: row.action,
            rule_id: row.rule_id.map(RuleId::new),
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

const RULE_COLUMNS: &str = "id, shop, mode, active, created_at, updated_at";
const LOG_COLUMNS: &str = "id, shop, action, rule_id, metadata, created_at";

// =============================================================================
// Store
// =============================================================================

/// [`RuleStore`] backed by `PostgreSQL`.
///
/// Owns its pool; call [`PgRuleStore::close`] on shutdown.
#[derive(Clone)]
pub struct PgRuleStore {
    pool: PgPool,
}

impl PgRuleStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn load_excluded<'e, E>(executor: E, rule_id: i64) -> Result<Vec<ExcludedRow>, RepositoryError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, ExcludedRow>(
            r"
            SELECT collection_id, title, products_count
            FROM excluded_collections
            WHERE rule_id = $1
            ORDER BY position
            ",
        )
        .bind(rule_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    async fn insert_excluded(
        tx: &mut Transaction<'_, Postgres>,
        rule_id: i64,
        excluded: &[CollectionDescriptor],
    ) -> Result<(), RepositoryError> {
        for (position, collection) in excluded.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| RepositoryError::Conflict("too many collections".to_string()))?;
            sqlx::query(
                r"
                INSERT INTO excluded_collections (rule_id, collection_id, title, products_count, position)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(rule_id)
            .bind(&collection.id)
            .bind(collection.title.as_deref())
            .bind(collection.products_count)
            .bind(position)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for PgRuleStore {
    #[instrument(skip(self), fields(shop = %shop))]
    async fn active_rule(&self, shop: &ShopDomain) -> Result<Option<DiscountRule>, RepositoryError> {
        let row = sqlx::query_as::<_, RuleRow>(&format!(
            r"
            SELECT {RULE_COLUMNS}
            FROM discount_rules
            WHERE shop = $1 AND active = TRUE
            ORDER BY updated_at DESC, id DESC
            LIMIT 1
            "
        ))
        .bind(shop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let excluded = Self::load_excluded(&self.pool, row.id).await?;
        row.into_rule(excluded).map(Some)
    }

    #[instrument(skip(self, rule), fields(shop = %rule.shop, mode = %rule.mode, excluded = rule.excluded.len()))]
    async fn upsert_rule(&self, rule: &NewRule) -> Result<DiscountRule, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            r"
            SELECT id FROM discount_rules
            WHERE shop = $1
            ORDER BY updated_at DESC, id DESC
            LIMIT 1
            FOR UPDATE
            ",
        )
        .bind(rule.shop.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let row = if let Some(id) = existing {
            sqlx::query("DELETE FROM excluded_collections WHERE rule_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            sqlx::query_as::<_, RuleRow>(&format!(
                r"
                UPDATE discount_rules
                SET mode = $2, active = TRUE, updated_at = NOW()
                WHERE id = $1
                RETURNING {RULE_COLUMNS}
                "
            ))
            .bind(id)
            .bind(rule.mode)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_as::<_, RuleRow>(&format!(
                r"
                INSERT INTO discount_rules (shop, mode, active)
                VALUES ($1, $2, TRUE)
                RETURNING {RULE_COLUMNS}
                "
            ))
            .bind(rule.shop.as_str())
            .bind(rule.mode)
            .fetch_one(&mut *tx)
            .await?
        };

        Self::insert_excluded(&mut tx, row.id, &rule.excluded).await?;
        let excluded = Self::load_excluded(&mut *tx, row.id).await?;
        tx.commit().await?;

        tracing::info!(rule_id = row.id, "Rule saved");
        row.into_rule(excluded)
    }

    #[instrument(skip(self, metadata), fields(shop = %shop))]
    async fn append_log(
        &self,
        shop: &ShopDomain,
        action: &str,
        rule_id: Option<RuleId>,
        metadata: Option<serde_json::Value>,
    ) -> Result<RuleLogEntry, RepositoryError> {
        let row = sqlx::query_as::<_, LogRow>(&format!(
            r"
            INSERT INTO rule_logs (shop, action, rule_id, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING {LOG_COLUMNS}
            "
        ))
        .bind(shop.as_str())
        .bind(action)
        .bind(rule_id.map(|id| id.as_i64()))
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self), fields(shop = %shop))]
    async fn recent_logs(
        &self,
        shop: &ShopDomain,
        limit: i64,
    ) -> Result<Vec<RuleLogEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, LogRow>(&format!(
            r"
            SELECT {LOG_COLUMNS}
            FROM rule_logs
            WHERE shop = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "
        ))
        .bind(shop.as_str())
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), fields(shop = %shop))]
    async fn delete_shop(&self, shop: &ShopDomain) -> Result<ShopRedaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let collections = sqlx::query(
            r"
            DELETE FROM excluded_collections
            WHERE rule_id IN (SELECT id FROM discount_rules WHERE shop = $1)
            ",
        )
        .bind(shop.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let logs = sqlx::query("DELETE FROM rule_logs WHERE shop = $1")
            .bind(shop.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let rules = sqlx::query("DELETE FROM discount_rules WHERE shop = $1")
            .bind(shop.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let redaction = ShopRedaction {
            rules,
            collections,
            logs,
        };

        sqlx::query(
            r"
            INSERT INTO rule_logs (shop, action, metadata)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(shop.as_str())
        .bind(RuleAction::SHOP_REDACTED)
        .bind(serde_json::to_value(redaction).ok())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            rules = redaction.rules,
            collections = redaction.collections,
            logs = redaction.logs,
            "Shop data redacted"
        );
        Ok(redaction)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
