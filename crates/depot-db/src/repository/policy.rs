//! # Inventory Policy Repository
//!
//! Per-owner allocation ordering and putaway merge rules. Owners without a
//! row get the engine defaults from [`EngineSettings`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use depot_core::validation::validate_code;
use depot_core::{AllocationPolicy, InventoryPolicy};

use crate::config::EngineSettings;
use crate::error::DbResult;

/// The stored policy row of an owner, if any.
pub async fn find(conn: &mut SqliteConnection, owner_code: &str) -> DbResult<Option<InventoryPolicy>> {
    let policy = sqlx::query_as::<_, InventoryPolicy>(
        r#"
        SELECT owner_code, use_fefo, putaway_match_dates
        FROM inventory_policies
        WHERE owner_code = ?1
        "#,
    )
    .bind(owner_code)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(policy)
}

/// The policy in effect for an owner: its row, or the defaults.
pub async fn resolve(
    conn: &mut SqliteConnection,
    owner_code: &str,
    defaults: &EngineSettings,
) -> DbResult<InventoryPolicy> {
    Ok(find(conn, owner_code).await?.unwrap_or_else(|| InventoryPolicy {
        owner_code: owner_code.to_string(),
        use_fefo: defaults.default_policy == AllocationPolicy::Fefo,
        putaway_match_dates: defaults.putaway_match_dates,
    }))
}

/// Maintenance of per-owner policy rows.
#[derive(Debug, Clone)]
pub struct PolicyRepository {
    pool: SqlitePool,
}

impl PolicyRepository {
    /// Creates a new PolicyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PolicyRepository { pool }
    }

    /// Inserts or replaces an owner's policy.
    pub async fn upsert(&self, policy: &InventoryPolicy) -> DbResult<()> {
        validate_code("owner_code", &policy.owner_code)?;

        sqlx::query(
            r#"
            INSERT INTO inventory_policies (owner_code, use_fefo, putaway_match_dates, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (owner_code) DO UPDATE SET
                use_fefo = excluded.use_fefo,
                putaway_match_dates = excluded.putaway_match_dates,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&policy.owner_code)
        .bind(policy.use_fefo)
        .bind(policy.putaway_match_dates)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(
            owner = %policy.owner_code,
            allocation = %policy.allocation_policy(),
            match_dates = policy.putaway_match_dates,
            "Inventory policy saved"
        );
        Ok(())
    }

    pub async fn get(&self, owner_code: &str) -> DbResult<Option<InventoryPolicy>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut conn, owner_code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_db;

    #[tokio::test]
    async fn test_row_overrides_defaults() {
        let db = memory_db().await;
        let defaults = EngineSettings::default();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            let policy = resolve(&mut conn, "ACME", &defaults).await.unwrap();
            assert_eq!(policy.allocation_policy(), AllocationPolicy::Fifo);
            assert!(!policy.putaway_match_dates);
        }

        db.policies()
            .upsert(&InventoryPolicy {
                owner_code: "ACME".to_string(),
                use_fefo: true,
                putaway_match_dates: true,
            })
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let policy = resolve(&mut conn, "ACME", &defaults).await.unwrap();
        assert_eq!(policy.allocation_policy(), AllocationPolicy::Fefo);
        assert!(policy.putaway_match_dates);

        let other = resolve(&mut conn, "OTHER", &defaults).await.unwrap();
        assert!(!other.use_fefo);
    }
}
