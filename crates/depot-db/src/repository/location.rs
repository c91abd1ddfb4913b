//! # Location Master Lookup
//!
//! Putaway and transfers only place stock at registered, active locations.
//! Full location master data (zones, capacities) lives elsewhere; this table
//! is only the lookup the engines consult.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use depot_core::validation::validate_code;

use crate::error::{DbError, DbResult};

/// True when the location exists and is active.
pub async fn is_registered(
    conn: &mut SqliteConnection,
    whs_code: &str,
    location_code: &str,
) -> DbResult<bool> {
    let active: Option<bool> = sqlx::query_scalar(
        "SELECT is_active FROM locations WHERE whs_code = ?1 AND location_code = ?2",
    )
    .bind(whs_code)
    .bind(location_code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(active.unwrap_or(false))
}

/// Registration of locations.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    /// Creates a new LocationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Registers (or re-activates) a location.
    pub async fn register(&self, whs_code: &str, location_code: &str) -> DbResult<()> {
        validate_code("whs_code", whs_code)?;
        validate_code("location_code", location_code)?;

        sqlx::query(
            r#"
            INSERT INTO locations (whs_code, location_code, is_active, created_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT (whs_code, location_code) DO UPDATE SET is_active = 1
            "#,
        )
        .bind(whs_code)
        .bind(location_code)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(whs = %whs_code, location = %location_code, "Location registered");
        Ok(())
    }

    /// Stops new stock from being placed at a location.
    ///
    /// Stock already there stays, and can still be allocated or moved out.
    pub async fn deactivate(&self, whs_code: &str, location_code: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE locations SET is_active = 0 WHERE whs_code = ?1 AND location_code = ?2",
        )
        .bind(whs_code)
        .bind(location_code)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Location",
                format!("{whs_code}/{location_code}"),
            ));
        }
        Ok(())
    }

    pub async fn is_registered(&self, whs_code: &str, location_code: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        is_registered(&mut conn, whs_code, location_code).await
    }
}
