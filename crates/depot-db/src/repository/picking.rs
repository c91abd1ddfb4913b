//! # Pick Assignment Repository
//!
//! Outbound reservations: which line holds how much for which order.
//!
//! ```text
//! allocated ──ship part──► partially_shipped ──ship rest──► shipped
//!     │                           │
//!     ├──release──────────────────┴──► released
//!     └──override─────────────────────► overridden (+ new assignment)
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use depot_core::{PickAssignment, PickStatus};

use crate::error::{DbError, DbResult};

/// Inserts a new assignment.
pub async fn insert(conn: &mut SqliteConnection, assignment: &PickAssignment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO pick_assignments (
            id, order_ref, group_id, line_id, owner_code, item_id, whs_code,
            location_code, pallet_id, lot_no, qty, shipped_qty, status,
            override_of, actor, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17
        )
        "#,
    )
    .bind(&assignment.id)
    .bind(&assignment.order_ref)
    .bind(&assignment.group_id)
    .bind(&assignment.line_id)
    .bind(&assignment.owner_code)
    .bind(&assignment.item_id)
    .bind(&assignment.whs_code)
    .bind(&assignment.location_code)
    .bind(&assignment.pallet_id)
    .bind(&assignment.lot_no)
    .bind(assignment.qty)
    .bind(assignment.shipped_qty)
    .bind(assignment.status)
    .bind(&assignment.override_of)
    .bind(&assignment.actor)
    .bind(assignment.created_at)
    .bind(assignment.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Takes the write lock on an assignment before it is read.
pub async fn lock(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("UPDATE pick_assignments SET status = status WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("PickAssignment", id));
    }
    Ok(())
}

/// Takes the write lock on every assignment of an order.
pub async fn lock_order(conn: &mut SqliteConnection, order_ref: &str) -> DbResult<()> {
    sqlx::query("UPDATE pick_assignments SET status = status WHERE order_ref = ?1")
        .bind(order_ref)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// An assignment by id.
pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<PickAssignment> {
    sqlx::query_as::<_, PickAssignment>("SELECT * FROM pick_assignments WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("PickAssignment", id))
}

/// Assignments of an order, oldest first.
pub async fn list_by_order(
    conn: &mut SqliteConnection,
    order_ref: &str,
) -> DbResult<Vec<PickAssignment>> {
    let rows = sqlx::query_as::<_, PickAssignment>(
        "SELECT * FROM pick_assignments WHERE order_ref = ?1 ORDER BY rowid",
    )
    .bind(order_ref)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Moves an assignment to its next state.
///
/// Guarded on the status the caller read, so two operators closing the
/// same assignment cannot both succeed.
pub async fn update_progress(
    conn: &mut SqliteConnection,
    assignment: &PickAssignment,
    expected_status: PickStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE pick_assignments SET shipped_qty = ?1, status = ?2, updated_at = ?3
        WHERE id = ?4 AND status = ?5
        "#,
    )
    .bind(assignment.shipped_qty)
    .bind(assignment.status)
    .bind(now)
    .bind(&assignment.id)
    .bind(expected_status)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict(format!(
            "pick assignment {} is no longer {}",
            assignment.id, expected_status
        )));
    }
    Ok(())
}

/// Pool-level read access to pick assignments.
#[derive(Debug, Clone)]
pub struct PickRepository {
    pool: SqlitePool,
}

impl PickRepository {
    /// Creates a new PickRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PickRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<PickAssignment> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, id).await
    }

    /// Every assignment of an order, closed ones included.
    pub async fn assignments_for_order(&self, order_ref: &str) -> DbResult<Vec<PickAssignment>> {
        let mut conn = self.pool.acquire().await?;
        list_by_order(&mut conn, order_ref).await
    }
}
