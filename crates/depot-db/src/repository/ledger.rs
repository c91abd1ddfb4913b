//! # Movement Ledger
//!
//! Append-only history of every counter change.
//!
//! ## Entry Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  seq │ line_id │ group_id │ ref_type/ref_id │ Δorigin … Δshipped │ from→to │
//! │──────┼─────────┼──────────┼─────────────────┼────────────────────┼─────────│
//! │  41  │ L-A     │ G-7      │ TRANSFER TR-1   │ -15 -15 -15 0 0 0  │ L1 → L2 │
//! │  42  │ L-B     │ G-7      │ TRANSFER TR-1   │ +15 +15 +15 0 0 0  │ L1 → L2 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are written by the engines in the same transaction as the counter
//! change they describe. Triggers in the schema abort any UPDATE or DELETE,
//! so a correction is always a new, compensating row.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use depot_core::{
    CoreError, MovementLedgerEntry, MovementRefType, NewMovement, QuantityDelta, Reconciliation,
};

use crate::error::DbResult;
use crate::repository::inventory;

/// Appends one entry.
///
/// ## Errors
/// * `LineNotFound` - `line_id` references no line (retired lines are fine)
pub async fn append(
    conn: &mut SqliteConnection,
    movement: &NewMovement,
) -> DbResult<MovementLedgerEntry> {
    if inventory::find_line(conn, &movement.line_id).await?.is_none() {
        return Err(CoreError::LineNotFound(movement.line_id.clone()).into());
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let d = movement.delta;
    let from = movement.from.as_ref();
    let to = movement.to.as_ref();

    let result = sqlx::query(
        r#"
        INSERT INTO movement_ledger (
            id, line_id, counterpart_line_id, group_id, ref_type, ref_id,
            delta_origin, delta_onhand, delta_available,
            delta_allocated, delta_suspended, delta_shipped,
            from_whs, to_whs, from_location, to_location, from_qa, to_qa,
            reason, actor, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9,
            ?10, ?11, ?12,
            ?13, ?14, ?15, ?16, ?17, ?18,
            ?19, ?20, ?21
        )
        "#,
    )
    .bind(&id)
    .bind(&movement.line_id)
    .bind(&movement.counterpart_line_id)
    .bind(movement.group_id.as_str())
    .bind(movement.ref_type)
    .bind(&movement.ref_id)
    .bind(d.origin)
    .bind(d.onhand)
    .bind(d.available)
    .bind(d.allocated)
    .bind(d.suspended)
    .bind(d.shipped)
    .bind(from.map(|p| p.whs_code.as_str()))
    .bind(to.map(|p| p.whs_code.as_str()))
    .bind(from.map(|p| p.location_code.as_str()))
    .bind(to.map(|p| p.location_code.as_str()))
    .bind(from.map(|p| p.qa_status.as_str()))
    .bind(to.map(|p| p.qa_status.as_str()))
    .bind(&movement.reason)
    .bind(&movement.actor)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    debug!(
        line_id = %movement.line_id,
        group_id = %movement.group_id,
        ref_type = %movement.ref_type,
        ref_id = %movement.ref_id,
        "Ledger entry appended"
    );

    Ok(MovementLedgerEntry {
        seq: result.last_insert_rowid(),
        id,
        line_id: movement.line_id.clone(),
        counterpart_line_id: movement.counterpart_line_id.clone(),
        group_id: movement.group_id.as_str().to_string(),
        ref_type: movement.ref_type,
        ref_id: movement.ref_id.clone(),
        delta: d,
        from_whs: from.map(|p| p.whs_code.clone()),
        to_whs: to.map(|p| p.whs_code.clone()),
        from_location: from.map(|p| p.location_code.clone()),
        to_location: to.map(|p| p.location_code.clone()),
        from_qa: from.map(|p| p.qa_status.clone()),
        to_qa: to.map(|p| p.qa_status.clone()),
        reason: movement.reason.clone(),
        actor: movement.actor.clone(),
        created_at: now,
    })
}

/// Entries of one line in insertion order.
pub async fn list_by_line(
    conn: &mut SqliteConnection,
    line_id: &str,
) -> DbResult<Vec<MovementLedgerEntry>> {
    let entries = sqlx::query_as::<_, MovementLedgerEntry>(
        "SELECT * FROM movement_ledger WHERE line_id = ?1 ORDER BY seq",
    )
    .bind(line_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(entries)
}

/// Entries of one business reference in insertion order.
pub async fn list_by_reference(
    conn: &mut SqliteConnection,
    ref_type: MovementRefType,
    ref_id: &str,
) -> DbResult<Vec<MovementLedgerEntry>> {
    let entries = sqlx::query_as::<_, MovementLedgerEntry>(
        "SELECT * FROM movement_ledger WHERE ref_type = ?1 AND ref_id = ?2 ORDER BY seq",
    )
    .bind(ref_type)
    .bind(ref_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(entries)
}

/// Entries of one logical operation.
pub async fn list_by_group(
    conn: &mut SqliteConnection,
    group_id: &str,
) -> DbResult<Vec<MovementLedgerEntry>> {
    let entries = sqlx::query_as::<_, MovementLedgerEntry>(
        "SELECT * FROM movement_ledger WHERE group_id = ?1 ORDER BY seq",
    )
    .bind(group_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(entries)
}

/// Compares a line's counters with the sum of its ledger deltas.
pub async fn reconcile_line(conn: &mut SqliteConnection, line_id: &str) -> DbResult<Reconciliation> {
    let line = inventory::find_line(conn, line_id)
        .await?
        .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

    let (entries, origin, onhand, available, allocated, suspended, shipped): (
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(delta_origin), 0),
            COALESCE(SUM(delta_onhand), 0),
            COALESCE(SUM(delta_available), 0),
            COALESCE(SUM(delta_allocated), 0),
            COALESCE(SUM(delta_suspended), 0),
            COALESCE(SUM(delta_shipped), 0)
        FROM movement_ledger
        WHERE line_id = ?1
        "#,
    )
    .bind(line_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Reconciliation {
        line_id: line_id.to_string(),
        entries,
        counters: QuantityDelta::from(line.qty),
        ledger_sum: QuantityDelta {
            origin,
            onhand,
            available,
            allocated,
            suspended,
            shipped,
        },
    })
}

// =============================================================================
// Repository (read paths)
// =============================================================================

/// Pool-level read access to the ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    pub async fn list_by_line(&self, line_id: &str) -> DbResult<Vec<MovementLedgerEntry>> {
        let mut conn = self.pool.acquire().await?;
        list_by_line(&mut conn, line_id).await
    }

    pub async fn list_by_reference(
        &self,
        ref_type: MovementRefType,
        ref_id: &str,
    ) -> DbResult<Vec<MovementLedgerEntry>> {
        let mut conn = self.pool.acquire().await?;
        list_by_reference(&mut conn, ref_type, ref_id).await
    }

    pub async fn list_by_group(&self, group_id: &str) -> DbResult<Vec<MovementLedgerEntry>> {
        let mut conn = self.pool.acquire().await?;
        list_by_group(&mut conn, group_id).await
    }

    /// Ledger-vs-counters check for one line.
    pub async fn reconcile_line(&self, line_id: &str) -> DbResult<Reconciliation> {
        let mut conn = self.pool.acquire().await?;
        reconcile_line(&mut conn, line_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::inventory::{create_line, NewLine};
    use crate::test_support::{memory_db, receipt};
    use depot_core::MovementGroupId;

    #[tokio::test]
    async fn test_append_requires_existing_line() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let movement = NewMovement::new(
            "missing-line",
            &MovementGroupId::generate(),
            MovementRefType::Adjustment,
            "ADJ-1",
            QuantityDelta::count_correction(1),
            "clerk",
        );
        let err = append(&mut conn, &movement).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::LineNotFound(_))));
    }

    #[tokio::test]
    async fn test_entries_keep_insertion_order() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let req = receipt("S1", "L1", "X", 10, "2024-01-01");
        let line = create_line(&mut conn, &NewLine::from_putaway(&req)).await.unwrap();

        let group = MovementGroupId::generate();
        let first = append(
            &mut conn,
            &NewMovement::new(&line.id, &group, MovementRefType::Putaway, "S1", QuantityDelta::receive(10), "r")
                .to_place(line.place()),
        )
        .await
        .unwrap();
        let second = append(
            &mut conn,
            &NewMovement::new(&line.id, &group, MovementRefType::Outbound, "SO-1", QuantityDelta::allocate(4), "p")
                .at(line.place()),
        )
        .await
        .unwrap();
        assert!(second.seq > first.seq);

        let entries = list_by_line(&mut conn, &line.id).await.unwrap();
        assert_eq!(entries, vec![first.clone(), second.clone()]);

        let outbound = list_by_reference(&mut conn, MovementRefType::Outbound, "SO-1")
            .await
            .unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].from_location.as_deref(), Some("L1"));

        assert_eq!(list_by_group(&mut conn, group.as_str()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reconcile_detects_drift() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let line = create_line(&mut conn, &NewLine::from_putaway(&receipt("S1", "L1", "X", 10, "2024-01-01")))
            .await
            .unwrap();

        // Created without its receive entry
        let before = reconcile_line(&mut conn, &line.id).await.unwrap();
        assert!(!before.is_balanced());
        assert_eq!(before.entries, 0);

        append(
            &mut conn,
            &NewMovement::new(
                &line.id,
                &MovementGroupId::generate(),
                MovementRefType::Putaway,
                "S1",
                QuantityDelta::receive(10),
                "r",
            ),
        )
        .await
        .unwrap();
        assert!(reconcile_line(&mut conn, &line.id).await.unwrap().is_balanced());
    }

    #[tokio::test]
    async fn test_ledger_rows_are_immutable() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let line = create_line(&mut conn, &NewLine::from_putaway(&receipt("S1", "L1", "X", 10, "2024-01-01")))
            .await
            .unwrap();
        append(
            &mut conn,
            &NewMovement::new(
                &line.id,
                &MovementGroupId::generate(),
                MovementRefType::Putaway,
                "S1",
                QuantityDelta::receive(10),
                "r",
            ),
        )
        .await
        .unwrap();

        assert!(sqlx::query("UPDATE movement_ledger SET delta_onhand = 0")
            .execute(&mut *conn)
            .await
            .is_err());
        assert!(sqlx::query("DELETE FROM movement_ledger")
            .execute(&mut *conn)
            .await
            .is_err());
    }
}
