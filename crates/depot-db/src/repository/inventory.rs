//! # Inventory Record Store
//!
//! Current quantity state of every inventory line.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    mutate_quantities(line, delta)                       │
//! │                                                                         │
//! │  1. lock_line     UPDATE … SET version = version   ← takes write lock  │
//! │  2. get_line      SELECT * (fresh, inside the lock)                    │
//! │  3. apply         depot_core::Quantities::apply    ← non-negative,     │
//! │                                                      balanced          │
//! │  4. UPDATE … version = version + 1 WHERE id = ? AND version = ?        │
//! │       │                                                                 │
//! │       └── 0 rows? → ConcurrencyConflict (caller retries)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite has no row locks. Touching the rows with a no-op UPDATE as the
//! first statement of a transaction takes the database write lock, so the
//! reads that follow cannot be invalidated before commit. Writers queue on
//! the lock for `busy_timeout`, then fail with `ConcurrencyConflict`.
//!
//! The free functions take `&mut SqliteConnection` so they run inside the
//! caller's transaction; [`InventoryRepository`] wraps the read paths for
//! pool-level callers.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use depot_core::allocation::order_candidates;
use depot_core::validation::validate_quantity;
use depot_core::{
    AllocationPolicy, CoreError, Counter, InventoryLine, MergeKey, PutawayRequest, Quantities,
    QuantityDelta, StockSummary, TransactionKind,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// New Line
// =============================================================================

/// Attributes of a line about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
    pub owner_code: String,
    pub whs_code: String,
    pub location_code: String,
    pub pallet_id: String,
    pub item_id: String,
    pub item_code: String,
    pub barcode: String,
    pub uom: String,
    pub rec_date: NaiveDate,
    pub prod_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
    pub lot_no: String,
    pub qa_status: String,
    pub qty: i64,
    pub source_ref: Option<String>,
    pub transfer_from: Option<String>,
    pub trans_kind: TransactionKind,
    pub actor: String,
}

impl NewLine {
    /// Line for a scanned receipt with no merge target.
    pub fn from_putaway(req: &PutawayRequest) -> Self {
        NewLine {
            owner_code: req.owner_code.clone(),
            whs_code: req.whs_code.clone(),
            location_code: req.location_code.clone(),
            pallet_id: req.pallet_id.clone(),
            item_id: req.item_id.clone(),
            item_code: req.item_code.clone(),
            barcode: req.barcode.clone(),
            uom: req.uom.clone(),
            rec_date: req.rec_date,
            prod_date: req.prod_date,
            exp_date: req.exp_date,
            lot_no: req.lot_no.clone(),
            qa_status: req.qa_status.clone(),
            qty: req.qty,
            source_ref: Some(req.scan_id.clone()),
            transfer_from: None,
            trans_kind: TransactionKind::Inbound,
            actor: req.actor.clone(),
        }
    }

    /// Destination line of a transfer.
    ///
    /// Keeps the source's item and lot attributes, including `rec_date`, so
    /// moved stock keeps its FIFO age.
    pub fn transfer_of(
        source: &InventoryLine,
        to_location: &str,
        to_qa: &str,
        qty: i64,
        ref_id: &str,
        actor: &str,
    ) -> Self {
        NewLine {
            owner_code: source.owner_code.clone(),
            whs_code: source.whs_code.clone(),
            location_code: to_location.to_string(),
            pallet_id: source.pallet_id.clone(),
            item_id: source.item_id.clone(),
            item_code: source.item_code.clone(),
            barcode: source.barcode.clone(),
            uom: source.uom.clone(),
            rec_date: source.rec_date,
            prod_date: source.prod_date,
            exp_date: source.exp_date,
            lot_no: source.lot_no.clone(),
            qa_status: to_qa.to_string(),
            qty,
            source_ref: Some(ref_id.to_string()),
            transfer_from: Some(source.id.clone()),
            trans_kind: TransactionKind::Transfer,
            actor: actor.to_string(),
        }
    }
}

// =============================================================================
// Session Operations
// =============================================================================

/// Creates a line holding `new.qty` as origin, onhand and available.
///
/// The inventory number comes from the `sequences` row, incremented inside
/// the caller's transaction so concurrent creators serialize on it. The
/// matching ledger entry (a `receive` delta) is the caller's job.
pub async fn create_line(conn: &mut SqliteConnection, new: &NewLine) -> DbResult<InventoryLine> {
    validate_quantity("qty", new.qty)?;

    let inventory_no: i64 = sqlx::query_scalar(
        "UPDATE sequences SET value = value + 1 WHERE name = 'inventory_no' RETURNING value",
    )
    .fetch_one(&mut *conn)
    .await?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let qty = Quantities::received(new.qty);

    debug!(id = %id, inventory_no, location = %new.location_code, qty = new.qty, "Creating inventory line");

    sqlx::query(
        r#"
        INSERT INTO inventory_lines (
            id, inventory_no, owner_code, whs_code, location_code, pallet_id,
            item_id, item_code, barcode, uom,
            rec_date, prod_date, exp_date, lot_no, qa_status,
            origin, onhand, available, allocated, suspended, shipped,
            source_ref, transfer_from, trans_kind, version,
            created_by, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15,
            ?16, ?17, ?18, ?19, ?20, ?21,
            ?22, ?23, ?24, 0,
            ?25, ?26, ?27
        )
        "#,
    )
    .bind(&id)
    .bind(inventory_no)
    .bind(&new.owner_code)
    .bind(&new.whs_code)
    .bind(&new.location_code)
    .bind(&new.pallet_id)
    .bind(&new.item_id)
    .bind(&new.item_code)
    .bind(&new.barcode)
    .bind(&new.uom)
    .bind(new.rec_date)
    .bind(new.prod_date)
    .bind(new.exp_date)
    .bind(&new.lot_no)
    .bind(&new.qa_status)
    .bind(qty.origin)
    .bind(qty.onhand)
    .bind(qty.available)
    .bind(qty.allocated)
    .bind(qty.suspended)
    .bind(qty.shipped)
    .bind(&new.source_ref)
    .bind(&new.transfer_from)
    .bind(new.trans_kind)
    .bind(&new.actor)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(InventoryLine {
        id,
        inventory_no,
        owner_code: new.owner_code.clone(),
        whs_code: new.whs_code.clone(),
        location_code: new.location_code.clone(),
        pallet_id: new.pallet_id.clone(),
        item_id: new.item_id.clone(),
        item_code: new.item_code.clone(),
        barcode: new.barcode.clone(),
        uom: new.uom.clone(),
        rec_date: new.rec_date,
        prod_date: new.prod_date,
        exp_date: new.exp_date,
        lot_no: new.lot_no.clone(),
        qa_status: new.qa_status.clone(),
        qty,
        source_ref: new.source_ref.clone(),
        transfer_from: new.transfer_from.clone(),
        trans_kind: new.trans_kind,
        version: 0,
        created_by: new.actor.clone(),
        created_at: now,
        updated_by: None,
        updated_at: now,
        deleted_by: None,
        deleted_at: None,
    })
}

/// Any line by id, retired ones included.
pub async fn find_line(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<InventoryLine>> {
    let line = sqlx::query_as::<_, InventoryLine>("SELECT * FROM inventory_lines WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(line)
}

/// A live line by id.
///
/// ## Errors
/// * `LineNotFound` - no such line, or it was retired
pub async fn get_line(conn: &mut SqliteConnection, id: &str) -> DbResult<InventoryLine> {
    match find_line(conn, id).await? {
        Some(line) if !line.is_deleted() => Ok(line),
        _ => Err(CoreError::LineNotFound(id.to_string()).into()),
    }
}

/// Takes the write lock on a live line before it is read.
pub async fn lock_line(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE inventory_lines SET version = version WHERE id = ?1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::LineNotFound(id.to_string()).into());
    }
    Ok(())
}

/// Takes the write lock on every live line of an item in a warehouse.
pub async fn lock_candidates(
    conn: &mut SqliteConnection,
    owner_code: &str,
    item_id: &str,
    whs_code: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE inventory_lines SET version = version
        WHERE owner_code = ?1 AND item_id = ?2 AND whs_code = ?3 AND deleted_at IS NULL
        "#,
    )
    .bind(owner_code)
    .bind(item_id)
    .bind(whs_code)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Takes the write lock on the lines of an item at one location.
///
/// Holds even when no line matches: a merge-or-create then cannot race
/// another creator for the same key.
pub async fn lock_place(
    conn: &mut SqliteConnection,
    whs_code: &str,
    location_code: &str,
    item_id: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE inventory_lines SET version = version
        WHERE whs_code = ?1 AND location_code = ?2 AND item_id = ?3 AND deleted_at IS NULL
        "#,
    )
    .bind(whs_code)
    .bind(location_code)
    .bind(item_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Applies `delta` to a line's counters.
///
/// ## Arguments
/// * `expected_min_available` - refuse unless the line currently has at least
///   this much available (allocation and transfer sources)
///
/// ## Errors
/// * `LineNotFound` - missing or retired line
/// * `InsufficientQuantity` - a counter would go negative, or available is
///   below `expected_min_available`
/// * `ConcurrencyConflict` - the row changed between read and write
pub async fn mutate_quantities(
    conn: &mut SqliteConnection,
    id: &str,
    delta: &QuantityDelta,
    expected_min_available: Option<i64>,
    actor: &str,
) -> DbResult<InventoryLine> {
    lock_line(conn, id).await?;
    let mut line = get_line(conn, id).await?;

    if let Some(min) = expected_min_available {
        if line.qty.available < min {
            return Err(CoreError::InsufficientQuantity {
                line_id: id.to_string(),
                counter: Counter::Available,
                current: line.qty.available,
                requested: min,
            }
            .into());
        }
    }

    let next = line.qty.apply(id, delta)?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE inventory_lines SET
            origin = ?1, onhand = ?2, available = ?3,
            allocated = ?4, suspended = ?5, shipped = ?6,
            version = version + 1, updated_by = ?7, updated_at = ?8
        WHERE id = ?9 AND version = ?10 AND deleted_at IS NULL
        "#,
    )
    .bind(next.origin)
    .bind(next.onhand)
    .bind(next.available)
    .bind(next.allocated)
    .bind(next.suspended)
    .bind(next.shipped)
    .bind(actor)
    .bind(now)
    .bind(id)
    .bind(line.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict(format!(
            "inventory line {id} changed after version {}",
            line.version
        )));
    }

    debug!(
        line_id = %id,
        available = next.available,
        allocated = next.allocated,
        onhand = next.onhand,
        "Counters updated"
    );

    line.qty = next;
    line.version += 1;
    line.updated_by = Some(actor.to_string());
    line.updated_at = now;
    Ok(line)
}

/// Live lines of an item in a warehouse with available stock, by number.
pub async fn list_allocatable(
    conn: &mut SqliteConnection,
    owner_code: &str,
    item_id: &str,
    whs_code: &str,
) -> DbResult<Vec<InventoryLine>> {
    let lines = sqlx::query_as::<_, InventoryLine>(
        r#"
        SELECT * FROM inventory_lines
        WHERE owner_code = ?1 AND item_id = ?2 AND whs_code = ?3
          AND deleted_at IS NULL AND available > 0
        ORDER BY inventory_no
        "#,
    )
    .bind(owner_code)
    .bind(item_id)
    .bind(whs_code)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

/// Live lines of an item at one location, by number.
pub async fn list_at_place(
    conn: &mut SqliteConnection,
    whs_code: &str,
    location_code: &str,
    item_id: &str,
) -> DbResult<Vec<InventoryLine>> {
    let lines = sqlx::query_as::<_, InventoryLine>(
        r#"
        SELECT * FROM inventory_lines
        WHERE whs_code = ?1 AND location_code = ?2 AND item_id = ?3 AND deleted_at IS NULL
        ORDER BY inventory_no
        "#,
    )
    .bind(whs_code)
    .bind(location_code)
    .bind(item_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

/// Oldest live line matching the merge key, if any.
pub async fn find_merge_target(
    conn: &mut SqliteConnection,
    key: &MergeKey,
) -> DbResult<Option<InventoryLine>> {
    let lines = list_at_place(conn, &key.whs_code, &key.location_code, &key.item_id).await?;
    Ok(lines.into_iter().find(|line| key.matches(line)))
}

/// Soft-deletes an empty line.
///
/// The line and its ledger stay queryable by id; it no longer takes part in
/// allocation, merging or transfers.
///
/// ## Errors
/// * `LineNotEmpty` - onhand is not zero
pub async fn retire_line(
    conn: &mut SqliteConnection,
    id: &str,
    actor: &str,
) -> DbResult<InventoryLine> {
    lock_line(conn, id).await?;
    let mut line = get_line(conn, id).await?;

    if line.qty.onhand != 0 {
        return Err(CoreError::LineNotEmpty {
            line_id: id.to_string(),
            onhand: line.qty.onhand,
        }
        .into());
    }

    let now = Utc::now();
    let result = sqlx::query(
        r#"
        UPDATE inventory_lines SET
            deleted_by = ?1, deleted_at = ?2, updated_by = ?1, updated_at = ?2,
            version = version + 1
        WHERE id = ?3 AND version = ?4 AND deleted_at IS NULL
        "#,
    )
    .bind(actor)
    .bind(now)
    .bind(id)
    .bind(line.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict(format!("inventory line {id} changed while retiring")));
    }

    line.version += 1;
    line.deleted_by = Some(actor.to_string());
    line.deleted_at = Some(now);
    line.updated_by = Some(actor.to_string());
    line.updated_at = now;
    Ok(line)
}

// =============================================================================
// Repository (read paths)
// =============================================================================

/// Pool-level read access to inventory lines.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// A live line by id (`LineNotFound` otherwise).
    pub async fn get_line(&self, id: &str) -> DbResult<InventoryLine> {
        let mut conn = self.pool.acquire().await?;
        get_line(&mut conn, id).await
    }

    /// Any line by id, retired ones included.
    pub async fn find_line(&self, id: &str) -> DbResult<Option<InventoryLine>> {
        let mut conn = self.pool.acquire().await?;
        find_line(&mut conn, id).await
    }

    /// Allocatable lines of an item in the order `policy` would consume them.
    pub async fn list_available(
        &self,
        item_id: &str,
        whs_code: &str,
        policy: AllocationPolicy,
    ) -> DbResult<Vec<InventoryLine>> {
        let mut lines = sqlx::query_as::<_, InventoryLine>(
            r#"
            SELECT * FROM inventory_lines
            WHERE item_id = ?1 AND whs_code = ?2 AND deleted_at IS NULL AND available > 0
            "#,
        )
        .bind(item_id)
        .bind(whs_code)
        .fetch_all(&self.pool)
        .await?;

        order_candidates(&mut lines, policy);
        Ok(lines)
    }

    /// Live lines at a location, any quantity.
    pub async fn list_by_location(
        &self,
        whs_code: &str,
        location_code: &str,
    ) -> DbResult<Vec<InventoryLine>> {
        let lines = sqlx::query_as::<_, InventoryLine>(
            r#"
            SELECT * FROM inventory_lines
            WHERE whs_code = ?1 AND location_code = ?2 AND deleted_at IS NULL
            ORDER BY item_id, inventory_no
            "#,
        )
        .bind(whs_code)
        .bind(location_code)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    /// Totals for one item in one warehouse.
    pub async fn stock_summary(&self, item_id: &str, whs_code: &str) -> DbResult<StockSummary> {
        let (lines, onhand, available, allocated, suspended): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(onhand), 0),
                    COALESCE(SUM(available), 0),
                    COALESCE(SUM(allocated), 0),
                    COALESCE(SUM(suspended), 0)
                FROM inventory_lines
                WHERE item_id = ?1 AND whs_code = ?2 AND deleted_at IS NULL
                "#,
            )
            .bind(item_id)
            .bind(whs_code)
            .fetch_one(&self.pool)
            .await?;

        Ok(StockSummary {
            item_id: item_id.to_string(),
            whs_code: whs_code.to_string(),
            lines,
            onhand,
            available,
            allocated,
            suspended,
        })
    }

    /// Per-item totals for a warehouse.
    pub async fn warehouse_summary(&self, whs_code: &str) -> DbResult<Vec<StockSummary>> {
        let rows = sqlx::query_as::<_, StockSummary>(
            r#"
            SELECT
                item_id,
                whs_code,
                COUNT(*) AS lines,
                SUM(onhand) AS onhand,
                SUM(available) AS available,
                SUM(allocated) AS allocated,
                SUM(suspended) AS suspended
            FROM inventory_lines
            WHERE whs_code = ?1 AND deleted_at IS NULL
            GROUP BY item_id, whs_code
            ORDER BY item_id
            "#,
        )
        .bind(whs_code)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, memory_db, receipt, WHS};

    #[tokio::test]
    async fn test_create_assigns_sequential_numbers() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let a = create_line(&mut conn, &NewLine::from_putaway(&receipt("S1", "L1", "X", 10, "2024-01-01")))
            .await
            .unwrap();
        let b = create_line(&mut conn, &NewLine::from_putaway(&receipt("S2", "L2", "X", 5, "2024-01-02")))
            .await
            .unwrap();

        assert_eq!(b.inventory_no, a.inventory_no + 1);
        assert_eq!(a.qty, Quantities::received(10));
        assert_eq!(a.trans_kind, TransactionKind::Inbound);

        let stored = get_line(&mut conn, &a.id).await.unwrap();
        assert_eq!(stored.qty, a.qty);
        assert_eq!(stored.rec_date, date("2024-01-01"));
        assert_eq!(stored.source_ref.as_deref(), Some("S1"));
    }

    #[tokio::test]
    async fn test_mutate_bumps_version() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let line = create_line(&mut conn, &NewLine::from_putaway(&receipt("S1", "L1", "X", 10, "2024-01-01")))
            .await
            .unwrap();

        let after = mutate_quantities(&mut conn, &line.id, &QuantityDelta::allocate(4), Some(4), "picker")
            .await
            .unwrap();
        assert_eq!(after.version, 1);
        assert_eq!((after.qty.available, after.qty.allocated), (6, 4));

        let stored = get_line(&mut conn, &line.id).await.unwrap();
        assert_eq!(stored.qty, after.qty);
        assert_eq!(stored.updated_by.as_deref(), Some("picker"));
    }

    #[tokio::test]
    async fn test_rejected_mutation_leaves_line_unchanged() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let line = create_line(&mut conn, &NewLine::from_putaway(&receipt("S1", "L1", "X", 10, "2024-01-01")))
            .await
            .unwrap();

        let err = mutate_quantities(&mut conn, &line.id, &QuantityDelta::allocate(11), None, "picker")
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientQuantity { counter: Counter::Available, .. })
        ));

        let err = mutate_quantities(&mut conn, &line.id, &QuantityDelta::allocate(1), Some(20), "picker")
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InsufficientQuantity { .. })));

        let stored = get_line(&mut conn, &line.id).await.unwrap();
        assert_eq!(stored.qty, Quantities::received(10));
        assert_eq!(stored.version, 0);
    }

    #[tokio::test]
    async fn test_missing_line_is_not_found() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = mutate_quantities(&mut conn, "nope", &QuantityDelta::allocate(1), None, "x")
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::LineNotFound(_))));
    }

    #[tokio::test]
    async fn test_merge_target_respects_key() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let req = receipt("S1", "L1", "X", 10, "2024-01-01");
        let line = create_line(&mut conn, &NewLine::from_putaway(&req)).await.unwrap();

        let found = find_merge_target(&mut conn, &req.merge_key(false)).await.unwrap();
        assert_eq!(found.map(|l| l.id), Some(line.id.clone()));

        let mut other_lot = req.clone();
        other_lot.lot_no = "LOT-9".to_string();
        assert!(find_merge_target(&mut conn, &other_lot.merge_key(false))
            .await
            .unwrap()
            .is_none());

        let mut later = req.clone();
        later.rec_date = date("2024-02-01");
        assert!(find_merge_target(&mut conn, &later.merge_key(false)).await.unwrap().is_some());
        assert!(find_merge_target(&mut conn, &later.merge_key(true)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retire_requires_empty_line() {
        let db = memory_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let line = create_line(&mut conn, &NewLine::from_putaway(&receipt("S1", "L1", "X", 3, "2024-01-01")))
            .await
            .unwrap();

        let err = retire_line(&mut conn, &line.id, "clerk").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::LineNotEmpty { onhand: 3, .. })));

        mutate_quantities(&mut conn, &line.id, &QuantityDelta::count_correction(-3), None, "clerk")
            .await
            .unwrap();
        let retired = retire_line(&mut conn, &line.id, "clerk").await.unwrap();
        assert!(retired.is_deleted());

        assert!(get_line(&mut conn, &line.id).await.is_err());
        assert!(find_line(&mut conn, &line.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_summary_and_ordering() {
        let db = memory_db().await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            create_line(&mut conn, &NewLine::from_putaway(&receipt("S1", "L1", "X", 50, "2024-02-01")))
                .await
                .unwrap();
            create_line(&mut conn, &NewLine::from_putaway(&receipt("S2", "L2", "X", 20, "2024-01-01")))
                .await
                .unwrap();
        }

        let repo = db.inventory();
        let lines = repo.list_available("X", WHS, AllocationPolicy::Fifo).await.unwrap();
        let locations: Vec<_> = lines.iter().map(|l| l.location_code.as_str()).collect();
        assert_eq!(locations, vec!["L2", "L1"]);

        let summary = repo.stock_summary("X", WHS).await.unwrap();
        assert_eq!((summary.lines, summary.onhand, summary.available), (2, 70, 70));

        let empty = repo.stock_summary("NONE", WHS).await.unwrap();
        assert_eq!(empty.lines, 0);

        let per_item = repo.warehouse_summary(WHS).await.unwrap();
        assert_eq!(per_item.len(), 1);
        assert_eq!(per_item[0].onhand, 70);
    }
}
