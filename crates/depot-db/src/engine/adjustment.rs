//! # Adjustment Engine
//!
//! Stock-take corrections, QA holds and line retirement.
//!
//! | Operation      | Delta                          | Ledger ref    |
//! |----------------|--------------------------------|---------------|
//! | `count`        | onhand, available ± diff       | `ADJUSTMENT`  |
//! | `hold`         | available → suspended          | `QA_RECLASS`  |
//! | `release_hold` | suspended → available          | `QA_RECLASS`  |
//! | `apply`        | any balanced delta             | `ADJUSTMENT`  |
//! | `retire`       | none (soft delete, onhand = 0) | none          |

use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::info;

use depot_core::validation::{validate_quantity, validate_text};
use depot_core::{
    InventoryLine, MovementGroupId, MovementRefType, NewMovement, QuantityDelta, ValidationError,
    MAX_MOVEMENT_QUANTITY,
};

use crate::error::DbResult;
use crate::repository::{inventory, ledger};

/// Who adjusts which line, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub line_id: String,
    /// Count sheet / QA ticket / adjustment document.
    pub ref_id: String,
    pub reason: Option<String>,
    pub actor: String,
}

impl Adjustment {
    fn validate(&self) -> DbResult<()> {
        validate_text("line_id", &self.line_id)?;
        validate_text("ref_id", &self.ref_id)?;
        validate_text("actor", &self.actor)?;
        Ok(())
    }
}

/// Corrections outside the receive/allocate/ship/transfer flows.
#[derive(Debug, Clone)]
pub struct AdjustmentEngine {
    pool: SqlitePool,
}

impl AdjustmentEngine {
    pub fn new(pool: SqlitePool) -> Self {
        AdjustmentEngine { pool }
    }

    /// Sets a line's onhand to the physically counted quantity.
    ///
    /// The difference goes to available; a shortfall larger than what is
    /// available (the rest is reserved or held) is refused. Counting what
    /// the system already shows writes nothing.
    pub async fn count(&self, adj: &Adjustment, counted: i64) -> DbResult<InventoryLine> {
        let mut conn = self.pool.acquire().await?;
        self.count_in(&mut conn, adj, counted).await
    }

    pub async fn count_in(
        &self,
        conn: &mut SqliteConnection,
        adj: &Adjustment,
        counted: i64,
    ) -> DbResult<InventoryLine> {
        adj.validate()?;
        if !(0..=MAX_MOVEMENT_QUANTITY).contains(&counted) {
            return Err(ValidationError::OutOfRange {
                field: "counted".to_string(),
                min: 0,
                max: MAX_MOVEMENT_QUANTITY,
            }
            .into());
        }

        let mut tx = conn.begin().await?;
        inventory::lock_line(&mut tx, &adj.line_id).await?;
        let line = inventory::get_line(&mut tx, &adj.line_id).await?;

        let diff = counted - line.qty.onhand;
        if diff == 0 {
            return Ok(line);
        }

        let line = record(&mut tx, adj, QuantityDelta::count_correction(diff), MovementRefType::Adjustment).await?;
        tx.commit().await?;

        info!(line_id = %adj.line_id, counted, diff, "Stock count applied");
        Ok(line)
    }

    /// Blocks `qty` of available stock (QA hold).
    pub async fn hold(&self, adj: &Adjustment, qty: i64) -> DbResult<InventoryLine> {
        let mut conn = self.pool.acquire().await?;
        self.hold_in(&mut conn, adj, qty).await
    }

    pub async fn hold_in(
        &self,
        conn: &mut SqliteConnection,
        adj: &Adjustment,
        qty: i64,
    ) -> DbResult<InventoryLine> {
        validate_quantity("qty", qty)?;
        self.apply_with(conn, adj, QuantityDelta::hold(qty), MovementRefType::QaReclass)
            .await
    }

    /// Returns `qty` of held stock to available.
    pub async fn release_hold(&self, adj: &Adjustment, qty: i64) -> DbResult<InventoryLine> {
        let mut conn = self.pool.acquire().await?;
        self.release_hold_in(&mut conn, adj, qty).await
    }

    pub async fn release_hold_in(
        &self,
        conn: &mut SqliteConnection,
        adj: &Adjustment,
        qty: i64,
    ) -> DbResult<InventoryLine> {
        validate_quantity("qty", qty)?;
        self.apply_with(conn, adj, QuantityDelta::release_hold(qty), MovementRefType::QaReclass)
            .await
    }

    /// Applies a hand-entered balanced delta.
    ///
    /// For corrections no dedicated operation covers. Origin and shipped are
    /// off limits, no counter moves by more than `MAX_MOVEMENT_QUANTITY`,
    /// and the counters still refuse to go negative or out of balance.
    pub async fn apply(&self, adj: &Adjustment, delta: QuantityDelta) -> DbResult<InventoryLine> {
        let mut conn = self.pool.acquire().await?;
        self.apply_in(&mut conn, adj, delta).await
    }

    pub async fn apply_in(
        &self,
        conn: &mut SqliteConnection,
        adj: &Adjustment,
        delta: QuantityDelta,
    ) -> DbResult<InventoryLine> {
        self.apply_with(conn, adj, delta, MovementRefType::Adjustment).await
    }

    /// Soft-deletes an empty line.
    pub async fn retire(&self, line_id: &str, actor: &str) -> DbResult<InventoryLine> {
        validate_text("actor", actor)?;

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;
        let line = inventory::retire_line(&mut tx, line_id, actor).await?;
        tx.commit().await?;

        info!(line_id = %line_id, "Inventory line retired");
        Ok(line)
    }

    async fn apply_with(
        &self,
        conn: &mut SqliteConnection,
        adj: &Adjustment,
        delta: QuantityDelta,
        ref_type: MovementRefType,
    ) -> DbResult<InventoryLine> {
        adj.validate()?;
        if delta.is_zero() {
            return Err(ValidationError::NoOpMovement(format!(
                "adjustment {} changes nothing on line {}",
                adj.ref_id, adj.line_id
            ))
            .into());
        }
        delta.validate_correction()?;

        let mut tx = conn.begin().await?;
        let line = record(&mut tx, adj, delta, ref_type).await?;
        tx.commit().await?;

        info!(line_id = %adj.line_id, ref_type = %ref_type, ref_id = %adj.ref_id, "Adjustment applied");
        Ok(line)
    }
}

async fn record(
    conn: &mut SqliteConnection,
    adj: &Adjustment,
    delta: QuantityDelta,
    ref_type: MovementRefType,
) -> DbResult<InventoryLine> {
    let line = inventory::mutate_quantities(conn, &adj.line_id, &delta, None, &adj.actor).await?;

    ledger::append(
        conn,
        &NewMovement::new(&line.id, &MovementGroupId::generate(), ref_type, &adj.ref_id, delta, &adj.actor)
            .at(line.place())
            .reason(adj.reason.clone()),
    )
    .await?;

    Ok(line)
}
