//! # Transfer Operator
//!
//! Moves available stock between locations and/or QA statuses inside one
//! warehouse.
//!
//! ## One Leg
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  source line (L1, A)                      destination line (L2, A)      │
//! │  origin/onhand/available −15  ───────►   origin/onhand/available +15    │
//! │                                           (merged or newly created)     │
//! │                                                                         │
//! │  ledger:  TRANSFER TR-1 group G  source  −15   counterpart = dest       │
//! │           TRANSFER TR-1 group G  dest    +15   counterpart = source     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Allocated and suspended stock never moves; a QA change of held stock is a
//! `release_hold` followed by a transfer. [`TransferOperator::move_by_available`]
//! walks the source lines oldest first and may produce several legs, all
//! sharing one group id.

use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use depot_core::allocation::{order_candidates, plan_picks};
use depot_core::putaway::MergeKey;
use depot_core::transfer::ensure_moves;
use depot_core::{
    AllocationPolicy, CoreError, InventoryLine, MovementGroupId, MovementRefType, NewMovement,
    QuantityDelta, TransferByAvailable, TransferByLine, TransferLeg, TransferOutcome,
};

use crate::config::EngineSettings;
use crate::error::DbResult;
use crate::repository::inventory::{self, NewLine};
use crate::repository::{ledger, location, policy};

/// Location / QA-status moves.
#[derive(Debug, Clone)]
pub struct TransferOperator {
    pool: SqlitePool,
    settings: EngineSettings,
}

/// Where a leg goes and under which reference.
struct LegTarget<'a> {
    to_location: &'a str,
    to_qa: &'a str,
    ref_id: &'a str,
    actor: &'a str,
    reason: Option<String>,
}

impl TransferOperator {
    pub fn new(pool: SqlitePool, settings: EngineSettings) -> Self {
        TransferOperator { pool, settings }
    }

    // =========================================================================
    // By Line
    // =========================================================================

    /// Moves `req.qty` out of one identified line.
    ///
    /// ## Errors
    /// * `WarehouseMismatch` / `LocationMismatch` - the line is not where the
    ///   operator said it is
    /// * `LocationNotRegistered` - unknown destination
    /// * `InsufficientQuantity` - the line has less available than requested
    pub async fn move_by_line_id(&self, req: &TransferByLine) -> DbResult<TransferOutcome> {
        let mut conn = self.pool.acquire().await?;
        self.move_by_line_id_in(&mut conn, req).await
    }

    pub async fn move_by_line_id_in(
        &self,
        conn: &mut SqliteConnection,
        req: &TransferByLine,
    ) -> DbResult<TransferOutcome> {
        req.validate()?;

        let mut tx = conn.begin().await?;

        inventory::lock_line(&mut tx, &req.line_id).await?;
        let source = inventory::get_line(&mut tx, &req.line_id).await?;

        if source.whs_code != req.from_whs {
            return Err(CoreError::WarehouseMismatch {
                line_id: source.id,
                expected: req.from_whs.clone(),
                actual: source.whs_code,
            }
            .into());
        }
        if source.location_code != req.from_location {
            return Err(CoreError::LocationMismatch {
                line_id: source.id,
                expected: req.from_location.clone(),
                actual: source.location_code,
            }
            .into());
        }

        let to_qa = req.to_qa_status.clone().unwrap_or_else(|| source.qa_status.clone());
        ensure_moves(&source, &req.to_location, &to_qa)?;
        ensure_registered(&mut tx, &source.whs_code, &req.to_location).await?;

        let group = MovementGroupId::generate();
        let target = LegTarget {
            to_location: &req.to_location,
            to_qa: &to_qa,
            ref_id: &req.ref_id,
            actor: &req.actor,
            reason: req.reason.clone(),
        };
        let leg = self.move_leg(&mut tx, &source, req.qty, &target, &group).await?;

        tx.commit().await?;

        let outcome = TransferOutcome {
            group_id: group.as_str().to_string(),
            legs: vec![leg],
        };
        info!(
            ref_id = %req.ref_id,
            line_id = %req.line_id,
            to = %req.to_location,
            qty = req.qty,
            "Transfer committed"
        );
        Ok(outcome)
    }

    // =========================================================================
    // By Available
    // =========================================================================

    /// Moves `req.qty` of an item out of a location, drawing from its lines
    /// oldest first.
    ///
    /// ## Errors
    /// * `InsufficientStock` - the location holds less available than requested
    /// * `LocationNotRegistered` - unknown destination
    pub async fn move_by_available(&self, req: &TransferByAvailable) -> DbResult<TransferOutcome> {
        let mut conn = self.pool.acquire().await?;
        self.move_by_available_in(&mut conn, req).await
    }

    pub async fn move_by_available_in(
        &self,
        conn: &mut SqliteConnection,
        req: &TransferByAvailable,
    ) -> DbResult<TransferOutcome> {
        req.validate()?;

        let mut tx = conn.begin().await?;

        inventory::lock_place(&mut tx, &req.whs_code, &req.from_location, &req.item_id).await?;
        ensure_registered(&mut tx, &req.whs_code, &req.to_location).await?;

        let mut sources: Vec<InventoryLine> =
            inventory::list_at_place(&mut tx, &req.whs_code, &req.from_location, &req.item_id)
                .await?
                .into_iter()
                .filter(|line| line.owner_code == req.owner_code)
                .filter(|line| req.barcode.as_ref().map_or(true, |b| &line.barcode == b))
                .filter(|line| req.qa_status.as_ref().map_or(true, |q| &line.qa_status == q))
                .collect();
        order_candidates(&mut sources, AllocationPolicy::Fifo);

        let plan = plan_picks(&req.item_id, &req.whs_code, &sources, req.qty)?;
        debug!(ref_id = %req.ref_id, legs = plan.len(), "Transfer planned");

        let group = MovementGroupId::generate();
        let mut legs = Vec::with_capacity(plan.len());

        for pick in &plan {
            let Some(source) = sources.iter().find(|line| line.id == pick.line_id) else {
                return Err(CoreError::LineNotFound(pick.line_id.clone()).into());
            };

            let to_qa = req.to_qa_status.clone().unwrap_or_else(|| source.qa_status.clone());
            ensure_moves(source, &req.to_location, &to_qa)?;

            let target = LegTarget {
                to_location: &req.to_location,
                to_qa: &to_qa,
                ref_id: &req.ref_id,
                actor: &req.actor,
                reason: req.reason.clone(),
            };
            legs.push(self.move_leg(&mut tx, source, pick.qty, &target, &group).await?);
        }

        tx.commit().await?;

        let outcome = TransferOutcome {
            group_id: group.as_str().to_string(),
            legs,
        };
        info!(
            ref_id = %req.ref_id,
            item = %req.item_id,
            from = %req.from_location,
            to = %req.to_location,
            qty = outcome.total_qty(),
            legs = outcome.legs.len(),
            "Transfer committed"
        );
        Ok(outcome)
    }

    // =========================================================================
    // Leg
    // =========================================================================

    async fn move_leg(
        &self,
        conn: &mut SqliteConnection,
        source: &InventoryLine,
        qty: i64,
        target: &LegTarget<'_>,
        group: &MovementGroupId,
    ) -> DbResult<TransferLeg> {
        let out = QuantityDelta::transfer_out(qty);
        let source_after =
            inventory::mutate_quantities(conn, &source.id, &out, Some(qty), target.actor).await?;

        let owner_policy = policy::resolve(conn, &source.owner_code, &self.settings).await?;
        let key = MergeKey::for_destination(
            source,
            target.to_location,
            target.to_qa,
            owner_policy.putaway_match_dates,
        );

        let incoming = QuantityDelta::receive(qty);
        let destination = match inventory::find_merge_target(conn, &key).await? {
            Some(existing) => {
                inventory::mutate_quantities(conn, &existing.id, &incoming, None, target.actor).await?
            }
            None => {
                let new_line = NewLine::transfer_of(
                    source,
                    target.to_location,
                    target.to_qa,
                    qty,
                    target.ref_id,
                    target.actor,
                );
                inventory::create_line(conn, &new_line).await?
            }
        };

        ledger::append(
            conn,
            &NewMovement::new(&source_after.id, group, MovementRefType::Transfer, target.ref_id, out, target.actor)
                .from_place(source_after.place())
                .to_place(destination.place())
                .counterpart(&destination.id)
                .reason(target.reason.clone()),
        )
        .await?;
        ledger::append(
            conn,
            &NewMovement::new(&destination.id, group, MovementRefType::Transfer, target.ref_id, incoming, target.actor)
                .from_place(source_after.place())
                .to_place(destination.place())
                .counterpart(&source_after.id)
                .reason(target.reason.clone()),
        )
        .await?;

        Ok(TransferLeg {
            qty,
            source: source_after,
            destination,
        })
    }
}

async fn ensure_registered(
    conn: &mut SqliteConnection,
    whs_code: &str,
    location_code: &str,
) -> DbResult<()> {
    if location::is_registered(conn, whs_code, location_code).await? {
        Ok(())
    } else {
        Err(CoreError::LocationNotRegistered {
            whs_code: whs_code.to_string(),
            location_code: location_code.to_string(),
        }
        .into())
    }
}
