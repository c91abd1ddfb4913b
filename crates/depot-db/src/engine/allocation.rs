//! # Allocation Engine
//!
//! Reserves stock for outbound orders and drives the pick lifecycle.
//!
//! ## Allocate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  allocate(order SO-1, item X, W1, qty 30)                               │
//! │                                                                         │
//! │  1. lock candidates (item X, W1)                                       │
//! │  2. resolve owner policy → FIFO | FEFO                                 │
//! │  3. candidates sorted:  A (rec 01-01, avail 20)  B (rec 02-01, 50)     │
//! │  4. plan:               A ← 20, B ← 10        (or InsufficientStock)   │
//! │  5. per line:  available → allocated, pick assignment, OUTBOUND entry  │
//! │  6. commit                                                             │
//! │                                                                         │
//! │  All-or-nothing: a demand the warehouse cannot fill in full leaves no  │
//! │  trace in counters, assignments or ledger.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use depot_core::allocation::{order_candidates, plan_picks};
use depot_core::validation::{validate_quantity, validate_text};
use depot_core::{
    AllocationRequest, CoreError, Counter, InventoryLine, MovementGroupId, MovementRefType, NewMovement,
    PickAssignment, PickStatus, QuantityDelta, ShipConfirmation, ValidationError,
};

use crate::config::EngineSettings;
use crate::error::DbResult;
use crate::repository::{inventory, ledger, picking, policy};

/// Outbound allocation and pick lifecycle.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    pool: SqlitePool,
    settings: EngineSettings,
}

impl AllocationEngine {
    pub fn new(pool: SqlitePool, settings: EngineSettings) -> Self {
        AllocationEngine { pool, settings }
    }

    // =========================================================================
    // Allocate
    // =========================================================================

    /// Reserves `req.qty` of an item across the oldest eligible lines.
    ///
    /// ## Errors
    /// * `InsufficientStock` - total available is below the demand; nothing
    ///   is reserved
    /// * `ConcurrencyConflict` - another writer held the lines too long
    pub async fn allocate(&self, req: &AllocationRequest) -> DbResult<Vec<PickAssignment>> {
        let mut conn = self.pool.acquire().await?;
        self.allocate_in(&mut conn, req).await
    }

    /// [`allocate`](Self::allocate) inside the caller's session.
    pub async fn allocate_in(
        &self,
        conn: &mut SqliteConnection,
        req: &AllocationRequest,
    ) -> DbResult<Vec<PickAssignment>> {
        req.validate()?;

        let mut tx = conn.begin().await?;

        inventory::lock_candidates(&mut tx, &req.owner_code, &req.item_id, &req.whs_code).await?;
        let ordering = policy::resolve(&mut tx, &req.owner_code, &self.settings)
            .await?
            .allocation_policy();

        let mut candidates =
            inventory::list_allocatable(&mut tx, &req.owner_code, &req.item_id, &req.whs_code)
                .await?;
        order_candidates(&mut candidates, ordering);

        let plan = plan_picks(&req.item_id, &req.whs_code, &candidates, req.qty).map_err(|err| {
            warn!(order = %req.order_ref, item = %req.item_id, error = %err, "Allocation refused");
            err
        })?;

        debug!(
            order = %req.order_ref,
            policy = %ordering,
            lines = plan.len(),
            "Allocation planned"
        );

        let group = MovementGroupId::generate();
        let now = Utc::now();
        let mut assignments = Vec::with_capacity(plan.len());

        for pick in &plan {
            let delta = QuantityDelta::allocate(pick.qty);
            let line = inventory::mutate_quantities(
                &mut tx,
                &pick.line_id,
                &delta,
                Some(pick.qty),
                &req.actor,
            )
            .await?;

            let assignment = new_assignment(&req.order_ref, &group, &line, pick.qty, None, &req.actor, now);
            picking::insert(&mut tx, &assignment).await?;

            ledger::append(
                &mut tx,
                &NewMovement::new(&line.id, &group, MovementRefType::Outbound, &req.order_ref, delta, &req.actor)
                    .at(line.place())
                    .reason(Some(format!("allocate {}", assignment.id))),
            )
            .await?;

            assignments.push(assignment);
        }

        tx.commit().await?;

        info!(
            order = %req.order_ref,
            item = %req.item_id,
            qty = req.qty,
            lines = assignments.len(),
            "Stock allocated"
        );
        Ok(assignments)
    }

    // =========================================================================
    // Release / Cancel
    // =========================================================================

    /// Returns the unshipped remainder of assignments to available.
    ///
    /// ## Errors
    /// * `InvalidPickState` - an assignment is already closed; none are released
    pub async fn release(&self, assignment_ids: &[String], actor: &str) -> DbResult<Vec<PickAssignment>> {
        let mut conn = self.pool.acquire().await?;
        self.release_in(&mut conn, assignment_ids, actor).await
    }

    pub async fn release_in(
        &self,
        conn: &mut SqliteConnection,
        assignment_ids: &[String],
        actor: &str,
    ) -> DbResult<Vec<PickAssignment>> {
        validate_text("actor", actor)?;

        let mut tx = conn.begin().await?;
        let group = MovementGroupId::generate();
        let mut released = Vec::with_capacity(assignment_ids.len());

        for id in assignment_ids {
            picking::lock(&mut tx, id).await?;
            let assignment = picking::get(&mut tx, id).await?;
            released.push(release_one(&mut tx, assignment, &group, actor).await?);
        }

        tx.commit().await?;
        info!(count = released.len(), "Pick assignments released");
        Ok(released)
    }

    /// Releases every open assignment of an order.
    pub async fn cancel_order(&self, order_ref: &str, actor: &str) -> DbResult<Vec<PickAssignment>> {
        let mut conn = self.pool.acquire().await?;
        self.cancel_order_in(&mut conn, order_ref, actor).await
    }

    pub async fn cancel_order_in(
        &self,
        conn: &mut SqliteConnection,
        order_ref: &str,
        actor: &str,
    ) -> DbResult<Vec<PickAssignment>> {
        validate_text("order_ref", order_ref)?;
        validate_text("actor", actor)?;

        let mut tx = conn.begin().await?;
        picking::lock_order(&mut tx, order_ref).await?;

        let open: Vec<PickAssignment> = picking::list_by_order(&mut tx, order_ref)
            .await?
            .into_iter()
            .filter(|a| a.status.is_open())
            .collect();

        let group = MovementGroupId::generate();
        let mut released = Vec::with_capacity(open.len());
        for assignment in open {
            released.push(release_one(&mut tx, assignment, &group, actor).await?);
        }

        tx.commit().await?;
        info!(order = %order_ref, count = released.len(), "Order allocation cancelled");
        Ok(released)
    }

    // =========================================================================
    // Ship
    // =========================================================================

    /// Confirms picked quantities as shipped.
    ///
    /// Each confirmation moves `shipped_qty` from allocated/onhand to shipped.
    /// A partial confirmation leaves the rest reserved.
    ///
    /// ## Errors
    /// * `InsufficientQuantity` - more than the assignment still holds
    /// * `InvalidPickState` - the assignment is closed
    pub async fn complete_shipment(
        &self,
        confirmations: &[ShipConfirmation],
        actor: &str,
    ) -> DbResult<Vec<PickAssignment>> {
        let mut conn = self.pool.acquire().await?;
        self.complete_shipment_in(&mut conn, confirmations, actor).await
    }

    pub async fn complete_shipment_in(
        &self,
        conn: &mut SqliteConnection,
        confirmations: &[ShipConfirmation],
        actor: &str,
    ) -> DbResult<Vec<PickAssignment>> {
        validate_text("actor", actor)?;
        for confirmation in confirmations {
            validate_quantity("shipped_qty", confirmation.shipped_qty)?;
        }

        let mut tx = conn.begin().await?;
        let group = MovementGroupId::generate();
        let now = Utc::now();
        let mut shipped = Vec::with_capacity(confirmations.len());

        for confirmation in confirmations {
            picking::lock(&mut tx, &confirmation.assignment_id).await?;
            let mut assignment = picking::get(&mut tx, &confirmation.assignment_id).await?;
            ensure_open(&assignment, "ship")?;

            let qty = confirmation.shipped_qty;
            if qty > assignment.remaining() {
                return Err(CoreError::InsufficientQuantity {
                    line_id: assignment.line_id.clone(),
                    counter: Counter::Allocated,
                    current: assignment.remaining(),
                    requested: qty,
                }
                .into());
            }

            let delta = QuantityDelta::ship(qty);
            let line = inventory::mutate_quantities(&mut tx, &assignment.line_id, &delta, None, actor).await?;

            let previous = assignment.status;
            assignment.shipped_qty += qty;
            assignment.status = if assignment.remaining() == 0 {
                PickStatus::Shipped
            } else {
                PickStatus::PartiallyShipped
            };
            assignment.updated_at = now;
            picking::update_progress(&mut tx, &assignment, previous, now).await?;

            ledger::append(
                &mut tx,
                &NewMovement::new(&line.id, &group, MovementRefType::Shipment, &assignment.order_ref, delta, actor)
                    .from_place(line.place())
                    .reason(Some(format!("ship {}", assignment.id))),
            )
            .await?;

            shipped.push(assignment);
        }

        tx.commit().await?;
        info!(count = shipped.len(), "Shipment confirmed");
        Ok(shipped)
    }

    // =========================================================================
    // Override
    // =========================================================================

    /// Moves an open assignment's remaining reservation to another line.
    ///
    /// Used when the picker takes stock from a different line than the one
    /// the engine chose. The original assignment becomes `overridden` and a
    /// new one is returned.
    ///
    /// ## Errors
    /// * `WarehouseMismatch` - replacement line is in another warehouse
    /// * `OwnerMismatch` - replacement line holds another owner's stock
    /// * `InsufficientQuantity` - replacement line lacks the available stock
    pub async fn override_assignment(
        &self,
        assignment_id: &str,
        replacement_line_id: &str,
        actor: &str,
    ) -> DbResult<PickAssignment> {
        let mut conn = self.pool.acquire().await?;
        self.override_assignment_in(&mut conn, assignment_id, replacement_line_id, actor)
            .await
    }

    pub async fn override_assignment_in(
        &self,
        conn: &mut SqliteConnection,
        assignment_id: &str,
        replacement_line_id: &str,
        actor: &str,
    ) -> DbResult<PickAssignment> {
        validate_text("replacement_line_id", replacement_line_id)?;
        validate_text("actor", actor)?;

        let mut tx = conn.begin().await?;

        picking::lock(&mut tx, assignment_id).await?;
        let mut original = picking::get(&mut tx, assignment_id).await?;
        ensure_open(&original, "override")?;

        if original.line_id == replacement_line_id {
            return Err(ValidationError::NoOpMovement(format!(
                "assignment {assignment_id} already picks from line {replacement_line_id}"
            ))
            .into());
        }

        inventory::lock_line(&mut tx, replacement_line_id).await?;
        let replacement = inventory::get_line(&mut tx, replacement_line_id).await?;
        if replacement.whs_code != original.whs_code {
            return Err(CoreError::WarehouseMismatch {
                line_id: replacement.id,
                expected: original.whs_code,
                actual: replacement.whs_code,
            }
            .into());
        }
        if replacement.owner_code != original.owner_code {
            return Err(CoreError::OwnerMismatch {
                line_id: replacement.id,
                expected: original.owner_code,
                actual: replacement.owner_code,
            }
            .into());
        }
        if replacement.item_id != original.item_id {
            return Err(ValidationError::InvalidFormat {
                field: "replacement_line_id".to_string(),
                reason: format!(
                    "line holds {} but the assignment is for {}",
                    replacement.item_id, original.item_id
                ),
            }
            .into());
        }

        let qty = original.remaining();
        let group = MovementGroupId::generate();
        let now = Utc::now();

        let release = QuantityDelta::release(qty);
        let released_line =
            inventory::mutate_quantities(&mut tx, &original.line_id, &release, None, actor).await?;

        let allocate = QuantityDelta::allocate(qty);
        let taken_line =
            inventory::mutate_quantities(&mut tx, &replacement.id, &allocate, Some(qty), actor).await?;

        let previous = original.status;
        original.status = PickStatus::Overridden;
        original.updated_at = now;
        picking::update_progress(&mut tx, &original, previous, now).await?;

        let successor = new_assignment(
            &original.order_ref,
            &group,
            &taken_line,
            qty,
            Some(original.id.clone()),
            actor,
            now,
        );
        picking::insert(&mut tx, &successor).await?;

        let reason = Some(format!("override {} -> {}", original.id, successor.id));
        ledger::append(
            &mut tx,
            &NewMovement::new(&released_line.id, &group, MovementRefType::PickOverride, &original.order_ref, release, actor)
                .at(released_line.place())
                .counterpart(&taken_line.id)
                .reason(reason.clone()),
        )
        .await?;
        ledger::append(
            &mut tx,
            &NewMovement::new(&taken_line.id, &group, MovementRefType::PickOverride, &original.order_ref, allocate, actor)
                .at(taken_line.place())
                .counterpart(&released_line.id)
                .reason(reason),
        )
        .await?;

        tx.commit().await?;

        info!(
            order = %original.order_ref,
            from_line = %released_line.id,
            to_line = %taken_line.id,
            qty,
            "Pick assignment overridden"
        );
        Ok(successor)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn new_assignment(
    order_ref: &str,
    group: &MovementGroupId,
    line: &InventoryLine,
    qty: i64,
    override_of: Option<String>,
    actor: &str,
    now: DateTime<Utc>,
) -> PickAssignment {
    PickAssignment {
        id: Uuid::new_v4().to_string(),
        order_ref: order_ref.to_string(),
        group_id: group.as_str().to_string(),
        line_id: line.id.clone(),
        owner_code: line.owner_code.clone(),
        item_id: line.item_id.clone(),
        whs_code: line.whs_code.clone(),
        location_code: line.location_code.clone(),
        pallet_id: line.pallet_id.clone(),
        lot_no: line.lot_no.clone(),
        qty,
        shipped_qty: 0,
        status: PickStatus::Allocated,
        override_of,
        actor: actor.to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn ensure_open(assignment: &PickAssignment, action: &str) -> Result<(), CoreError> {
    if assignment.status.is_open() {
        Ok(())
    } else {
        Err(CoreError::InvalidPickState {
            assignment_id: assignment.id.clone(),
            status: assignment.status.to_string(),
            action: action.to_string(),
        })
    }
}

async fn release_one(
    conn: &mut SqliteConnection,
    mut assignment: PickAssignment,
    group: &MovementGroupId,
    actor: &str,
) -> DbResult<PickAssignment> {
    ensure_open(&assignment, "release")?;

    let delta = QuantityDelta::release(assignment.remaining());
    let line = inventory::mutate_quantities(conn, &assignment.line_id, &delta, None, actor).await?;

    let now = Utc::now();
    let previous = assignment.status;
    assignment.status = PickStatus::Released;
    assignment.updated_at = now;
    picking::update_progress(conn, &assignment, previous, now).await?;

    ledger::append(
        conn,
        &NewMovement::new(&line.id, group, MovementRefType::Outbound, &assignment.order_ref, delta, actor)
            .at(line.place())
            .reason(Some(format!("release {}", assignment.id))),
    )
    .await?;

    Ok(assignment)
}

// =============================================================================
// Unit Tests
// =============================================================================
