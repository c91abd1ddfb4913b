//! # Allocation Policy
//!
//! Deterministic candidate ordering and pick planning for outbound demand.
//!
//! ## Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Candidate Order (ascending)                          │
//! │                                                                         │
//! │  FIFO:  rec_date ─► pallet_id ─► location_code ─► inventory_no         │
//! │                                                                         │
//! │  FEFO:  exp_date (undated last) ─► then the FIFO keys                  │
//! │                                                                         │
//! │  inventory_no is unique, so the order is total: the same candidate     │
//! │  set always yields the same pick sequence.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Planning
//! Walk the ordered candidates taking `min(available, remaining)` from each
//! until the demand is met. A demand the candidates cannot cover yields
//! `InsufficientStock` and no plan at all, so nothing is reserved.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{AllocationPolicy, InventoryLine};
use crate::validation::{validate_code, validate_quantity, validate_text};

/// Outbound demand for one item in one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AllocationRequest {
    /// Outbound order the reservation belongs to.
    pub order_ref: String,
    /// Stock owner; selects the inventory policy (FIFO/FEFO).
    pub owner_code: String,
    pub item_id: String,
    pub whs_code: String,
    pub qty: i64,
    pub actor: String,
}

impl AllocationRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_quantity("qty", self.qty)?;
        validate_text("order_ref", &self.order_ref)?;
        validate_code("owner_code", &self.owner_code)?;
        validate_code("item_id", &self.item_id)?;
        validate_code("whs_code", &self.whs_code)?;
        validate_text("actor", &self.actor)?;
        Ok(())
    }
}

/// Confirmed pack/ship quantity for one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShipConfirmation {
    pub assignment_id: String,
    pub shipped_qty: i64,
}

/// One step of an allocation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlannedPick {
    pub line_id: String,
    pub qty: i64,
}

/// Compares two candidate lines under `policy`.
pub fn compare_candidates(
    a: &InventoryLine,
    b: &InventoryLine,
    policy: AllocationPolicy,
) -> Ordering {
    let fifo = |a: &InventoryLine, b: &InventoryLine| {
        a.rec_date
            .cmp(&b.rec_date)
            .then_with(|| a.pallet_id.cmp(&b.pallet_id))
            .then_with(|| a.location_code.cmp(&b.location_code))
            .then_with(|| a.inventory_no.cmp(&b.inventory_no))
    };

    match policy {
        AllocationPolicy::Fifo => fifo(a, b),
        AllocationPolicy::Fefo => expiry_order(a.exp_date, b.exp_date).then_with(|| fifo(a, b)),
    }
}

fn expiry_order(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts candidates in place into allocation order.
pub fn order_candidates(lines: &mut [InventoryLine], policy: AllocationPolicy) {
    lines.sort_by(|a, b| compare_candidates(a, b, policy));
}

/// Plans which lines satisfy `requested` units.
///
/// `candidates` must already be in allocation order (see [`order_candidates`]).
/// Retired lines and lines without available stock are skipped.
///
/// ## Errors
/// * `InsufficientStock` - candidates cover less than `requested`
pub fn plan_picks(
    item_id: &str,
    whs_code: &str,
    candidates: &[InventoryLine],
    requested: i64,
) -> CoreResult<Vec<PlannedPick>> {
    let mut remaining = requested;
    let mut plan = Vec::new();

    for line in candidates {
        if remaining == 0 {
            break;
        }
        if line.is_deleted() || line.qty.available <= 0 {
            continue;
        }

        let take = line.qty.available.min(remaining);
        plan.push(PlannedPick {
            line_id: line.id.clone(),
            qty: take,
        });
        remaining -= take;
    }

    if remaining > 0 {
        return Err(CoreError::InsufficientStock {
            item_id: item_id.to_string(),
            whs_code: whs_code.to_string(),
            available: requested - remaining,
            requested,
        });
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantities;
    use crate::types::TransactionKind;
    use chrono::Utc;

    fn line(no: i64, rec: &str, pallet: &str, loc: &str, exp: Option<&str>, avail: i64) -> InventoryLine {
        let now = Utc::now();
        InventoryLine {
            id: format!("line-{no}"),
            inventory_no: no,
            owner_code: "ACME".to_string(),
            whs_code: "W1".to_string(),
            location_code: loc.to_string(),
            pallet_id: pallet.to_string(),
            item_id: "X".to_string(),
            item_code: "X".to_string(),
            barcode: "0001".to_string(),
            uom: "EA".to_string(),
            rec_date: rec.parse().unwrap(),
            prod_date: None,
            exp_date: exp.map(|e| e.parse().unwrap()),
            lot_no: String::new(),
            qa_status: "A".to_string(),
            qty: Quantities::received(avail),
            source_ref: None,
            transfer_from: None,
            trans_kind: TransactionKind::Inbound,
            version: 0,
            created_by: "test".to_string(),
            created_at: now,
            updated_by: None,
            updated_at: now,
            deleted_by: None,
            deleted_at: None,
        }
    }

    fn ids(lines: &[InventoryLine]) -> Vec<i64> {
        lines.iter().map(|l| l.inventory_no).collect()
    }

    #[test]
    fn test_fifo_order_with_tie_breaks() {
        let mut lines = vec![
            line(1, "2024-02-01", "P1", "A-01", None, 5),
            line(2, "2024-01-01", "P2", "A-01", None, 5),
            line(3, "2024-01-01", "P1", "B-01", None, 5),
            line(4, "2024-01-01", "P1", "A-02", None, 5),
        ];
        order_candidates(&mut lines, AllocationPolicy::Fifo);
        assert_eq!(ids(&lines), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_fefo_puts_undated_last() {
        let mut lines = vec![
            line(1, "2024-01-01", "P1", "A-01", None, 5),
            line(2, "2024-03-01", "P1", "A-01", Some("2025-06-01"), 5),
            line(3, "2024-02-01", "P1", "A-01", Some("2025-01-01"), 5),
        ];
        order_candidates(&mut lines, AllocationPolicy::Fefo);
        assert_eq!(ids(&lines), vec![3, 2, 1]);

        order_candidates(&mut lines, AllocationPolicy::Fifo);
        assert_eq!(ids(&lines), vec![1, 3, 2]);
    }

    #[test]
    fn test_plan_consumes_oldest_first() {
        let lines = vec![
            line(1, "2024-01-01", "", "A-01", None, 20),
            line(2, "2024-02-01", "", "A-01", None, 50),
        ];
        let plan = plan_picks("X", "W1", &lines, 30).unwrap();
        assert_eq!(
            plan,
            vec![
                PlannedPick { line_id: "line-1".to_string(), qty: 20 },
                PlannedPick { line_id: "line-2".to_string(), qty: 10 },
            ]
        );
    }

    #[test]
    fn test_plan_short_demand_fails_whole() {
        let lines = vec![
            line(1, "2024-01-01", "", "A-01", None, 30),
            line(2, "2024-02-01", "", "A-01", None, 50),
        ];
        let err = plan_picks("X", "W1", &lines, 100).unwrap_err();
        match err {
            CoreError::InsufficientStock { available, requested, .. } => {
                assert_eq!(available, 80);
                assert_eq!(requested, 100);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_plan_skips_empty_lines() {
        let mut empty = line(1, "2024-01-01", "", "A-01", None, 0);
        empty.qty = Quantities::default();
        let lines = vec![empty, line(2, "2024-02-01", "", "A-01", None, 10)];
        let plan = plan_picks("X", "W1", &lines, 10).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].line_id, "line-2");
    }
}
