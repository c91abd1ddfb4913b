//! # Domain Types
//!
//! Core domain types used throughout Depot.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  InventoryLine  │   │ MovementLedger  │   │  PickAssignment │       │
//! │  │  ─────────────  │   │     Entry       │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  line_id (FK)   │   │  line_id (FK)   │       │
//! │  │  inventory_no   │   │  group_id       │   │  order_ref      │       │
//! │  │  whs/location   │   │  ref_type/id    │   │  qty/shipped    │       │
//! │  │  lot attributes │   │  deltas         │   │  status         │       │
//! │  │  Quantities     │   │  from/to place  │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ TransactionKind │   │ MovementRefType │   │   PickStatus    │       │
//! │  │  Inbound        │   │  PUTAWAY        │   │  allocated      │       │
//! │  │  Transfer       │   │  OUTBOUND       │   │  partially_...  │       │
//! │  │                 │   │  TRANSFER ...   │   │  shipped ...    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every inventory line has:
//! - `id`: UUID v4 - immutable, used for relations and ledger references
//! - `inventory_no`: sequential, human-readable, assigned once, never reused

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::quantity::{Quantities, QuantityDelta};

// =============================================================================
// Transaction Kind
// =============================================================================

/// How an inventory line came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Created by a putaway of received stock.
    Inbound,
    /// Created as the destination leg of a transfer.
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Inbound => "inbound",
            TransactionKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Movement Reference Type
// =============================================================================

/// The business event behind a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementRefType {
    /// Scanned receipt committed into stock.
    Putaway,
    /// Allocation against an outbound order (and its release).
    Outbound,
    /// Paired reversal + re-allocation when an operator picks another line.
    PickOverride,
    /// Allocated stock confirmed as shipped.
    Shipment,
    /// Location / QA-status move between two lines.
    Transfer,
    /// Stock-take correction or manual adjustment.
    Adjustment,
    /// QA hold / release (available ↔ suspended).
    QaReclass,
}

impl MovementRefType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementRefType::Putaway => "PUTAWAY",
            MovementRefType::Outbound => "OUTBOUND",
            MovementRefType::PickOverride => "PICK_OVERRIDE",
            MovementRefType::Shipment => "SHIPMENT",
            MovementRefType::Transfer => "TRANSFER",
            MovementRefType::Adjustment => "ADJUSTMENT",
            MovementRefType::QaReclass => "QA_RECLASS",
        }
    }
}

impl fmt::Display for MovementRefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Allocation Policy
// =============================================================================

/// Candidate ordering used by the allocation walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AllocationPolicy {
    /// receipt date, pallet, location (ascending)
    #[default]
    Fifo,
    /// expiry date first (undated last), then the FIFO keys
    Fefo,
}

impl FromStr for AllocationPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(AllocationPolicy::Fifo),
            "fefo" => Ok(AllocationPolicy::Fefo),
            other => Err(ValidationError::InvalidFormat {
                field: "allocation_policy".to_string(),
                reason: format!("expected fifo or fefo, got '{other}'"),
            }),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPolicy::Fifo => f.write_str("fifo"),
            AllocationPolicy::Fefo => f.write_str("fefo"),
        }
    }
}

/// Per-owner inventory policy row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryPolicy {
    pub owner_code: String,
    /// FEFO overrides FIFO for this owner's stock.
    pub use_fefo: bool,
    /// Putaway merges only when rec/prod/exp dates also match.
    pub putaway_match_dates: bool,
}

impl InventoryPolicy {
    #[inline]
    pub fn allocation_policy(&self) -> AllocationPolicy {
        if self.use_fefo {
            AllocationPolicy::Fefo
        } else {
            AllocationPolicy::Fifo
        }
    }
}

// =============================================================================
// Inventory Line
// =============================================================================

/// The unit of stock: one item at one location/pallet, one lot, one QA status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryLine {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Sequential human-readable number, assigned at creation.
    pub inventory_no: i64,

    pub owner_code: String,
    pub whs_code: String,
    pub location_code: String,
    /// Pallet/container id; empty when the stock is loose.
    pub pallet_id: String,

    pub item_id: String,
    pub item_code: String,
    pub barcode: String,
    pub uom: String,

    #[ts(as = "String")]
    pub rec_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub prod_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub exp_date: Option<NaiveDate>,
    /// Lot number; empty when the item is not lot-tracked.
    pub lot_no: String,
    /// Free-form QA status code ("A", "HOLD", ...).
    pub qa_status: String,

    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub qty: Quantities,

    /// Scan/receipt record that produced this line.
    pub source_ref: Option<String>,
    /// Source line when this line is a transfer destination.
    pub transfer_from: Option<String>,
    pub trans_kind: TransactionKind,

    /// Optimistic concurrency version, bumped on every counter write.
    pub version: i64,

    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub deleted_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl InventoryLine {
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Where this line sits, for ledger from/to columns.
    pub fn place(&self) -> StockPlace {
        StockPlace {
            whs_code: self.whs_code.clone(),
            location_code: self.location_code.clone(),
            qa_status: self.qa_status.clone(),
        }
    }
}

/// Warehouse + location + QA status of a movement endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockPlace {
    pub whs_code: String,
    pub location_code: String,
    pub qa_status: String,
}

// =============================================================================
// Movement Ledger
// =============================================================================

/// Identifier shared by every ledger row of one logical operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementGroupId(pub String);

impl MovementGroupId {
    pub fn generate() -> Self {
        MovementGroupId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MovementGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One append-only ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementLedgerEntry {
    /// Insertion order; ties in `created_at` never reorder the ledger.
    pub seq: i64,
    pub id: String,
    pub line_id: String,
    /// The other line of a paired movement (transfer, pick override).
    pub counterpart_line_id: Option<String>,
    pub group_id: String,
    pub ref_type: MovementRefType,
    pub ref_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub delta: QuantityDelta,
    pub from_whs: Option<String>,
    pub to_whs: Option<String>,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub from_qa: Option<String>,
    pub to_qa: Option<String>,
    pub reason: Option<String>,
    pub actor: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A ledger row about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub line_id: String,
    pub counterpart_line_id: Option<String>,
    pub group_id: MovementGroupId,
    pub ref_type: MovementRefType,
    pub ref_id: String,
    pub delta: QuantityDelta,
    pub from: Option<StockPlace>,
    pub to: Option<StockPlace>,
    pub reason: Option<String>,
    pub actor: String,
}

impl NewMovement {
    pub fn new(
        line_id: impl Into<String>,
        group_id: &MovementGroupId,
        ref_type: MovementRefType,
        ref_id: impl Into<String>,
        delta: QuantityDelta,
        actor: impl Into<String>,
    ) -> Self {
        NewMovement {
            line_id: line_id.into(),
            counterpart_line_id: None,
            group_id: group_id.clone(),
            ref_type,
            ref_id: ref_id.into(),
            delta,
            from: None,
            to: None,
            reason: None,
            actor: actor.into(),
        }
    }

    pub fn from_place(mut self, place: StockPlace) -> Self {
        self.from = Some(place);
        self
    }

    pub fn to_place(mut self, place: StockPlace) -> Self {
        self.to = Some(place);
        self
    }

    /// Same place on both sides (quantity-only movements).
    pub fn at(self, place: StockPlace) -> Self {
        self.from_place(place.clone()).to_place(place)
    }

    pub fn counterpart(mut self, line_id: impl Into<String>) -> Self {
        self.counterpart_line_id = Some(line_id.into());
        self
    }

    pub fn reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }
}

// =============================================================================
// Pick Assignment
// =============================================================================

/// Lifecycle of a pick assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PickStatus {
    /// Quantity reserved on the line.
    Allocated,
    /// Part shipped; the remainder is still reserved.
    PartiallyShipped,
    /// Fully shipped.
    Shipped,
    /// Remaining reservation returned to available.
    Released,
    /// Replaced by an assignment on another line.
    Overridden,
}

impl PickStatus {
    /// Still holds reserved quantity on its line.
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, PickStatus::Allocated | PickStatus::PartiallyShipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PickStatus::Allocated => "allocated",
            PickStatus::PartiallyShipped => "partially_shipped",
            PickStatus::Shipped => "shipped",
            PickStatus::Released => "released",
            PickStatus::Overridden => "overridden",
        }
    }
}

impl fmt::Display for PickStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line's share of an outbound demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PickAssignment {
    pub id: String,
    pub order_ref: String,
    pub group_id: String,
    pub line_id: String,
    /// Owner of the reserved stock; overrides stay within it.
    pub owner_code: String,
    pub item_id: String,
    pub whs_code: String,
    pub location_code: String,
    pub pallet_id: String,
    pub lot_no: String,
    /// Quantity reserved by this assignment.
    pub qty: i64,
    pub shipped_qty: i64,
    pub status: PickStatus,
    /// Assignment this one replaced (operator override).
    pub override_of: Option<String>,
    pub actor: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl PickAssignment {
    /// Quantity still reserved on the line.
    #[inline]
    pub fn remaining(&self) -> i64 {
        self.qty - self.shipped_qty
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// Totals for one item in one warehouse (stock-take snapshot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockSummary {
    pub item_id: String,
    pub whs_code: String,
    pub lines: i64,
    pub onhand: i64,
    pub available: i64,
    pub allocated: i64,
    pub suspended: i64,
}

/// Ledger-vs-counters comparison for one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reconciliation {
    pub line_id: String,
    pub entries: i64,
    pub counters: QuantityDelta,
    pub ledger_sum: QuantityDelta,
}

impl Reconciliation {
    /// Ledger deltas reproduce the current counters.
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.counters == self.ledger_sum
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
