//! # Putaway Types
//!
//! Scanned receipts waiting to become stock, and the key that decides
//! whether a receipt merges into an existing line or creates a new one.
//!
//! ## Merge Or Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Putaway Decision                                 │
//! │                                                                         │
//! │  PutawayRequest ──► MergeKey                                           │
//! │                     (owner, whs, location, item, barcode,              │
//! │                      qa_status, lot_no, pallet                         │
//! │                      [+ rec/prod/exp dates when policy says so])       │
//! │                          │                                              │
//! │            ┌─────────────┴─────────────┐                                │
//! │            ▼                           ▼                                │
//! │     live line matches            no live match                         │
//! │     → MERGE (+qty)               → CREATE (origin=onhand=avail=qty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::types::InventoryLine;
use crate::validation::{validate_code, validate_quantity, validate_text};

/// A scanned receipt ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PutawayRequest {
    /// Scan record id; becomes the ledger reference and the line's source.
    pub scan_id: String,
    pub owner_code: String,
    pub whs_code: String,
    pub location_code: String,
    #[serde(default)]
    pub pallet_id: String,
    pub item_id: String,
    pub item_code: String,
    pub barcode: String,
    pub uom: String,
    #[serde(default)]
    pub lot_no: String,
    pub qa_status: String,
    #[ts(as = "String")]
    pub rec_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub prod_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub exp_date: Option<NaiveDate>,
    pub qty: i64,
    pub actor: String,
}

impl PutawayRequest {
    /// Checks the request before any row is read.
    pub fn validate(&self) -> CoreResult<()> {
        validate_quantity("qty", self.qty)?;
        validate_text("scan_id", &self.scan_id)?;
        validate_code("owner_code", &self.owner_code)?;
        validate_code("whs_code", &self.whs_code)?;
        validate_code("location_code", &self.location_code)?;
        validate_code("item_id", &self.item_id)?;
        validate_code("qa_status", &self.qa_status)?;
        validate_text("actor", &self.actor)?;
        Ok(())
    }

    /// The merge key for this receipt.
    pub fn merge_key(&self, match_dates: bool) -> MergeKey {
        MergeKey {
            owner_code: self.owner_code.clone(),
            whs_code: self.whs_code.clone(),
            location_code: self.location_code.clone(),
            item_id: self.item_id.clone(),
            barcode: self.barcode.clone(),
            qa_status: self.qa_status.clone(),
            lot_no: self.lot_no.clone(),
            pallet_id: self.pallet_id.clone(),
            dates: match_dates.then_some(LotDates {
                rec_date: self.rec_date,
                prod_date: self.prod_date,
                exp_date: self.exp_date,
            }),
        }
    }
}

/// Receipt/production/expiry dates, compared only when policy requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotDates {
    pub rec_date: NaiveDate,
    pub prod_date: Option<NaiveDate>,
    pub exp_date: Option<NaiveDate>,
}

/// Identity of "the same stock" for merge decisions.
///
/// Putaway and the transfer destination leg both use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeKey {
    pub owner_code: String,
    pub whs_code: String,
    pub location_code: String,
    pub item_id: String,
    pub barcode: String,
    pub qa_status: String,
    pub lot_no: String,
    pub pallet_id: String,
    pub dates: Option<LotDates>,
}

impl MergeKey {
    /// Key for moving `line`'s stock to another location / QA status.
    pub fn for_destination(
        line: &InventoryLine,
        location_code: &str,
        qa_status: &str,
        match_dates: bool,
    ) -> Self {
        MergeKey {
            owner_code: line.owner_code.clone(),
            whs_code: line.whs_code.clone(),
            location_code: location_code.to_string(),
            item_id: line.item_id.clone(),
            barcode: line.barcode.clone(),
            qa_status: qa_status.to_string(),
            lot_no: line.lot_no.clone(),
            pallet_id: line.pallet_id.clone(),
            dates: match_dates.then_some(LotDates {
                rec_date: line.rec_date,
                prod_date: line.prod_date,
                exp_date: line.exp_date,
            }),
        }
    }

    /// True when `line` is live and carries this key.
    pub fn matches(&self, line: &InventoryLine) -> bool {
        let same = !line.is_deleted()
            && line.owner_code == self.owner_code
            && line.whs_code == self.whs_code
            && line.location_code == self.location_code
            && line.item_id == self.item_id
            && line.barcode == self.barcode
            && line.qa_status == self.qa_status
            && line.lot_no == self.lot_no
            && line.pallet_id == self.pallet_id;

        match &self.dates {
            Some(d) => {
                same && line.rec_date == d.rec_date
                    && line.prod_date == d.prod_date
                    && line.exp_date == d.exp_date
            }
            None => same,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
