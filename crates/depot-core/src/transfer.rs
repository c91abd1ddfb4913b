//! # Transfer Types
//!
//! Requests for moving stock to another location and/or QA status.
//!
//! Two entry points exist because callers use both:
//! - [`TransferByLine`] - the operator scanned a specific line
//! - [`TransferByAvailable`] - "move N of item X from L1 to L2"; the engine
//!   picks the source lines at L1 in FIFO order

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::types::InventoryLine;
use crate::validation::{validate_code, validate_quantity, validate_text};

/// Move `qty` of one specific line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferByLine {
    /// Business reference (transfer document / relocation task id).
    pub ref_id: String,
    pub line_id: String,
    /// What the caller believes the line's warehouse is.
    pub from_whs: String,
    /// What the caller believes the line's location is.
    pub from_location: String,
    pub to_location: String,
    /// Destination QA status; `None` keeps the source status.
    pub to_qa_status: Option<String>,
    pub qty: i64,
    pub actor: String,
    pub reason: Option<String>,
}

impl TransferByLine {
    pub fn validate(&self) -> CoreResult<()> {
        validate_quantity("qty", self.qty)?;
        validate_text("ref_id", &self.ref_id)?;
        validate_text("line_id", &self.line_id)?;
        validate_code("from_whs", &self.from_whs)?;
        validate_code("from_location", &self.from_location)?;
        validate_code("to_location", &self.to_location)?;
        if let Some(qa) = &self.to_qa_status {
            validate_code("to_qa_status", qa)?;
        }
        validate_text("actor", &self.actor)?;
        Ok(())
    }
}

/// Move `qty` of an item out of a location, drawing on available stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferByAvailable {
    pub ref_id: String,
    pub owner_code: String,
    pub whs_code: String,
    pub from_location: String,
    pub to_location: String,
    pub item_id: String,
    /// Restrict sources to this barcode.
    pub barcode: Option<String>,
    /// Restrict sources to this QA status.
    pub qa_status: Option<String>,
    /// Destination QA status; `None` keeps each source line's status.
    pub to_qa_status: Option<String>,
    pub qty: i64,
    pub actor: String,
    pub reason: Option<String>,
}

impl TransferByAvailable {
    pub fn validate(&self) -> CoreResult<()> {
        validate_quantity("qty", self.qty)?;
        validate_text("ref_id", &self.ref_id)?;
        validate_code("owner_code", &self.owner_code)?;
        validate_code("whs_code", &self.whs_code)?;
        validate_code("from_location", &self.from_location)?;
        validate_code("to_location", &self.to_location)?;
        validate_code("item_id", &self.item_id)?;
        if let Some(qa) = &self.to_qa_status {
            validate_code("to_qa_status", qa)?;
        }
        validate_text("actor", &self.actor)?;

        let same_qa = match (&self.qa_status, &self.to_qa_status) {
            (_, None) => true,
            (Some(from), Some(to)) => from == to,
            (None, Some(_)) => false,
        };
        if self.from_location == self.to_location && same_qa {
            return Err(ValidationError::NoOpMovement(format!(
                "transfer of {} stays at {}",
                self.item_id, self.from_location
            ))
            .into());
        }
        Ok(())
    }
}

/// Rejects a move whose destination equals the source line's place.
pub fn ensure_moves(line: &InventoryLine, to_location: &str, to_qa: &str) -> CoreResult<()> {
    if line.location_code == to_location && line.qa_status == to_qa {
        return Err(ValidationError::NoOpMovement(format!(
            "line {} is already at {} with QA {}",
            line.id, to_location, to_qa
        ))
        .into());
    }
    Ok(())
}

/// One source → destination leg of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferLeg {
    pub qty: i64,
    pub source: InventoryLine,
    pub destination: InventoryLine,
}

/// Result of a transfer: every leg shares one movement group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferOutcome {
    pub group_id: String,
    pub legs: Vec<TransferLeg>,
}

impl TransferOutcome {
    pub fn total_qty(&self) -> i64 {
        self.legs.iter().map(|l| l.qty).sum()
    }
}
