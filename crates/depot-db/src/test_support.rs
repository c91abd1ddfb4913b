//! Shared fixtures for the in-crate tests.

use chrono::NaiveDate;

use depot_core::{PutawayRequest, DEFAULT_OWNER_CODE, DEFAULT_QA_STATUS};

use crate::pool::{Database, DbConfig};

pub const WHS: &str = "W1";

/// In-memory database with locations L1..L4 registered in `W1`.
pub async fn memory_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    for loc in ["L1", "L2", "L3", "L4"] {
        db.locations().register(WHS, loc).await.unwrap();
    }
    db
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// A scanned receipt of `qty` units of `item` at `location`.
pub fn receipt(scan_id: &str, location: &str, item: &str, qty: i64, rec_date: &str) -> PutawayRequest {
    PutawayRequest {
        scan_id: scan_id.to_string(),
        owner_code: DEFAULT_OWNER_CODE.to_string(),
        whs_code: WHS.to_string(),
        location_code: location.to_string(),
        pallet_id: String::new(),
        item_id: item.to_string(),
        item_code: item.to_string(),
        barcode: format!("{item}-BC"),
        uom: "EA".to_string(),
        lot_no: String::new(),
        qa_status: DEFAULT_QA_STATUS.to_string(),
        rec_date: date(rec_date),
        prod_date: None,
        exp_date: None,
        qty,
        actor: "receiver".to_string(),
    }
}
