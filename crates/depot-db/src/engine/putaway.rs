//! # Putaway / Receiving Committer
//!
//! Turns scanned receipts into stock.
//!
//! ```text
//! scan (item X, lot L, qty 10) at W1/A-01
//!     │
//!     ├── location registered?           no → LocationNotRegistered
//!     ├── live line with the same merge key at A-01?
//!     │       yes → onhand/available += 10          (merge)
//!     │       no  → new line, next inventory number (create)
//!     └── PUTAWAY ledger entry carrying that delta, ref = scan id
//! ```
//!
//! A batch of scans is committed either one transaction per scan
//! ([`PutawayCommitter::commit_batch`], failures reported per scan) or as a
//! single transaction ([`PutawayCommitter::commit_all`], all or nothing).

use sqlx::{Connection, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use depot_core::{
    CoreError, InventoryLine, MovementGroupId, MovementRefType, NewMovement, PutawayRequest,
    QuantityDelta,
};

use crate::config::EngineSettings;
use crate::error::DbResult;
use crate::repository::inventory::{self, NewLine};
use crate::repository::{ledger, location, policy};

/// Commits received stock into inventory lines.
#[derive(Debug, Clone)]
pub struct PutawayCommitter {
    pool: SqlitePool,
    settings: EngineSettings,
}

impl PutawayCommitter {
    pub fn new(pool: SqlitePool, settings: EngineSettings) -> Self {
        PutawayCommitter { pool, settings }
    }

    /// Commits one scan. Returns the line that now holds the stock.
    ///
    /// ## Errors
    /// * `LocationNotRegistered` - destination is unknown or inactive
    /// * `Validation` - non-positive quantity, missing codes
    pub async fn commit(&self, req: &PutawayRequest) -> DbResult<InventoryLine> {
        let mut conn = self.pool.acquire().await?;
        self.commit_in(&mut conn, req).await
    }

    /// [`commit`](Self::commit) inside the caller's session.
    pub async fn commit_in(
        &self,
        conn: &mut SqliteConnection,
        req: &PutawayRequest,
    ) -> DbResult<InventoryLine> {
        req.validate()?;

        let mut tx = conn.begin().await?;

        inventory::lock_place(&mut tx, &req.whs_code, &req.location_code, &req.item_id).await?;

        if !location::is_registered(&mut tx, &req.whs_code, &req.location_code).await? {
            return Err(CoreError::LocationNotRegistered {
                whs_code: req.whs_code.clone(),
                location_code: req.location_code.clone(),
            }
            .into());
        }

        let owner_policy = policy::resolve(&mut tx, &req.owner_code, &self.settings).await?;
        let key = req.merge_key(owner_policy.putaway_match_dates);

        let (line, delta) = match inventory::find_merge_target(&mut tx, &key).await? {
            Some(target) => {
                debug!(scan = %req.scan_id, line_id = %target.id, "Merging receipt into existing line");
                let delta = QuantityDelta::top_up(req.qty);
                let line = inventory::mutate_quantities(&mut tx, &target.id, &delta, None, &req.actor).await?;
                (line, delta)
            }
            None => {
                let line = inventory::create_line(&mut tx, &NewLine::from_putaway(req)).await?;
                (line, QuantityDelta::receive(req.qty))
            }
        };

        ledger::append(
            &mut tx,
            &NewMovement::new(
                &line.id,
                &MovementGroupId::generate(),
                MovementRefType::Putaway,
                &req.scan_id,
                delta,
                &req.actor,
            )
            .to_place(line.place()),
        )
        .await?;

        tx.commit().await?;

        info!(
            scan = %req.scan_id,
            line_id = %line.id,
            inventory_no = line.inventory_no,
            location = %line.location_code,
            qty = req.qty,
            "Putaway committed"
        );
        Ok(line)
    }

    /// Commits each scan in its own transaction.
    ///
    /// A failing scan does not stop the batch; the result at index `i`
    /// belongs to `requests[i]`.
    pub async fn commit_batch(&self, requests: &[PutawayRequest]) -> Vec<DbResult<InventoryLine>> {
        let mut results = Vec::with_capacity(requests.len());

        for req in requests {
            let result = self.commit(req).await;
            if let Err(err) = &result {
                warn!(scan = %req.scan_id, error = %err, "Putaway failed");
            }
            results.push(result);
        }

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(total = requests.len(), failed, "Putaway batch finished");
        results
    }

    /// Commits every scan in one transaction; any failure rolls all back.
    pub async fn commit_all(&self, requests: &[PutawayRequest]) -> DbResult<Vec<InventoryLine>> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut lines = Vec::with_capacity(requests.len());
        for req in requests {
            lines.push(self.commit_in(&mut tx, req).await?);
        }

        tx.commit().await?;
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_db, receipt, WHS};
    use depot_core::TransactionKind;

    #[tokio::test]
    async fn test_second_scan_merges() {
        let db = memory_db().await;
        let first = db.putaway().commit(&receipt("S1", "L1", "X", 10, "2024-01-01")).await.unwrap();
        let second = db.putaway().commit(&receipt("S2", "L1", "X", 5, "2024-01-01")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!((second.qty.origin, second.qty.onhand, second.qty.available), (10, 15, 15));
        assert_eq!(second.trans_kind, TransactionKind::Inbound);

        let entries = db.ledger().list_by_line(&first.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].ref_id, "S2");
        assert_eq!(entries[1].delta, QuantityDelta::top_up(5));
        assert!(db.ledger().reconcile_line(&first.id).await.unwrap().is_balanced());
    }

    #[tokio::test]
    async fn test_different_lot_creates_line() {
        let db = memory_db().await;
        let first = db.putaway().commit(&receipt("S1", "L1", "X", 10, "2024-01-01")).await.unwrap();

        let mut other = receipt("S2", "L1", "X", 5, "2024-01-01");
        other.lot_no = "LOT-2".to_string();
        let second = db.putaway().commit(&other).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.inventory_no, first.inventory_no + 1);
        assert_eq!(db.inventory().stock_summary("X", WHS).await.unwrap().onhand, 15);
    }

    #[tokio::test]
    async fn test_unregistered_location_rejected() {
        let db = memory_db().await;
        let err = db
            .putaway()
            .commit(&receipt("S1", "NOWHERE", "X", 10, "2024-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::LocationNotRegistered { .. })));
        assert_eq!(db.inventory().stock_summary("X", WHS).await.unwrap().lines, 0);
    }

    #[tokio::test]
    async fn test_batch_reports_each_scan() {
        let db = memory_db().await;
        let scans = vec![
            receipt("S1", "L1", "X", 10, "2024-01-01"),
            receipt("S2", "NOWHERE", "X", 5, "2024-01-01"),
            receipt("S3", "L2", "X", 7, "2024-01-01"),
        ];

        let results = db.putaway().commit_batch(&scans).await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(db.inventory().stock_summary("X", WHS).await.unwrap().onhand, 17);
    }

    #[tokio::test]
    async fn test_commit_all_is_atomic() {
        let db = memory_db().await;
        let scans = vec![
            receipt("S1", "L1", "X", 10, "2024-01-01"),
            receipt("S2", "NOWHERE", "X", 5, "2024-01-01"),
        ];

        assert!(db.putaway().commit_all(&scans).await.is_err());
        assert_eq!(db.inventory().stock_summary("X", WHS).await.unwrap().lines, 0);

        let lines = db.putaway().commit_all(&scans[..1]).await.unwrap();
        assert_eq!(lines.len(), 1);
    }
}
