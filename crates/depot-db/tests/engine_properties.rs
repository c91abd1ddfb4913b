//! End-to-end properties of the ledger engine, driven through the public
//! `Database` API only.

use chrono::NaiveDate;

use depot_core::{
    AllocationRequest, CoreError, InventoryLine, MovementRefType, PutawayRequest,
    ShipConfirmation, TransferByAvailable, TransferByLine, DEFAULT_OWNER_CODE, DEFAULT_QA_STATUS,
};
use depot_db::{Database, DbConfig, DbError};

const WHS: &str = "W1";
const LOCATIONS: &[&str] = &["L1", "L2", "L3"];

async fn setup() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    for loc in LOCATIONS {
        db.locations().register(WHS, loc).await.unwrap();
    }
    db
}

fn scan(scan_id: &str, location: &str, item: &str, lot: &str, qty: i64, rec_date: &str) -> PutawayRequest {
    let rec_date: NaiveDate = rec_date.parse().unwrap();
    PutawayRequest {
        scan_id: scan_id.to_string(),
        owner_code: DEFAULT_OWNER_CODE.to_string(),
        whs_code: WHS.to_string(),
        location_code: location.to_string(),
        pallet_id: "PLT-1".to_string(),
        item_id: item.to_string(),
        item_code: item.to_string(),
        barcode: format!("{item}-BC"),
        uom: "EA".to_string(),
        lot_no: lot.to_string(),
        qa_status: DEFAULT_QA_STATUS.to_string(),
        rec_date,
        prod_date: None,
        exp_date: None,
        qty,
        actor: "receiver".to_string(),
    }
}

fn demand(order_ref: &str, item: &str, qty: i64) -> AllocationRequest {
    AllocationRequest {
        order_ref: order_ref.to_string(),
        owner_code: DEFAULT_OWNER_CODE.to_string(),
        item_id: item.to_string(),
        whs_code: WHS.to_string(),
        qty,
        actor: "picker".to_string(),
    }
}

fn relocation(item: &str, from: &str, to: &str, qty: i64) -> TransferByAvailable {
    TransferByAvailable {
        ref_id: format!("MV-{item}-{from}-{to}"),
        owner_code: DEFAULT_OWNER_CODE.to_string(),
        whs_code: WHS.to_string(),
        from_location: from.to_string(),
        to_location: to.to_string(),
        item_id: item.to_string(),
        barcode: None,
        qa_status: Some(DEFAULT_QA_STATUS.to_string()),
        to_qa_status: None,
        qty,
        actor: "mover".to_string(),
        reason: None,
    }
}

async fn all_lines(db: &Database) -> Vec<InventoryLine> {
    let mut lines = Vec::new();
    for loc in LOCATIONS {
        lines.extend(db.inventory().list_by_location(WHS, loc).await.unwrap());
    }
    lines
}

async fn assert_ledger_consistent(db: &Database) {
    for line in all_lines(db).await {
        assert!(line.qty.is_balanced(), "line {} out of balance: {:?}", line.id, line.qty);
        assert!(line.qty.is_non_negative(), "line {} negative: {:?}", line.id, line.qty);

        let rec = db.ledger().reconcile_line(&line.id).await.unwrap();
        assert!(rec.is_balanced(), "ledger drift on {}: {:?}", line.id, rec);
    }
}

// =============================================================================
// Invariants
// =============================================================================

#[tokio::test]
async fn counters_and_ledger_agree_after_mixed_operations() {
    let db = setup().await;

    db.putaway().commit(&scan("S1", "L1", "X", "LOT-1", 40, "2024-01-01")).await.unwrap();
    db.putaway().commit(&scan("S2", "L1", "X", "LOT-2", 25, "2024-01-03")).await.unwrap();
    db.putaway().commit(&scan("S3", "L2", "Y", "LOT-1", 30, "2024-01-02")).await.unwrap();

    let picks = db.allocation().allocate(&demand("SO-1", "X", 50)).await.unwrap();
    let confirmations: Vec<ShipConfirmation> = picks
        .iter()
        .map(|p| ShipConfirmation {
            assignment_id: p.id.clone(),
            shipped_qty: p.qty / 2,
        })
        .collect();
    db.allocation().complete_shipment(&confirmations, "packer").await.unwrap();
    db.allocation().cancel_order("SO-1", "picker").await.unwrap();

    db.transfers().move_by_available(&relocation("Y", "L2", "L3", 12)).await.unwrap();
    db.transfers().move_by_available(&relocation("X", "L1", "L3", 20)).await.unwrap();

    assert_ledger_consistent(&db).await;

    let x = db.inventory().stock_summary("X", WHS).await.unwrap();
    assert_eq!(x.allocated, 0);
    assert_eq!(x.onhand, 65 - 25);
}

// =============================================================================
// Allocation
// =============================================================================

#[tokio::test]
async fn allocation_consumes_oldest_receipt_first() {
    let db = setup().await;
    let a = db.putaway().commit(&scan("A", "L1", "X", "LOT-A", 20, "2024-01-01")).await.unwrap();
    let b = db.putaway().commit(&scan("B", "L2", "X", "LOT-B", 50, "2024-02-01")).await.unwrap();

    let picks = db.allocation().allocate(&demand("SO-30", "X", 30)).await.unwrap();

    let plan: Vec<(&str, i64)> = picks.iter().map(|p| (p.line_id.as_str(), p.qty)).collect();
    assert_eq!(plan, vec![(a.id.as_str(), 20), (b.id.as_str(), 10)]);

    let a = db.inventory().get_line(&a.id).await.unwrap();
    let b = db.inventory().get_line(&b.id).await.unwrap();
    assert_eq!((a.qty.available, a.qty.allocated), (0, 20));
    assert_eq!((b.qty.available, b.qty.allocated), (40, 10));

    let entries = db
        .ledger()
        .list_by_reference(MovementRefType::Outbound, "SO-30")
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.iter().map(|e| e.delta.allocated).sum::<i64>(), 30);
}

#[tokio::test]
async fn allocation_order_is_repeatable() {
    let db = setup().await;
    db.putaway().commit(&scan("S1", "L3", "X", "LOT-1", 10, "2024-01-01")).await.unwrap();
    db.putaway().commit(&scan("S2", "L1", "X", "LOT-2", 10, "2024-01-01")).await.unwrap();
    db.putaway().commit(&scan("S3", "L2", "X", "LOT-3", 10, "2023-12-30")).await.unwrap();

    let first = db.allocation().allocate(&demand("SO-1", "X", 25)).await.unwrap();
    let first: Vec<(String, i64)> = first.into_iter().map(|p| (p.line_id, p.qty)).collect();
    db.allocation().cancel_order("SO-1", "picker").await.unwrap();

    let second = db.allocation().allocate(&demand("SO-2", "X", 25)).await.unwrap();
    let second: Vec<(String, i64)> = second.into_iter().map(|p| (p.line_id, p.qty)).collect();

    assert_eq!(first, second);
    assert_eq!(first.iter().map(|(_, q)| q).collect::<Vec<_>>(), vec![&10, &10, &5]);
}

#[tokio::test]
async fn failed_allocation_leaves_no_trace() {
    let db = setup().await;
    db.putaway().commit(&scan("S1", "L1", "X", "LOT-1", 50, "2024-01-01")).await.unwrap();
    db.putaway().commit(&scan("S2", "L2", "X", "LOT-2", 30, "2024-01-02")).await.unwrap();
    let before = all_lines(&db).await;

    let err = db.allocation().allocate(&demand("SO-100", "X", 100)).await.unwrap_err();
    assert!(matches!(
        err.as_domain(),
        Some(CoreError::InsufficientStock { requested: 100, available: 80, .. })
    ));

    let after = all_lines(&db).await;
    let counters = |lines: &[InventoryLine]| lines.iter().map(|l| (l.id.clone(), l.qty)).collect::<Vec<_>>();
    assert_eq!(counters(&before), counters(&after));
    assert!(db.picks().assignments_for_order("SO-100").await.unwrap().is_empty());
    assert!(db
        .ledger()
        .list_by_reference(MovementRefType::Outbound, "SO-100")
        .await
        .unwrap()
        .is_empty());
}

// =============================================================================
// Transfer
// =============================================================================

#[tokio::test]
async fn transfer_to_empty_location_creates_line() {
    let db = setup().await;
    let source = db.putaway().commit(&scan("S1", "L1", "Y", "LOT-1", 40, "2024-01-01")).await.unwrap();

    let outcome = db.transfers().move_by_available(&relocation("Y", "L1", "L2", 15)).await.unwrap();
    assert_eq!(outcome.legs.len(), 1);

    let leg = &outcome.legs[0];
    assert_eq!(leg.source.id, source.id);
    assert_eq!(leg.source.qty.available, 25);
    assert_eq!(leg.destination.location_code, "L2");
    assert_eq!(leg.destination.qa_status, "A");
    assert_eq!(leg.destination.qty.available, 15);
    assert_eq!(leg.destination.transfer_from.as_deref(), Some(source.id.as_str()));

    let entries = db.ledger().list_by_group(&outcome.group_id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.ref_type == MovementRefType::Transfer));
    assert_eq!(entries[0].counterpart_line_id.as_deref(), Some(entries[1].line_id.as_str()));
    assert_eq!(entries[1].counterpart_line_id.as_deref(), Some(entries[0].line_id.as_str()));
}

#[tokio::test]
async fn transfer_conserves_origin_on_both_sides() {
    let db = setup().await;
    let source = db.putaway().commit(&scan("S1", "L1", "Y", "LOT-1", 40, "2024-01-01")).await.unwrap();
    let dest = db.putaway().commit(&scan("S2", "L2", "Y", "LOT-1", 5, "2024-01-01")).await.unwrap();
    let total_before = db.inventory().stock_summary("Y", WHS).await.unwrap().onhand;

    let outcome = db
        .transfers()
        .move_by_line_id(&TransferByLine {
            ref_id: "MV-1".to_string(),
            line_id: source.id.clone(),
            from_whs: WHS.to_string(),
            from_location: "L1".to_string(),
            to_location: "L2".to_string(),
            to_qa_status: None,
            qty: 15,
            actor: "mover".to_string(),
            reason: None,
        })
        .await
        .unwrap();

    let leg = &outcome.legs[0];
    assert_eq!(leg.destination.id, dest.id);
    assert_eq!(source.qty.origin - 15, leg.source.qty.origin);
    assert_eq!(leg.destination.qty.origin - dest.qty.origin, 15);
    assert_eq!(db.inventory().stock_summary("Y", WHS).await.unwrap().onhand, total_before);

    assert_ledger_consistent(&db).await;
}

#[tokio::test]
async fn transfer_rejects_stale_source_location() {
    let db = setup().await;
    let source = db.putaway().commit(&scan("S1", "L1", "Y", "LOT-1", 40, "2024-01-01")).await.unwrap();

    let err = db
        .transfers()
        .move_by_line_id(&TransferByLine {
            ref_id: "MV-1".to_string(),
            line_id: source.id.clone(),
            from_whs: WHS.to_string(),
            from_location: "L3".to_string(),
            to_location: "L2".to_string(),
            to_qa_status: None,
            qty: 5,
            actor: "mover".to_string(),
            reason: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err.as_domain(), Some(CoreError::LocationMismatch { .. })));
    assert_eq!(db.inventory().get_line(&source.id).await.unwrap().qty, source.qty);
}

// =============================================================================
// Putaway
// =============================================================================

#[tokio::test]
async fn putaway_merges_same_lot_and_splits_new_lot() {
    let db = setup().await;
    let first = db.putaway().commit(&scan("S1", "L1", "Z", "LOT-1", 10, "2024-01-01")).await.unwrap();

    let merged = db.putaway().commit(&scan("S2", "L1", "Z", "LOT-1", 6, "2024-01-01")).await.unwrap();
    assert_eq!(merged.id, first.id);
    assert_eq!(merged.qty.onhand, 16);

    let split = db.putaway().commit(&scan("S3", "L1", "Z", "LOT-2", 4, "2024-01-01")).await.unwrap();
    assert_ne!(split.id, first.id);

    let at_l1 = db.inventory().list_by_location(WHS, "L1").await.unwrap();
    assert_eq!(at_l1.len(), 2);
    assert_ledger_consistent(&db).await;
}

#[tokio::test]
async fn unregistered_location_fails_only_its_scan() {
    let db = setup().await;
    let results = db
        .putaway()
        .commit_batch(&[
            scan("S1", "L1", "Z", "LOT-1", 10, "2024-01-01"),
            scan("S2", "DOCK-9", "Z", "LOT-1", 10, "2024-01-01"),
        ])
        .await;

    assert!(results[0].is_ok());
    match &results[1] {
        Err(err) => assert!(matches!(err.as_domain(), Some(CoreError::LocationNotRegistered { .. }))),
        Ok(line) => panic!("scan into unknown location committed line {}", line.id),
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_allocations_never_overcommit() {
    let path = std::env::temp_dir().join(format!("depot-race-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(path.clone()).max_connections(4)).await.unwrap();
    db.locations().register(WHS, "L1").await.unwrap();
    db.putaway().commit(&scan("S1", "L1", "X", "LOT-1", 30, "2024-01-01")).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..8 {
        let engine = db.allocation();
        handles.push(tokio::spawn(async move {
            engine.allocate(&demand(&format!("SO-{n}"), "X", 7)).await
        }));
    }

    let mut reserved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(picks) => reserved += picks.iter().map(|p| p.qty).sum::<i64>(),
            Err(DbError::ConcurrencyConflict(_)) => {}
            Err(err) => assert!(
                matches!(err.as_domain(), Some(CoreError::InsufficientStock { .. })),
                "unexpected error: {err}"
            ),
        }
    }

    let summary = db.inventory().stock_summary("X", WHS).await.unwrap();
    assert!(reserved > 0, "no allocation got through");
    assert!(reserved <= 30);
    assert_eq!(summary.allocated, reserved);
    assert_eq!(summary.available, 30 - reserved);

    db.close().await;
    let _ = std::fs::remove_file(&path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_putaways_get_distinct_inventory_numbers() {
    let path = std::env::temp_dir().join(format!("depot-numbers-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(path.clone()).max_connections(4)).await.unwrap();
    for loc in LOCATIONS {
        db.locations().register(WHS, loc).await.unwrap();
    }

    let mut handles = Vec::new();
    for n in 0..12 {
        let committer = db.putaway();
        let req = scan(&format!("S{n}"), LOCATIONS[n % LOCATIONS.len()], "X", &format!("LOT-{n}"), 5, "2024-01-01");
        handles.push(tokio::spawn(async move { committer.commit(&req).await }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(line) => numbers.push(line.inventory_no),
            Err(DbError::ConcurrencyConflict(_)) => {}
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert!(!numbers.is_empty(), "no putaway got through");
    numbers.sort_unstable();
    let expected: Vec<i64> = (1..=numbers.len() as i64).collect();
    assert_eq!(numbers, expected);

    let summary = db.inventory().stock_summary("X", WHS).await.unwrap();
    assert_eq!(summary.lines, numbers.len() as i64);
    assert_eq!(summary.onhand, 5 * numbers.len() as i64);

    db.close().await;
    let _ = std::fs::remove_file(&path);
}
