//! # Seed Data Generator
//!
//! Populates a demo warehouse for development: registers locations, runs a
//! batch of receipts through putaway, allocates a few sample orders and
//! prints the resulting stock as JSON.
//!
//! ## Usage
//! ```bash
//! # 200 receipts into warehouse W1 (default)
//! cargo run -p depot-db --bin seed
//!
//! # Custom amount and database
//! cargo run -p depot-db --bin seed -- --receipts 1000 --db ./data/depot.db
//!
//! # See every ledger write
//! RUST_LOG=depot_db=debug cargo run -p depot-db --bin seed
//! ```
//!
//! Other settings (pool size, default policy) come from the `DEPOT_*`
//! environment variables, see [`EngineConfig`].

use chrono::{Duration, NaiveDate};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use depot_core::{AllocationRequest, PutawayRequest, DEFAULT_OWNER_CODE, DEFAULT_QA_STATUS};
use depot_db::{Database, EngineConfig};

const WAREHOUSE: &str = "W1";
const AISLES: &[&str] = &["A", "B", "C", "D"];
const BAYS_PER_AISLE: usize = 5;
const ITEMS: &[(&str, &str)] = &[
    ("ITEM-001", "Bottled water 500ml"),
    ("ITEM-002", "Instant noodles"),
    ("ITEM-003", "Canned tuna"),
    ("ITEM-004", "Rice 5kg"),
    ("ITEM-005", "Cooking oil 1L"),
    ("ITEM-006", "Dish soap"),
    ("ITEM-007", "Paper towels"),
    ("ITEM-008", "Coffee 200g"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,depot_db=info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = EngineConfig::load()?;
    let mut receipts: usize = 200;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--receipts" | "-n" => {
                if i + 1 < args.len() {
                    receipts = args[i + 1].parse().unwrap_or(receipts);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Depot Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --receipts <N>  Number of receipts to put away (default: 200)");
                println!("  -d, --db <PATH>     Database file path (default: $DEPOT_DATABASE_PATH or ./depot.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %config.database_path.display(), receipts, "Seeding demo warehouse");
    let db = Database::from_engine_config(&config).await?;

    let existing = db.inventory().warehouse_summary(WAREHOUSE).await?;
    if !existing.is_empty() {
        warn!(items = existing.len(), "Warehouse already has stock, skipping seed");
        return Ok(());
    }

    let locations = location_codes();
    for code in &locations {
        db.locations().register(WAREHOUSE, code).await?;
    }
    info!(count = locations.len(), "Locations registered");

    let start = std::time::Instant::now();
    let requests: Vec<PutawayRequest> = (0..receipts).map(|n| receipt(n, &locations)).collect();
    let results = db.putaway().commit_batch(&requests).await;
    let committed = results.iter().filter(|r| r.is_ok()).count();
    info!(
        committed,
        failed = results.len() - committed,
        elapsed = ?start.elapsed(),
        "Receipts committed"
    );

    for (n, (item_id, _)) in ITEMS.iter().enumerate().step_by(2) {
        let demand = AllocationRequest {
            order_ref: format!("SO-{:04}", n + 1),
            owner_code: DEFAULT_OWNER_CODE.to_string(),
            item_id: item_id.to_string(),
            whs_code: WAREHOUSE.to_string(),
            qty: 25,
            actor: "seed".to_string(),
        };
        match db.allocation().allocate(&demand).await {
            Ok(picks) => info!(order = %demand.order_ref, lines = picks.len(), "Sample order allocated"),
            Err(err) => warn!(order = %demand.order_ref, error = %err, "Sample order not allocated"),
        }
    }

    let summary = db.inventory().warehouse_summary(WAREHOUSE).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    db.close().await;
    Ok(())
}

fn location_codes() -> Vec<String> {
    AISLES
        .iter()
        .flat_map(|aisle| (1..=BAYS_PER_AISLE).map(move |bay| format!("{aisle}-{bay:02}")))
        .collect()
}

/// Receipt `n`: items round-robin, one receipt date per day, a lot per week.
fn receipt(n: usize, locations: &[String]) -> PutawayRequest {
    let (item_id, _name) = ITEMS[n % ITEMS.len()];
    let day = (n / ITEMS.len()) as i64;
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let rec_date = base + Duration::days(day);

    PutawayRequest {
        scan_id: format!("SCAN-{:06}", n + 1),
        owner_code: DEFAULT_OWNER_CODE.to_string(),
        whs_code: WAREHOUSE.to_string(),
        location_code: locations[n % locations.len()].clone(),
        pallet_id: format!("PLT-{:05}", n / 4),
        item_id: item_id.to_string(),
        item_code: item_id.to_string(),
        barcode: format!("885{:010}", n % ITEMS.len()),
        uom: "EA".to_string(),
        lot_no: format!("LOT-{:03}", day / 7),
        qa_status: DEFAULT_QA_STATUS.to_string(),
        rec_date,
        prod_date: Some(rec_date - Duration::days(30)),
        exp_date: Some(rec_date + Duration::days(365)),
        qty: 10 + (n % 7) as i64 * 5,
        actor: "seed".to_string(),
    }
}
