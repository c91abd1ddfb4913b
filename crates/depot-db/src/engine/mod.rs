//! # Engine Operations
//!
//! Every quantity-changing workflow: allocation, putaway, transfer and
//! adjustment. Each one is a single transaction that mutates counters
//! through [`inventory::mutate_quantities`](crate::repository::inventory::mutate_quantities)
//! and appends the matching ledger rows before it commits.
//!
//! ## Transaction Boundaries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  engine.op(&req)                     engine.op_in(&mut tx, &req)       │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  pool.acquire()                      caller's session                  │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │         conn.begin()  → BEGIN, or SAVEPOINT when nested                │
//! │                      │                                                  │
//! │         lock ─► read ─► plan ─► mutate + ledger ─► commit              │
//! │                      │                                                  │
//! │         any error: the transaction/savepoint is dropped → rolled back  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No engine retries a `ConcurrencyConflict`; callers decide.

pub mod adjustment;
pub mod allocation;
pub mod putaway;
pub mod transfer;
