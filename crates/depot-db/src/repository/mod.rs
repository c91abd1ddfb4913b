//! # Repository Module
//!
//! SQL for each table, kept in one place per table.
//!
//! ## Two Entry Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Engines (inside a transaction)        Readers (pool)                  │
//! │       │                                     │                           │
//! │       │  inventory::mutate_quantities(      │  db.inventory()           │
//! │       │      &mut tx, id, &delta, ..)       │    .stock_summary(..)     │
//! │       ▼                                     ▼                           │
//! │  free functions taking               XxxRepository { pool }            │
//! │  &mut SqliteConnection  ◄───────────  acquires a connection and        │
//! │                                      calls the same functions          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`inventory`] - Inventory record store (lines and counters)
//! - [`ledger`] - Append-only movement ledger
//! - [`picking`] - Pick assignments
//! - [`location`] - Location master lookup
//! - [`policy`] - Per-owner inventory policy

pub mod inventory;
pub mod ledger;
pub mod location;
pub mod picking;
pub mod policy;
