//! # depot-db: Ledger Store & Engine for Depot
//!
//! SQLite persistence for inventory lines and the movement ledger, and the
//! transactional engine operations built on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot Data Flow                                  │
//! │                                                                         │
//! │  Receiving / picking / relocation workflow                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     depot-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Engines    │    │  Repositories │    │  Database    │  │   │
//! │  │   │  (engine/)    │───►│ (repository/) │───►│  (pool.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Allocation    │    │ inventory     │    │ SqlitePool   │  │   │
//! │  │   │ Putaway       │    │ ledger        │    │ WAL, FKs     │  │   │
//! │  │   │ Transfer      │    │ picking       │    │ migrations   │  │   │
//! │  │   │ Adjustment    │    │ location      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │          │                                                      │   │
//! │  │          └── counter math & planning: depot-core                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration and policy defaults
//! - [`pool`] - Connection pool creation and the [`Database`] handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table SQL
//! - [`engine`] - Allocation, putaway, transfer and adjustment workflows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use depot_db::{Database, EngineConfig};
//!
//! let db = Database::from_engine_config(&EngineConfig::load()?).await?;
//!
//! db.locations().register("W1", "A-01").await?;
//! let line = db.putaway().commit(&scan).await?;
//! let picks = db.allocation().allocate(&demand).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig, EngineSettings};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Engine and repository re-exports for convenience
pub use engine::adjustment::{Adjustment, AdjustmentEngine};
pub use engine::allocation::AllocationEngine;
pub use engine::putaway::PutawayCommitter;
pub use engine::transfer::TransferOperator;
pub use repository::inventory::{InventoryRepository, NewLine};
pub use repository::ledger::LedgerRepository;
pub use repository::location::LocationRepository;
pub use repository::picking::PickRepository;
pub use repository::policy::PolicyRepository;
