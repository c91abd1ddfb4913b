//! # depot-core: Pure Inventory Logic for Depot
//!
//! Quantity bookkeeping rules of the inventory ledger & allocation engine,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depot Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │     Receiving • Picking • Relocation • Stock-take workflows     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               depot-db (engine + SQLite ledger)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ depot-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ quantity  │  │allocation │  │  putaway  │  │ transfer  │  │   │
//! │  │   │ counters  │  │ FIFO/FEFO │  │ merge key │  │ requests  │  │   │
//! │  │   │ deltas    │  │ planning  │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Inventory lines, ledger entries, pick assignments, enums
//! - [`quantity`] - Counters, deltas and the one place they are combined
//! - [`allocation`] - Candidate ordering and pick planning
//! - [`putaway`] - Scanned receipts and the merge key
//! - [`transfer`] - Transfer requests and outcomes
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation
//!
//! ## Example Usage
//!
//! ```rust
//! use depot_core::quantity::{Quantities, QuantityDelta};
//!
//! let line = Quantities::received(50);
//! let after = line.apply("line-1", &QuantityDelta::allocate(30)).unwrap();
//!
//! assert_eq!(after.available, 20);
//! assert_eq!(after.allocated, 30);
//! assert!(after.is_balanced());
//!
//! // Over-allocation is refused, the counters never go negative
//! assert!(after.apply("line-1", &QuantityDelta::allocate(21)).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod error;
pub mod putaway;
pub mod quantity;
pub mod transfer;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocation::{AllocationRequest, PlannedPick, ShipConfirmation};
pub use error::{CoreError, CoreResult, ValidationError};
pub use putaway::{MergeKey, PutawayRequest};
pub use quantity::{Counter, Quantities, QuantityDelta};
pub use transfer::{TransferByAvailable, TransferByLine, TransferLeg, TransferOutcome};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Owner code used when the deployment is single-owner.
pub const DEFAULT_OWNER_CODE: &str = "DEFAULT";

/// QA status of freely usable stock.
pub const DEFAULT_QA_STATUS: &str = "A";

/// Largest quantity a single movement may carry.
///
/// ## Business Reason
/// Catches scanner double-reads and typos (100000 instead of 100) before
/// they reach the ledger.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000;
