//! # Quantity State
//!
//! The five live counters of an inventory line plus the as-received baseline,
//! and the signed deltas that move them.
//!
//! ## Counter Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Inventory Line Counters                            │
//! │                                                                         │
//! │   origin   ── as-received baseline (moves only with transfer legs)     │
//! │                                                                         │
//! │   onhand ═══╦══ available  ── free to allocate                         │
//! │             ╠══ allocated  ── reserved for an outbound order           │
//! │             ╚══ suspended  ── blocked (QA hold)                        │
//! │                                                                         │
//! │   shipped  ── cumulative departed (ship: allocated,onhand ↓ shipped ↑) │
//! │                                                                         │
//! │   INVARIANT: onhand = available + allocated + suspended                │
//! │              no counter is ever negative                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Quantities::apply`] is the only function that produces new counter
//! values. Every mutation path in depot-db goes through it, and the ledger
//! row written next to the mutation carries the very same [`QuantityDelta`].

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::MAX_MOVEMENT_QUANTITY;

// =============================================================================
// Counter
// =============================================================================

/// Names one counter, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Origin,
    Onhand,
    Available,
    Allocated,
    Suspended,
    Shipped,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Counter::Origin => "origin",
            Counter::Onhand => "onhand",
            Counter::Available => "available",
            Counter::Allocated => "allocated",
            Counter::Suspended => "suspended",
            Counter::Shipped => "shipped",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Quantities
// =============================================================================

/// Absolute counter values of one inventory line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Quantities {
    pub origin: i64,
    pub onhand: i64,
    pub available: i64,
    pub allocated: i64,
    pub suspended: i64,
    pub shipped: i64,
}

impl Quantities {
    /// Counters of a freshly received line.
    pub fn received(qty: i64) -> Self {
        Quantities {
            origin: qty,
            onhand: qty,
            available: qty,
            ..Quantities::default()
        }
    }

    /// Returns the counters after applying `delta`.
    ///
    /// ## Errors
    /// * `InsufficientQuantity` - a counter would drop below zero
    /// * `InvariantViolation` - the delta is unbalanced
    ///   (`Δonhand ≠ Δavailable + Δallocated + Δsuspended`)
    /// * `Validation` - a counter would overflow `i64`
    pub fn apply(&self, line_id: &str, delta: &QuantityDelta) -> CoreResult<Quantities> {
        let next = Quantities {
            origin: add_counter(Counter::Origin, self.origin, delta.origin)?,
            onhand: add_counter(Counter::Onhand, self.onhand, delta.onhand)?,
            available: add_counter(Counter::Available, self.available, delta.available)?,
            allocated: add_counter(Counter::Allocated, self.allocated, delta.allocated)?,
            suspended: add_counter(Counter::Suspended, self.suspended, delta.suspended)?,
            shipped: add_counter(Counter::Shipped, self.shipped, delta.shipped)?,
        };

        // Report the first counter that goes negative, bucket counters first
        // so the message names the one the caller was actually drawing from.
        let checks = [
            (Counter::Available, self.available, delta.available, next.available),
            (Counter::Allocated, self.allocated, delta.allocated, next.allocated),
            (Counter::Suspended, self.suspended, delta.suspended, next.suspended),
            (Counter::Onhand, self.onhand, delta.onhand, next.onhand),
            (Counter::Origin, self.origin, delta.origin, next.origin),
            (Counter::Shipped, self.shipped, delta.shipped, next.shipped),
        ];
        for (counter, current, change, after) in checks {
            if after < 0 {
                return Err(CoreError::InsufficientQuantity {
                    line_id: line_id.to_string(),
                    counter,
                    current,
                    requested: -change,
                });
            }
        }

        if !next.is_balanced() {
            return Err(CoreError::InvariantViolation {
                line_id: line_id.to_string(),
                detail: format!(
                    "onhand {} != available {} + allocated {} + suspended {}",
                    next.onhand, next.available, next.allocated, next.suspended
                ),
            });
        }

        Ok(next)
    }

    /// Checks `onhand = available + allocated + suspended`.
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.onhand == self.available + self.allocated + self.suspended
    }

    /// Checks that no counter is negative.
    pub fn is_non_negative(&self) -> bool {
        [
            self.origin,
            self.onhand,
            self.available,
            self.allocated,
            self.suspended,
            self.shipped,
        ]
        .iter()
        .all(|v| *v >= 0)
    }
}

fn add_counter(counter: Counter, current: i64, change: i64) -> CoreResult<i64> {
    current.checked_add(change).ok_or_else(|| {
        ValidationError::InvalidFormat {
            field: counter.to_string(),
            reason: format!("{current} + {change} overflows"),
        }
        .into()
    })
}

// =============================================================================
// Quantity Delta
// =============================================================================

/// Signed change to each counter.
///
/// Deltas are what the movement ledger stores; summing every delta recorded
/// against a line reproduces its current [`Quantities`] (lines start at zero
/// and their creating ledger entry carries the received quantity).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct QuantityDelta {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "delta_origin"))]
    pub origin: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "delta_onhand"))]
    pub onhand: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "delta_available"))]
    pub available: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "delta_allocated"))]
    pub allocated: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "delta_suspended"))]
    pub suspended: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "delta_shipped"))]
    pub shipped: i64,
}

impl QuantityDelta {
    /// Stock arriving on a new line or a transfer destination leg.
    pub fn receive(qty: i64) -> Self {
        QuantityDelta {
            origin: qty,
            onhand: qty,
            available: qty,
            ..QuantityDelta::default()
        }
    }

    /// Stock leaving a transfer source; the source baseline shrinks too.
    pub fn transfer_out(qty: i64) -> Self {
        -QuantityDelta::receive(qty)
    }

    /// available → allocated
    pub fn allocate(qty: i64) -> Self {
        QuantityDelta {
            available: -qty,
            allocated: qty,
            ..QuantityDelta::default()
        }
    }

    /// allocated → available
    pub fn release(qty: i64) -> Self {
        -QuantityDelta::allocate(qty)
    }

    /// allocated, onhand → shipped
    pub fn ship(qty: i64) -> Self {
        QuantityDelta {
            onhand: -qty,
            allocated: -qty,
            shipped: qty,
            ..QuantityDelta::default()
        }
    }

    /// available → suspended
    pub fn hold(qty: i64) -> Self {
        QuantityDelta {
            available: -qty,
            suspended: qty,
            ..QuantityDelta::default()
        }
    }

    /// suspended → available
    pub fn release_hold(qty: i64) -> Self {
        -QuantityDelta::hold(qty)
    }

    /// Count correction: onhand and available move together, baseline stays.
    pub fn count_correction(diff: i64) -> Self {
        QuantityDelta {
            onhand: diff,
            available: diff,
            ..QuantityDelta::default()
        }
    }

    /// Receipt merged into a line that already exists.
    ///
    /// Origin records what the line was created with, so only onhand and
    /// available grow.
    pub fn top_up(qty: i64) -> Self {
        QuantityDelta::count_correction(qty)
    }

    /// True when no counter changes.
    pub fn is_zero(&self) -> bool {
        *self == QuantityDelta::default()
    }

    /// Checks a hand-entered correction.
    ///
    /// Origin moves only with transfer legs and shipped only with shipments,
    /// so a correction may touch neither. No counter may move by more than
    /// [`MAX_MOVEMENT_QUANTITY`].
    pub fn validate_correction(&self) -> CoreResult<()> {
        for (counter, change) in [(Counter::Origin, self.origin), (Counter::Shipped, self.shipped)] {
            if change != 0 {
                return Err(ValidationError::InvalidFormat {
                    field: counter.to_string(),
                    reason: "cannot be corrected by hand".to_string(),
                }
                .into());
            }
        }

        let changes = [
            (Counter::Onhand, self.onhand),
            (Counter::Available, self.available),
            (Counter::Allocated, self.allocated),
            (Counter::Suspended, self.suspended),
        ];
        for (counter, change) in changes {
            if change.unsigned_abs() > MAX_MOVEMENT_QUANTITY.unsigned_abs() {
                return Err(ValidationError::OutOfRange {
                    field: counter.to_string(),
                    min: -MAX_MOVEMENT_QUANTITY,
                    max: MAX_MOVEMENT_QUANTITY,
                }
                .into());
            }
        }
        Ok(())
    }
}

impl Neg for QuantityDelta {
    type Output = QuantityDelta;

    fn neg(self) -> Self::Output {
        QuantityDelta {
            origin: -self.origin,
            onhand: -self.onhand,
            available: -self.available,
            allocated: -self.allocated,
            suspended: -self.suspended,
            shipped: -self.shipped,
        }
    }
}

impl Add for QuantityDelta {
    type Output = QuantityDelta;

    fn add(self, rhs: Self) -> Self::Output {
        QuantityDelta {
            origin: self.origin + rhs.origin,
            onhand: self.onhand + rhs.onhand,
            available: self.available + rhs.available,
            allocated: self.allocated + rhs.allocated,
            suspended: self.suspended + rhs.suspended,
            shipped: self.shipped + rhs.shipped,
        }
    }
}

impl Sum for QuantityDelta {
    fn sum<I: Iterator<Item = QuantityDelta>>(iter: I) -> Self {
        iter.fold(QuantityDelta::default(), |acc, d| acc + d)
    }
}

impl From<Quantities> for QuantityDelta {
    /// The delta that takes a zeroed line to `q`.
    fn from(q: Quantities) -> Self {
        QuantityDelta {
            origin: q.origin,
            onhand: q.onhand,
            available: q.available,
            allocated: q.allocated,
            suspended: q.suspended,
            shipped: q.shipped,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_then_ship_keeps_balance() {
        let q = Quantities::received(50);
        let q = q.apply("L1", &QuantityDelta::allocate(30)).unwrap();
        assert_eq!((q.available, q.allocated), (20, 30));

        let q = q.apply("L1", &QuantityDelta::ship(25)).unwrap();
        assert_eq!(q.onhand, 25);
        assert_eq!(q.allocated, 5);
        assert_eq!(q.shipped, 25);
        assert_eq!(q.origin, 50);
        assert!(q.is_balanced());
    }

    #[test]
    fn test_over_allocation_rejected() {
        let q = Quantities::received(10);
        let err = q.apply("L1", &QuantityDelta::allocate(11)).unwrap_err();
        match err {
            CoreError::InsufficientQuantity {
                counter,
                current,
                requested,
                ..
            } => {
                assert_eq!(counter, Counter::Available);
                assert_eq!(current, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_delta_rejected() {
        let q = Quantities::received(10);
        let delta = QuantityDelta {
            onhand: -1,
            ..QuantityDelta::default()
        };
        let err = q.apply("L1", &delta).unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolation { .. }));
    }

    #[test]
    fn test_hold_and_release_hold() {
        let q = Quantities::received(10)
            .apply("L1", &QuantityDelta::hold(4))
            .unwrap();
        assert_eq!((q.available, q.suspended, q.onhand), (6, 4, 10));

        let err = q.apply("L1", &QuantityDelta::release_hold(5)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientQuantity {
                counter: Counter::Suspended,
                ..
            }
        ));
    }

    #[test]
    fn test_transfer_out_shrinks_origin() {
        let q = Quantities::received(40)
            .apply("L1", &QuantityDelta::transfer_out(15))
            .unwrap();
        assert_eq!(q.origin, 25);
        assert_eq!(q.onhand, 25);
        assert_eq!(q.available, 25);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let q = Quantities::received(10);
        let delta = QuantityDelta {
            origin: i64::MAX,
            ..QuantityDelta::default()
        };
        let err = q.apply("L1", &delta).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn test_correction_limits() {
        assert!(QuantityDelta::count_correction(-3).validate_correction().is_ok());
        assert!(QuantityDelta::hold(MAX_MOVEMENT_QUANTITY).validate_correction().is_ok());

        let baseline = QuantityDelta {
            origin: 500,
            ..QuantityDelta::default()
        };
        assert!(baseline.validate_correction().is_err());

        let shipped = QuantityDelta {
            shipped: 7,
            ..QuantityDelta::default()
        };
        assert!(shipped.validate_correction().is_err());

        let huge = QuantityDelta::count_correction(MAX_MOVEMENT_QUANTITY + 1);
        assert!(matches!(
            huge.validate_correction(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_deltas_sum_to_state() {
        let deltas = [
            QuantityDelta::receive(50),
            QuantityDelta::allocate(20),
            QuantityDelta::ship(15),
            QuantityDelta::release(5),
            QuantityDelta::hold(3),
        ];

        let mut q = Quantities::default();
        for d in &deltas {
            q = q.apply("L1", d).unwrap();
        }

        let total: QuantityDelta = deltas.iter().copied().sum();
        assert_eq!(total, QuantityDelta::from(q));
    }
}
