//! Greedy oldest-first allocation planning
//!
//! Pure planning logic: given the quantity a request still needs and the
//! available supply in scan order, decide how much to draw from each
//! listing. Planning never touches the store, so the all-or-nothing
//! guarantee falls out for free: a shortfall is detected before anything
//! is committed.

use thiserror::Error;
use types::ids::ListingId;
use types::quantity::Quantity;
use types::transaction::Allocation;

/// Result of a successful planning pass
///
/// Allocations are in supply order and sum to exactly the needed
/// quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    pub allocations: Vec<Allocation>,
}

/// The scanned supply cannot fully cover the needed quantity
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("supply shortfall: only {available} available")]
pub struct Shortfall {
    /// Cumulative availability across the entire scanned supply
    pub available: Quantity,
}

/// Plan a reservation against supply given in oldest-first order
///
/// Walks the supply front to back, drawing `min(available, still
/// needed)` from each listing and stopping as soon as the need is
/// covered. Earlier (older) listings are always drained before later
/// ones are touched.
///
/// # Panics
/// Panics if `needed` is zero; callers gate on remaining quantity > 0.
pub fn plan(needed: Quantity, supply: &[(ListingId, Quantity)]) -> Result<AllocationPlan, Shortfall> {
    assert!(!needed.is_zero(), "Cannot plan a zero-quantity allocation");

    let mut outstanding = needed;
    let mut allocations = Vec::new();

    for &(listing_id, available) in supply {
        if outstanding.is_zero() {
            break;
        }
        if available.is_zero() {
            continue;
        }

        let used = available.min(outstanding);
        allocations.push(Allocation {
            listing_id,
            quantity: used,
        });
        outstanding -= used;
    }

    if outstanding.is_zero() {
        Ok(AllocationPlan { allocations })
    } else {
        let available = supply
            .iter()
            .fold(Quantity::zero(), |acc, &(_, qty)| acc.saturating_add(qty));
        Err(Shortfall { available })
    }
}
