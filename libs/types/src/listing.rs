//! Donor listing lifecycle types

use crate::ids::{Category, ListingId, TransactionId, UserId};
use crate::quantity::Quantity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing status
///
/// A listing is never deleted; once its supply is spoken for and the
/// reservation is approved it becomes `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    /// Accepting reservations
    Active,
    /// Supply exhausted and finalized
    Completed,
}

/// A donor's offer of a quantity of items in a category
///
/// Quantity fields move in lockstep: `available` is decremented by a
/// reservation and `claimed` incremented by the same amount, so
/// `available + claimed` is constant over the listing's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub listing_id: ListingId,
    pub donor_id: UserId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub available: Quantity,
    pub claimed: Quantity,
    pub status: ListingStatus,
    /// Transactions this listing supplies
    pub transactions: Vec<TransactionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new active listing with nothing claimed yet
    pub fn new(
        donor_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        available: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            listing_id: ListingId::new(),
            donor_id,
            title: title.into(),
            description: description.into(),
            category,
            available,
            claimed: Quantity::zero(),
            status: ListingStatus::Active,
            transactions: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Total supply the listing was created with
    pub fn total_supply(&self) -> Quantity {
        self.available + self.claimed
    }

    /// Check if all supply has been claimed
    pub fn is_exhausted(&self) -> bool {
        self.available.is_zero()
    }

    /// Move `quantity` from available to claimed
    ///
    /// # Panics
    /// Panics if the reservation exceeds the available quantity
    pub fn reserve(&mut self, quantity: Quantity, timestamp: DateTime<Utc>) {
        assert!(
            quantity <= self.available,
            "Reservation would exceed available quantity"
        );

        self.available -= quantity;
        self.claimed += quantity;
        self.updated_at = timestamp;
    }

    /// Exact inverse of [`reserve`](Self::reserve): move `quantity` back
    /// from claimed to available and reopen the listing
    ///
    /// # Panics
    /// Panics if the release exceeds the claimed quantity
    pub fn release(&mut self, quantity: Quantity, timestamp: DateTime<Utc>) {
        assert!(
            quantity <= self.claimed,
            "Release would exceed claimed quantity"
        );

        self.claimed -= quantity;
        self.available += quantity;
        self.status = ListingStatus::Active;
        self.updated_at = timestamp;
    }

    /// Flip to `Completed` if the supply is exhausted
    ///
    /// Called on approval; the status flip is deferred until then so a
    /// pending reservation can still be declined and reopened.
    pub fn mark_completed_if_exhausted(&mut self, timestamp: DateTime<Utc>) -> bool {
        if self.is_exhausted() && self.status != ListingStatus::Completed {
            self.status = ListingStatus::Completed;
            self.updated_at = timestamp;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 17, 10, 0, 0).unwrap()
    }

    fn listing(available: u32) -> Listing {
        Listing::new(
            UserId::new(),
            "Winter jackets",
            "Gently used, assorted sizes",
            Category::new("clothing"),
            Quantity::new(available),
            ts(),
        )
    }

    #[test]
    fn test_listing_creation() {
        let listing = listing(10);

        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.available, Quantity::new(10));
        assert_eq!(listing.claimed, Quantity::zero());
        assert!(listing.transactions.is_empty());
    }

    #[test]
    fn test_reserve_moves_available_to_claimed() {
        let mut listing = listing(10);
        let before = listing.total_supply();

        listing.reserve(Quantity::new(4), ts());

        assert_eq!(listing.available, Quantity::new(6));
        assert_eq!(listing.claimed, Quantity::new(4));
        assert_eq!(listing.total_supply(), before);
        // status only flips on approval
        assert_eq!(listing.status, ListingStatus::Active);
    }

    #[test]
    #[should_panic(expected = "Reservation would exceed available quantity")]
    fn test_overreserve_panics() {
        let mut listing = listing(3);
        listing.reserve(Quantity::new(4), ts());
    }

    #[test]
    fn test_release_is_exact_inverse_of_reserve() {
        let mut listing = listing(10);
        let snapshot = listing.clone();

        listing.reserve(Quantity::new(7), ts());
        listing.release(Quantity::new(7), ts());

        assert_eq!(listing.available, snapshot.available);
        assert_eq!(listing.claimed, snapshot.claimed);
        assert_eq!(listing.status, snapshot.status);
    }

    #[test]
    #[should_panic(expected = "Release would exceed claimed quantity")]
    fn test_overrelease_panics() {
        let mut listing = listing(10);
        listing.reserve(Quantity::new(2), ts());
        listing.release(Quantity::new(3), ts());
    }

    #[test]
    fn test_mark_completed_only_when_exhausted() {
        let mut listing = listing(5);

        listing.reserve(Quantity::new(3), ts());
        assert!(!listing.mark_completed_if_exhausted(ts()));
        assert_eq!(listing.status, ListingStatus::Active);

        listing.reserve(Quantity::new(2), ts());
        assert!(listing.mark_completed_if_exhausted(ts()));
        assert_eq!(listing.status, ListingStatus::Completed);

        // already completed, no second flip
        assert!(!listing.mark_completed_if_exhausted(ts()));
    }

    #[test]
    fn test_release_reopens_completed_listing() {
        let mut listing = listing(5);
        listing.reserve(Quantity::new(5), ts());
        listing.mark_completed_if_exhausted(ts());

        listing.release(Quantity::new(5), ts());

        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.available, Quantity::new(5));
    }

    #[test]
    fn test_listing_serialization() {
        let listing = listing(10);
        let json = serde_json::to_string(&listing).unwrap();
        assert!(json.contains("\"active\""));

        let deserialized: Listing = serde_json::from_str(&json).unwrap();
        assert_eq!(listing, deserialized);
    }
}
