//! Reservation transaction types
//!
//! A transaction links one request to the listings supplying it and
//! carries the reservation through the pending → approved/declined
//! lifecycle. It records *per-listing* consumed quantities so a decline
//! can hand back exactly what each listing contributed.

use crate::ids::{Category, ListingId, RequestId, TransactionId, UserId};
use crate::quantity::Quantity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Awaiting coordinator review
    Pending,
    /// Reservation finalized (terminal)
    Approved,
    /// Reservation reversed (terminal)
    Declined,
}

impl TransactionStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Approved | TransactionStatus::Declined)
    }
}

/// Quantity drawn from a single listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub listing_id: ListingId,
    pub quantity: Quantity,
}

/// A reservation linking a request to one or more supplying listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub request_id: RequestId,
    /// One entry per supplying listing, in allocation order
    pub allocations: Vec<Allocation>,
    /// Total reserved quantity, equal to the sum over `allocations`
    pub quantity: Quantity,
    /// Copied from the request at creation
    pub category: Category,
    pub status: TransactionStatus,
    /// Admin who approved or declined the reservation
    pub reviewed_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set on approval
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Create a new pending transaction from an allocation set
    ///
    /// # Panics
    /// Panics if `allocations` is empty or contains a zero quantity
    pub fn new(
        request_id: RequestId,
        allocations: Vec<Allocation>,
        category: Category,
        timestamp: DateTime<Utc>,
    ) -> Self {
        assert!(
            !allocations.is_empty(),
            "Transaction requires at least one allocation"
        );
        assert!(
            allocations.iter().all(|a| !a.quantity.is_zero()),
            "Allocations must have non-zero quantity"
        );

        let quantity = allocations.iter().map(|a| a.quantity).sum();

        Self {
            transaction_id: TransactionId::new(),
            request_id,
            allocations,
            quantity,
            category,
            status: TransactionStatus::Pending,
            reviewed_by: None,
            created_at: timestamp,
            updated_at: timestamp,
            completed_at: None,
        }
    }

    /// Sum over the allocations equals the transaction quantity
    pub fn allocation_invariant(&self) -> bool {
        self.allocations.iter().map(|a| a.quantity).sum::<Quantity>() == self.quantity
    }

    /// Finalize the reservation
    ///
    /// # Panics
    /// Panics if the transaction is not pending
    pub fn approve(&mut self, admin_id: UserId, timestamp: DateTime<Utc>) {
        assert_eq!(
            self.status,
            TransactionStatus::Pending,
            "Cannot approve a non-pending transaction"
        );

        self.status = TransactionStatus::Approved;
        self.reviewed_by = Some(admin_id);
        self.completed_at = Some(timestamp);
        self.updated_at = timestamp;
    }

    /// Reverse the reservation
    ///
    /// # Panics
    /// Panics if the transaction is not pending
    pub fn decline(&mut self, admin_id: UserId, timestamp: DateTime<Utc>) {
        assert_eq!(
            self.status,
            TransactionStatus::Pending,
            "Cannot decline a non-pending transaction"
        );

        self.status = TransactionStatus::Declined;
        self.reviewed_by = Some(admin_id);
        self.updated_at = timestamp;
    }
}
