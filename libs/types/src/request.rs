//! Receiver request lifecycle types

use crate::ids::{Category, RequestId, TransactionId, UserId};
use crate::quantity::Quantity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request status
///
/// `Active` requests are eligible for matching. A matched request sits
/// in `Pending` until a coordinator approves or declines the resulting
/// transaction; decline sends it back to `Active`, approval of a fully
/// satisfied request finalizes it as `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Eligible for matching
    Active,
    /// Matched, awaiting coordinator review
    Pending,
    /// Fully satisfied (terminal)
    Completed,
}

/// A receiver's ask for a quantity of items in a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub request_id: RequestId,
    pub receiver_id: UserId,
    pub title: String,
    pub description: String,
    /// Why the items are needed, shown to coordinators
    pub purpose: String,
    pub category: Category,
    /// Quantity originally asked for (immutable)
    pub requested: Quantity,
    /// Quantity still unmatched
    pub remaining: Quantity,
    pub status: RequestStatus,
    /// Transactions created to satisfy this request
    pub transactions: Vec<TransactionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// Create a new active request with nothing matched yet
    pub fn new(
        receiver_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        purpose: impl Into<String>,
        category: Category,
        quantity: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id: RequestId::new(),
            receiver_id,
            title: title.into(),
            description: description.into(),
            purpose: purpose.into(),
            category,
            requested: quantity,
            remaining: quantity,
            status: RequestStatus::Active,
            transactions: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Check if the request has been fully matched
    pub fn is_fulfilled(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Accounting balance: remaining plus the quantity reserved by live
    /// transactions must always equal the original ask
    pub fn balance_invariant(&self, reserved: Quantity) -> bool {
        self.remaining + reserved == self.requested
    }

    /// Deduct a matched quantity and park the request for review
    ///
    /// # Panics
    /// Panics if the deduction exceeds the remaining quantity
    pub fn reserve(&mut self, quantity: Quantity, timestamp: DateTime<Utc>) {
        assert!(
            quantity <= self.remaining,
            "Reservation would exceed remaining quantity"
        );

        self.remaining -= quantity;
        self.status = RequestStatus::Pending;
        self.updated_at = timestamp;
    }

    /// Exact inverse of [`reserve`](Self::reserve): restore a declined
    /// quantity and reopen the request for matching
    ///
    /// # Panics
    /// Panics if the restored remaining would exceed the original ask
    pub fn release(&mut self, quantity: Quantity, timestamp: DateTime<Utc>) {
        let restored = self.remaining + quantity;
        assert!(
            restored <= self.requested,
            "Release would exceed requested quantity"
        );

        self.remaining = restored;
        self.status = RequestStatus::Active;
        self.updated_at = timestamp;
    }

    /// Flip to `Completed` if nothing is left to match
    pub fn mark_completed_if_fulfilled(&mut self, timestamp: DateTime<Utc>) -> bool {
        if self.is_fulfilled() && self.status != RequestStatus::Completed {
            self.status = RequestStatus::Completed;
            self.updated_at = timestamp;
            true
        } else {
            false
        }
    }
}
