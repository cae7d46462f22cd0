//! Error taxonomy for the coordination core
//!
//! Every failure is synchronous and reported to the caller immediately;
//! nothing is retried inside the core, and a failed operation is
//! guaranteed to have mutated nothing.

use crate::ids::{Category, ListingId, RequestId, TransactionId};
use crate::quantity::Quantity;
use crate::request::RequestStatus;
use crate::transaction::TransactionStatus;
use thiserror::Error;

/// Errors returned by the matching and lifecycle operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinationError {
    #[error("Request not found: {request_id}")]
    RequestNotFound { request_id: RequestId },

    #[error("Listing not found: {listing_id}")]
    ListingNotFound { listing_id: ListingId },

    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound { transaction_id: TransactionId },

    #[error("Request {request_id} is not matchable (status {status:?})")]
    RequestNotActive {
        request_id: RequestId,
        status: RequestStatus,
    },

    #[error("Transaction {transaction_id} is not pending (status {status:?})")]
    TransactionNotPending {
        transaction_id: TransactionId,
        status: TransactionStatus,
    },

    #[error(
        "Insufficient supply in category {category}: requested {requested}, available {available}"
    )]
    InsufficientSupply {
        category: Category,
        requested: Quantity,
        available: Quantity,
    },
}

/// Coarse error classification for caller-facing handling
///
/// The surrounding UI maps these onto user messages; the variants above
/// carry the identifiers it needs to render them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced request/listing/transaction does not exist
    NotFound,
    /// The entity exists but is not in the state the operation requires
    InvalidState,
    /// Active listings cannot fully cover the requested quantity
    InsufficientSupply,
}

impl CoordinationError {
    /// Classify this error into the three-way caller taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoordinationError::RequestNotFound { .. }
            | CoordinationError::ListingNotFound { .. }
            | CoordinationError::TransactionNotFound { .. } => ErrorKind::NotFound,
            CoordinationError::RequestNotActive { .. }
            | CoordinationError::TransactionNotPending { .. } => ErrorKind::InvalidState,
            CoordinationError::InsufficientSupply { .. } => ErrorKind::InsufficientSupply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kind() {
        let err = CoordinationError::RequestNotFound {
            request_id: RequestId::new(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("Request not found"));
    }

    #[test]
    fn test_invalid_state_kind() {
        let err = CoordinationError::TransactionNotPending {
            transaction_id: TransactionId::new(),
            status: TransactionStatus::Approved,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("not pending"));
    }

    #[test]
    fn test_insufficient_supply_display() {
        let err = CoordinationError::InsufficientSupply {
            category: Category::new("books"),
            requested: Quantity::new(7),
            available: Quantity::new(5),
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientSupply);
        assert!(err.to_string().contains("books"));
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('5'));
    }
}
