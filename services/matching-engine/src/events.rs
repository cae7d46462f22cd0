//! Event structures for the coordination engine
//!
//! Every state change emits one event into an append-only, sequenced
//! in-memory log. Collaborators (coordinator dashboards, activity feeds)
//! read the log to render what happened; the core never reads it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use types::ids::{Category, RequestId, TransactionId, UserId};
use types::quantity::Quantity;

/// State-change events emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A reservation was created and is awaiting review
    TransactionCreated {
        transaction_id: TransactionId,
        request_id: RequestId,
        category: Category,
        quantity: Quantity,
        /// Number of listings supplying the reservation
        listing_count: usize,
        at: DateTime<Utc>,
    },
    /// A pending reservation was finalized
    TransactionApproved {
        transaction_id: TransactionId,
        request_id: RequestId,
        admin_id: UserId,
        at: DateTime<Utc>,
    },
    /// A pending reservation was reversed
    TransactionDeclined {
        transaction_id: TransactionId,
        request_id: RequestId,
        admin_id: UserId,
        at: DateTime<Utc>,
    },
}

/// An event paired with its position in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedEvent {
    /// Monotonic per-log sequence number
    pub sequence: u64,
    pub event: LedgerEvent,
}

/// Append-only in-memory event log
#[derive(Debug, Default)]
pub struct EventLog {
    inner: Mutex<EventLogInner>,
}

#[derive(Debug, Default)]
struct EventLogInner {
    next_sequence: u64,
    entries: Vec<SequencedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning its sequence number
    pub fn append(&self, event: LedgerEvent) -> u64 {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.entries.push(SequencedEvent { sequence, event });
        sequence
    }

    /// Snapshot of all retained events, in sequence order
    pub fn snapshot(&self) -> Vec<SequencedEvent> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    /// Remove and return all retained events
    ///
    /// Sequence numbering continues across drains.
    pub fn drain(&self) -> Vec<SequencedEvent> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut inner.entries)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
