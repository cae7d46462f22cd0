//! In-memory ledger store
//!
//! Holds the persisted collections of listings, requests, and
//! transactions behind sharded concurrent maps, and owns the per-category
//! serialization guard: every quantity-mutating operation runs under its
//! category's mutex, so two conflicting operations (two matches against
//! the same request, a concurrent approve and decline) can never
//! interleave. Categories are independent supply pools, so operations in
//! different categories never contend.
//!
//! Entities are cloned out on read; all mutation goes through the
//! closure-based `update_*` methods.

use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use types::ids::{Category, ListingId, RequestId, TransactionId};
use types::listing::{Listing, ListingStatus};
use types::request::{Request, RequestStatus};
use types::transaction::{Transaction, TransactionStatus};

/// Persisted collections plus the category serialization guard
#[derive(Debug, Default)]
pub struct Ledger {
    listings: DashMap<ListingId, Listing>,
    requests: DashMap<RequestId, Request>,
    transactions: DashMap<TransactionId, Transaction>,
    category_locks: DashMap<Category, Arc<Mutex<()>>>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with all other operations on `category` excluded
    ///
    /// Both closure and guard are synchronous; the closure must not
    /// re-enter the same category's lock.
    pub fn with_category_serialized<R>(&self, category: &Category, f: impl FnOnce() -> R) -> R {
        let lock = self
            .category_locks
            .entry(category.clone())
            .or_default()
            .clone();
        // The dashmap entry ref is dropped above; only the Arc'd mutex is held.
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    // ── Listings ────────────────────────────────────────────────────

    pub fn insert_listing(&self, listing: Listing) {
        self.listings.insert(listing.listing_id, listing);
    }

    pub fn listing(&self, listing_id: ListingId) -> Option<Listing> {
        self.listings.get(&listing_id).map(|entry| entry.clone())
    }

    /// Mutate a stored listing in place, returning the updated copy
    pub fn update_listing(
        &self,
        listing_id: ListingId,
        f: impl FnOnce(&mut Listing),
    ) -> Option<Listing> {
        self.listings.get_mut(&listing_id).map(|mut entry| {
            f(&mut entry);
            entry.clone()
        })
    }

    /// Active listings with supply left in a category, oldest first
    ///
    /// Sorted by `(created_at, listing_id)`; ids are time-ordered UUIDs,
    /// so the tie-break is deterministic across re-runs.
    pub fn active_listings_oldest_first(&self, category: &Category) -> Vec<Listing> {
        let mut listings: Vec<Listing> = self
            .listings
            .iter()
            .filter(|entry| {
                entry.category == *category
                    && entry.status == ListingStatus::Active
                    && !entry.available.is_zero()
            })
            .map(|entry| entry.clone())
            .collect();
        listings.sort_by(|a, b| {
            (a.created_at, a.listing_id).cmp(&(b.created_at, b.listing_id))
        });
        listings
    }

    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    // ── Requests ────────────────────────────────────────────────────

    pub fn insert_request(&self, request: Request) {
        self.requests.insert(request.request_id, request);
    }

    pub fn request(&self, request_id: RequestId) -> Option<Request> {
        self.requests.get(&request_id).map(|entry| entry.clone())
    }

    /// Mutate a stored request in place, returning the updated copy
    pub fn update_request(
        &self,
        request_id: RequestId,
        f: impl FnOnce(&mut Request),
    ) -> Option<Request> {
        self.requests.get_mut(&request_id).map(|mut entry| {
            f(&mut entry);
            entry.clone()
        })
    }

    /// Active requests with unmatched quantity in a category, oldest first
    pub fn active_requests_oldest_first(&self, category: &Category) -> Vec<Request> {
        let mut requests: Vec<Request> = self
            .requests
            .iter()
            .filter(|entry| {
                entry.category == *category
                    && entry.status == RequestStatus::Active
                    && !entry.remaining.is_zero()
            })
            .map(|entry| entry.clone())
            .collect();
        requests.sort_by(|a, b| {
            (a.created_at, a.request_id).cmp(&(b.created_at, b.request_id))
        });
        requests
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    // ── Transactions ────────────────────────────────────────────────

    pub fn insert_transaction(&self, transaction: Transaction) {
        self.transactions
            .insert(transaction.transaction_id, transaction);
    }

    pub fn transaction(&self, transaction_id: TransactionId) -> Option<Transaction> {
        self.transactions
            .get(&transaction_id)
            .map(|entry| entry.clone())
    }

    /// Mutate a stored transaction in place, returning the updated copy
    pub fn update_transaction(
        &self,
        transaction_id: TransactionId,
        f: impl FnOnce(&mut Transaction),
    ) -> Option<Transaction> {
        self.transactions.get_mut(&transaction_id).map(|mut entry| {
            f(&mut entry);
            entry.clone()
        })
    }

    /// Transactions awaiting review, oldest first
    pub fn pending_transactions_oldest_first(&self) -> Vec<Transaction> {
        let mut pending: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| entry.status == TransactionStatus::Pending)
            .map(|entry| entry.clone())
            .collect();
        pending.sort_by(|a, b| {
            (a.created_at, a.transaction_id).cmp(&(b.created_at, b.transaction_id))
        });
        pending
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}
