//! Coordination engine core
//!
//! Main coordinator for the ledger store, the matcher, and the
//! transaction lifecycle. Exposes the three operations the surrounding
//! application calls (match, approve, decline), each synchronous,
//! failing fast, and returning the full updated transaction for the
//! caller to render.
//!
//! Every operation that moves quantity runs under the affected
//! category's serialization guard, so conflicting calls (two matches
//! against one request, approve racing decline) are excluded rather
//! than interleaved and the accounting balance
//! `remaining + Σ(live reservations) == requested` always holds.

use chrono::Utc;
use tracing::{debug, info, warn};
use types::errors::CoordinationError;
use types::ids::{Category, ListingId, RequestId, TransactionId, UserId};
use types::listing::Listing;
use types::quantity::Quantity;
use types::request::{Request, RequestStatus};
use types::transaction::{Transaction, TransactionStatus};

use crate::events::{EventLog, LedgerEvent, SequencedEvent};
use crate::intake::EngineConfig;
use crate::ledger::Ledger;
use crate::matching::allocator;

/// Matching and lifecycle engine over the donation ledger
pub struct MatchingEngine {
    ledger: Ledger,
    events: EventLog,
    config: EngineConfig,
}

impl MatchingEngine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            ledger: Ledger::new(),
            events: EventLog::new(),
            config,
        }
    }

    pub(crate) fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Match an active request against the available supply
    ///
    /// Scans active listings in the request's category oldest-first and
    /// reserves quantity greedily until the request's full remaining
    /// need is covered. On success the touched listings' `available` is
    /// moved to `claimed`, the request is parked as `Pending` with
    /// remaining zero, and a pending [`Transaction`] recording the
    /// per-listing consumption is created and returned.
    ///
    /// All-or-nothing: if the cumulative supply falls short, nothing is
    /// mutated and `InsufficientSupply` is returned.
    pub fn match_request_to_listings(
        &self,
        request_id: RequestId,
    ) -> Result<Transaction, CoordinationError> {
        // The category keys the serialization guard and never changes,
        // so it is safe to read before taking the lock; everything else
        // is re-validated inside.
        let category = self
            .ledger
            .request(request_id)
            .map(|request| request.category)
            .ok_or(CoordinationError::RequestNotFound { request_id })?;

        self.ledger.with_category_serialized(&category, || {
            let request = self
                .ledger
                .request(request_id)
                .ok_or(CoordinationError::RequestNotFound { request_id })?;

            if request.status != RequestStatus::Active || request.remaining.is_zero() {
                return Err(CoordinationError::RequestNotActive {
                    request_id,
                    status: request.status,
                });
            }

            let supply: Vec<(ListingId, Quantity)> = self
                .ledger
                .active_listings_oldest_first(&category)
                .iter()
                .map(|listing| (listing.listing_id, listing.available))
                .collect();
            debug!(
                request_id = %request_id,
                category = %category,
                needed = %request.remaining,
                listings = supply.len(),
                "scanning supply"
            );

            let plan = allocator::plan(request.remaining, &supply).map_err(|shortfall| {
                warn!(
                    request_id = %request_id,
                    category = %category,
                    requested = %request.remaining,
                    available = %shortfall.available,
                    "match failed: insufficient supply"
                );
                CoordinationError::InsufficientSupply {
                    category: category.clone(),
                    requested: request.remaining,
                    available: shortfall.available,
                }
            })?;

            let now = Utc::now();
            let transaction =
                Transaction::new(request_id, plan.allocations, category.clone(), now);

            // Commit in plan order. The guard excludes every other writer
            // in this category, so the plan cannot have gone stale.
            for allocation in &transaction.allocations {
                let updated = self.ledger.update_listing(allocation.listing_id, |listing| {
                    listing.reserve(allocation.quantity, now);
                    listing.transactions.push(transaction.transaction_id);
                });
                debug_assert!(updated.is_some(), "supplying listing vanished mid-commit");
            }
            let matched = transaction.quantity;
            self.ledger.update_request(request_id, |request| {
                request.reserve(matched, now);
                request.transactions.push(transaction.transaction_id);
            });
            self.ledger.insert_transaction(transaction.clone());

            self.events.append(LedgerEvent::TransactionCreated {
                transaction_id: transaction.transaction_id,
                request_id,
                category: category.clone(),
                quantity: transaction.quantity,
                listing_count: transaction.allocations.len(),
                at: now,
            });
            info!(
                transaction_id = %transaction.transaction_id,
                request_id = %request_id,
                category = %category,
                quantity = %transaction.quantity,
                listings = transaction.allocations.len(),
                "reservation created"
            );

            Ok(transaction)
        })
    }

    /// Finalize a pending reservation
    ///
    /// Records the approving admin and the completion time, then flips
    /// exhausted listings and the fully satisfied request to
    /// `Completed`. No quantity moves anywhere; the deduction performed
    /// at match time becomes permanent.
    pub fn approve_transaction(
        &self,
        transaction_id: TransactionId,
        admin_id: UserId,
    ) -> Result<Transaction, CoordinationError> {
        let category = self
            .ledger
            .transaction(transaction_id)
            .map(|transaction| transaction.category)
            .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

        self.ledger.with_category_serialized(&category, || {
            let transaction = self
                .ledger
                .transaction(transaction_id)
                .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

            if transaction.status != TransactionStatus::Pending {
                return Err(CoordinationError::TransactionNotPending {
                    transaction_id,
                    status: transaction.status,
                });
            }

            let now = Utc::now();
            let approved = self
                .ledger
                .update_transaction(transaction_id, |transaction| {
                    transaction.approve(admin_id, now);
                })
                .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

            for allocation in &approved.allocations {
                let updated = self.ledger.update_listing(allocation.listing_id, |listing| {
                    listing.mark_completed_if_exhausted(now);
                });
                debug_assert!(updated.is_some(), "supplying listing vanished on approval");
            }
            self.ledger.update_request(approved.request_id, |request| {
                request.mark_completed_if_fulfilled(now);
            });

            self.events.append(LedgerEvent::TransactionApproved {
                transaction_id,
                request_id: approved.request_id,
                admin_id,
                at: now,
            });
            info!(
                transaction_id = %transaction_id,
                request_id = %approved.request_id,
                admin_id = %admin_id,
                "reservation approved"
            );

            Ok(approved)
        })
    }

    /// Reverse a pending reservation
    ///
    /// Exact inverse of the match: every supplying listing gets back
    /// precisely the quantity it contributed (available restored,
    /// claimed reduced, status reopened), the request's remaining
    /// quantity is restored and it returns to `Active`. A match
    /// immediately followed by a decline leaves every quantity field on
    /// all three entities exactly as it was.
    pub fn decline_transaction(
        &self,
        transaction_id: TransactionId,
        admin_id: UserId,
    ) -> Result<Transaction, CoordinationError> {
        let category = self
            .ledger
            .transaction(transaction_id)
            .map(|transaction| transaction.category)
            .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

        self.ledger.with_category_serialized(&category, || {
            let transaction = self
                .ledger
                .transaction(transaction_id)
                .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

            if transaction.status != TransactionStatus::Pending {
                return Err(CoordinationError::TransactionNotPending {
                    transaction_id,
                    status: transaction.status,
                });
            }

            let now = Utc::now();
            self.ledger.update_request(transaction.request_id, |request| {
                request.release(transaction.quantity, now);
            });
            for allocation in &transaction.allocations {
                let updated = self.ledger.update_listing(allocation.listing_id, |listing| {
                    listing.release(allocation.quantity, now);
                });
                debug_assert!(updated.is_some(), "supplying listing vanished on decline");
            }
            let declined = self
                .ledger
                .update_transaction(transaction_id, |transaction| {
                    transaction.decline(admin_id, now);
                })
                .ok_or(CoordinationError::TransactionNotFound { transaction_id })?;

            self.events.append(LedgerEvent::TransactionDeclined {
                transaction_id,
                request_id: declined.request_id,
                admin_id,
                at: now,
            });
            info!(
                transaction_id = %transaction_id,
                request_id = %declined.request_id,
                admin_id = %admin_id,
                "reservation declined"
            );

            Ok(declined)
        })
    }

    // ── Read accessors for collaborators ────────────────────────────

    pub fn listing(&self, listing_id: ListingId) -> Option<Listing> {
        self.ledger.listing(listing_id)
    }

    pub fn request(&self, request_id: RequestId) -> Option<Request> {
        self.ledger.request(request_id)
    }

    pub fn transaction(&self, transaction_id: TransactionId) -> Option<Transaction> {
        self.ledger.transaction(transaction_id)
    }

    /// All transactions created for a request, via its back-references
    pub fn transactions_for_request(&self, request_id: RequestId) -> Vec<Transaction> {
        self.ledger
            .request(request_id)
            .map(|request| {
                request
                    .transactions
                    .iter()
                    .filter_map(|&transaction_id| self.ledger.transaction(transaction_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reservations awaiting review, oldest first
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.ledger.pending_transactions_oldest_first()
    }

    /// Active listings with supply left, oldest first
    pub fn available_supply(&self, category: &Category) -> Vec<Listing> {
        self.ledger.active_listings_oldest_first(category)
    }

    /// Snapshot of the emitted event log
    pub fn events(&self) -> Vec<SequencedEvent> {
        self.events.snapshot()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
