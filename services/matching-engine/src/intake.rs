//! Intake actions for donor and receiver collaborators
//!
//! The donor and receiver front ends hand their form payloads to these
//! operations. Persisting the entity always succeeds; whether intake
//! immediately runs the matcher is a policy switch. Reservations made at
//! intake time rest in `Pending` like any other; approval is always an
//! explicit coordinator action, never automatic.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::ids::{Category, UserId};
use types::listing::Listing;
use types::quantity::Quantity;
use types::request::Request;
use types::transaction::Transaction;

use crate::engine::MatchingEngine;

/// Engine policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Run the matcher immediately when a listing or request is created
    #[serde(default = "default_match_on_create")]
    pub match_on_create: bool,
}

fn default_match_on_create() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_on_create: true,
        }
    }
}

/// Payload supplied by the donor UI's create-listing action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub donor_id: UserId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub available: Quantity,
}

/// Payload supplied by the receiver UI's create-request action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    pub receiver_id: UserId,
    pub title: String,
    pub description: String,
    pub purpose: String,
    pub category: Category,
    pub quantity: Quantity,
}

impl MatchingEngine {
    /// Persist a donor listing and, per policy, sweep outstanding
    /// requests in its category
    ///
    /// Returns the listing as stored after any sweep (its availability
    /// reflects reservations the sweep made) together with the
    /// transactions the sweep created.
    pub fn create_listing(&self, new_listing: NewListing) -> (Listing, Vec<Transaction>) {
        let now = Utc::now();
        let listing = Listing::new(
            new_listing.donor_id,
            new_listing.title,
            new_listing.description,
            new_listing.category,
            new_listing.available,
            now,
        );
        let listing_id = listing.listing_id;
        let category = listing.category.clone();
        self.ledger().insert_listing(listing.clone());
        info!(
            listing_id = %listing_id,
            category = %category,
            available = %listing.available,
            "listing created"
        );

        let transactions = if self.config().match_on_create {
            self.sweep_category(&category)
        } else {
            Vec::new()
        };

        let listing = self.ledger().listing(listing_id).unwrap_or(listing);
        (listing, transactions)
    }

    /// Persist a receiver request and, per policy, attempt one match
    /// against it
    ///
    /// A failed match (typically no supply yet) is not an intake error;
    /// the request simply stays `Active` until supply arrives.
    pub fn create_request(&self, new_request: NewRequest) -> (Request, Option<Transaction>) {
        let now = Utc::now();
        let request = Request::new(
            new_request.receiver_id,
            new_request.title,
            new_request.description,
            new_request.purpose,
            new_request.category,
            new_request.quantity,
            now,
        );
        let request_id = request.request_id;
        self.ledger().insert_request(request.clone());
        info!(
            request_id = %request_id,
            category = %request.category,
            quantity = %request.requested,
            "request created"
        );

        let transaction = if self.config().match_on_create {
            self.match_request_to_listings(request_id).ok()
        } else {
            None
        };

        let request = self.ledger().request(request_id).unwrap_or(request);
        (request, transaction)
    }

    /// Try to satisfy every outstanding active request in a category,
    /// oldest request first
    ///
    /// Used after new supply arrives and by coordinator tooling.
    /// Individual match failures are skipped; the sweep keeps going with
    /// the next request.
    pub fn sweep_category(&self, category: &Category) -> Vec<Transaction> {
        let outstanding = self.ledger().active_requests_oldest_first(category);
        let mut transactions = Vec::new();
        for request in outstanding {
            // no match for this request; try the next
            if let Ok(transaction) = self.match_request_to_listings(request.request_id) {
                transactions.push(transaction);
            }
        }
        if !transactions.is_empty() {
            info!(
                category = %category,
                matched = transactions.len(),
                "sweep matched outstanding requests"
            );
        }
        transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::request::RequestStatus;
    use types::transaction::TransactionStatus;

    fn new_listing(category: &str, available: u32) -> NewListing {
        NewListing {
            donor_id: UserId::new(),
            title: "Listing".to_string(),
            description: "Test listing".to_string(),
            category: Category::new(category),
            available: Quantity::new(available),
        }
    }

    fn new_request(category: &str, quantity: u32) -> NewRequest {
        NewRequest {
            receiver_id: UserId::new(),
            title: "Request".to_string(),
            description: "Test request".to_string(),
            purpose: "Testing".to_string(),
            category: Category::new(category),
            quantity: Quantity::new(quantity),
        }
    }

    #[test]
    fn test_config_defaults_to_match_on_create() {
        assert!(EngineConfig::default().match_on_create);

        let parsed: EngineConfig = serde_json::from_str("{}").unwrap();
        assert!(parsed.match_on_create);

        let parsed: EngineConfig = serde_json::from_str("{\"match_on_create\": false}").unwrap();
        assert!(!parsed.match_on_create);
    }

    #[test]
    fn test_create_request_matches_waiting_supply() {
        let engine = MatchingEngine::new();
        engine.create_listing(new_listing("books", 10));

        let (request, transaction) = engine.create_request(new_request("books", 4));

        let transaction = transaction.expect("request should match on intake");
        assert_eq!(transaction.status, TransactionStatus::Pending);
        assert_eq!(transaction.quantity, Quantity::new(4));
        // returned request reflects the reservation
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.remaining, Quantity::zero());
    }

    #[test]
    fn test_create_request_without_supply_stays_active() {
        let engine = MatchingEngine::new();

        let (request, transaction) = engine.create_request(new_request("books", 4));

        assert!(transaction.is_none());
        assert_eq!(request.status, RequestStatus::Active);
        assert_eq!(request.remaining, Quantity::new(4));
    }

    #[test]
    fn test_create_listing_sweeps_outstanding_requests_oldest_first() {
        let engine = MatchingEngine::new();
        let (older, _) = engine.create_request(new_request("books", 5));
        std::thread::sleep(std::time::Duration::from_millis(2));
        let (newer, _) = engine.create_request(new_request("books", 4));

        let (listing, transactions) = engine.create_listing(new_listing("books", 7));

        // only the older request fits; the newer one stays outstanding
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].request_id, older.request_id);
        assert_eq!(listing.available, Quantity::new(2));
        assert_eq!(
            engine.request(newer.request_id).unwrap().status,
            RequestStatus::Active
        );
    }

    #[test]
    fn test_sweep_satisfies_multiple_requests() {
        let engine = MatchingEngine::with_config(EngineConfig {
            match_on_create: false,
        });
        let (first, _) = engine.create_request(new_request("books", 3));
        std::thread::sleep(std::time::Duration::from_millis(2));
        let (second, _) = engine.create_request(new_request("books", 4));
        engine.create_listing(new_listing("books", 10));

        let transactions = engine.sweep_category(&Category::new("books"));

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].request_id, first.request_id);
        assert_eq!(transactions[1].request_id, second.request_id);
        // reservations rest pending; approval is a separate admin action
        assert!(transactions
            .iter()
            .all(|t| t.status == TransactionStatus::Pending));
    }

    #[test]
    fn test_manual_policy_skips_intake_matching() {
        let engine = MatchingEngine::with_config(EngineConfig {
            match_on_create: false,
        });
        engine.create_listing(new_listing("books", 10));

        let (request, transaction) = engine.create_request(new_request("books", 4));

        assert!(transaction.is_none());
        assert_eq!(request.status, RequestStatus::Active);
    }

    #[test]
    fn test_payload_deserialization() {
        let json = format!(
            "{{\"receiver_id\":\"{}\",\"title\":\"Books\",\"description\":\"Grade 8\",\
             \"purpose\":\"School year\",\"category\":\"Books\",\"quantity\":7}}",
            UserId::new()
        );
        let payload: NewRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(payload.category, Category::new("books"));
        assert_eq!(payload.quantity, Quantity::new(7));
    }
}
