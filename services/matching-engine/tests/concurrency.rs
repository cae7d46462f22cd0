//! Concurrency tests
//!
//! Verifies the serialization discipline: conflicting operations on the
//! same category are mutually excluded, so racing matches and reviews
//! can never over-draw supply or double-settle a transaction.

use matching_engine::{EngineConfig, MatchingEngine, NewListing, NewRequest};
use std::sync::Arc;
use std::thread;
use types::ids::{Category, UserId};
use types::quantity::Quantity;
use types::transaction::TransactionStatus;

fn engine() -> Arc<MatchingEngine> {
    Arc::new(MatchingEngine::with_config(EngineConfig {
        match_on_create: false,
    }))
}

fn seed_listing(engine: &MatchingEngine, category: &str, available: u32) {
    engine.create_listing(NewListing {
        donor_id: UserId::new(),
        title: "Listing".to_string(),
        description: "Concurrency test supply".to_string(),
        category: Category::new(category),
        available: Quantity::new(available),
    });
}

fn seed_request(engine: &MatchingEngine, category: &str, quantity: u32) -> types::ids::RequestId {
    engine
        .create_request(NewRequest {
            receiver_id: UserId::new(),
            title: "Request".to_string(),
            description: "Concurrency test demand".to_string(),
            purpose: "Testing".to_string(),
            category: Category::new(category),
            quantity: Quantity::new(quantity),
        })
        .0
        .request_id
}

#[test]
fn test_concurrent_matches_same_request_single_winner() {
    let engine = engine();
    seed_listing(&engine, "books", 10);
    let request_id = seed_request(&engine, "books", 7);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.match_request_to_listings(request_id).is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();

    // exactly one thread wins; the rest see a non-active request
    assert_eq!(successes, 1);

    let request = engine.request(request_id).unwrap();
    assert_eq!(request.remaining, Quantity::zero());
    assert_eq!(request.transactions.len(), 1);

    // supply drawn exactly once
    let total_claimed: Quantity = engine
        .available_supply(&Category::new("books"))
        .iter()
        .map(|l| l.claimed)
        .sum();
    assert_eq!(total_claimed, Quantity::new(7));
}

#[test]
fn test_concurrent_matches_cannot_overdraw_supply() {
    let engine = engine();
    // 10 items cannot cover two asks of 7
    seed_listing(&engine, "books", 10);
    let first = seed_request(&engine, "books", 7);
    let second = seed_request(&engine, "books", 7);

    let handles: Vec<_> = [first, second]
        .into_iter()
        .map(|request_id| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.match_request_to_listings(request_id).is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1, "supply can satisfy only one of the two");

    let supply = engine.available_supply(&Category::new("books"));
    let remaining: Quantity = supply.iter().map(|l| l.available).sum();
    assert_eq!(remaining, Quantity::new(3));
}

#[test]
fn test_concurrent_approve_and_decline_single_settlement() {
    let engine = engine();
    seed_listing(&engine, "books", 7);
    let request_id = seed_request(&engine, "books", 7);
    let transaction = engine.match_request_to_listings(request_id).unwrap();

    let approver = {
        let engine = Arc::clone(&engine);
        let transaction_id = transaction.transaction_id;
        thread::spawn(move || {
            engine
                .approve_transaction(transaction_id, UserId::new())
                .is_ok()
        })
    };
    let decliner = {
        let engine = Arc::clone(&engine);
        let transaction_id = transaction.transaction_id;
        thread::spawn(move || {
            engine
                .decline_transaction(transaction_id, UserId::new())
                .is_ok()
        })
    };

    let approved = approver.join().unwrap();
    let declined = decliner.join().unwrap();
    assert!(
        approved ^ declined,
        "exactly one settlement must win (approved: {approved}, declined: {declined})"
    );

    let settled = engine.transaction(transaction.transaction_id).unwrap();
    assert!(settled.status.is_terminal());

    // ledger state consistent with whichever settlement won
    let request = engine.request(request_id).unwrap();
    if approved {
        assert_eq!(settled.status, TransactionStatus::Approved);
        assert_eq!(request.remaining, Quantity::zero());
    } else {
        assert_eq!(settled.status, TransactionStatus::Declined);
        assert_eq!(request.remaining, Quantity::new(7));
    }
}

#[test]
fn test_concurrent_sweeps_never_double_allocate() {
    let engine = engine();
    seed_listing(&engine, "books", 12);
    for quantity in [3, 4, 5, 6] {
        seed_request(&engine, "books", quantity);
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.sweep_category(&Category::new("books")))
        })
        .collect();

    let mut matched = Quantity::zero();
    for handle in handles {
        for transaction in handle.join().unwrap() {
            matched += transaction.quantity;
        }
    }

    // total reservations never exceed the 12 items of supply
    assert!(matched <= Quantity::new(12));

    let claimed: Quantity = engine
        .pending_transactions()
        .iter()
        .map(|t| t.quantity)
        .sum();
    assert_eq!(claimed, matched);
}

#[test]
fn test_independent_categories_run_in_parallel() {
    let engine = engine();
    let categories = ["books", "clothing", "toys", "electronics"];
    for category in categories {
        seed_listing(&engine, category, 50);
    }

    let handles: Vec<_> = categories
        .into_iter()
        .map(|category| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..25 {
                    let request_id = seed_request(&engine, category, 2);
                    engine.match_request_to_listings(request_id).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // every category drained exactly to zero, one request at a time
    for category in categories {
        let remaining: Quantity = engine
            .available_supply(&Category::new(category))
            .iter()
            .map(|l| l.available)
            .sum();
        assert_eq!(remaining, Quantity::zero());
    }
}
