//! Matching Engine Service
//!
//! Core of the donation coordination workflow: matches receiver
//! requests against donor listings and carries the resulting
//! reservation through the pending → approved/declined lifecycle.
//!
//! **Key Invariants:**
//! - Oldest-first allocation strictly enforced (earliest donations are
//!   used first, and re-running against unchanged data allocates
//!   identically)
//! - All-or-nothing matching: a request is either fully covered or
//!   nothing is reserved
//! - Accounting balance: a request's remaining quantity plus the
//!   quantity held by its live reservations always equals its original
//!   ask
//! - Conflicting operations on one category are serialized; quantities
//!   never go negative and supply is never over-drawn

pub mod engine;
pub mod events;
pub mod intake;
pub mod ledger;
pub mod matching;

pub use engine::MatchingEngine;
pub use intake::{EngineConfig, NewListing, NewRequest};
