//! Ledger store module
//!
//! Repository abstraction over the three persisted collections.

pub mod store;

pub use store::Ledger;
