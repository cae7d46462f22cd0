//! Matching logic module
//!
//! Implements greedy oldest-first allocation planning

pub mod allocator;

pub use allocator::{plan, AllocationPlan, Shortfall};
