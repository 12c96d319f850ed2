//! Domain model for hit counters.
//!
//! # Responsibility
//! - Define the counter key and the read-model rows returned by queries.
//!
//! # Invariants
//! - A `(user, repo)` pair identifies exactly one counter.
//! - Counts are never negative.

pub mod counter;
