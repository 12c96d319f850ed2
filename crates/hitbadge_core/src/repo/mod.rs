//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the counter data-access contract.
//! - Isolate SQLite statements from the store handle and query services.
//!
//! # Invariants
//! - Increments are single atomic upserts; no read-then-write in Rust code.
//! - A missing counter reads as 0, never as an error.

pub mod counter_repo;
