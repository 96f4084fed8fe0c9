//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the proximity-index data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Meeting::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod meeting_repo;
