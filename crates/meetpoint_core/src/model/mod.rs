//! Domain model for meetings and their geography.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Enforce coordinate and identity invariants at construction time.
//!
//! # Invariants
//! - Every meeting is identified by a stable `MeetingId`.
//! - Coordinates are WGS84 degrees and validated on every entry path,
//!   including deserialization.

pub mod geo;
pub mod meeting;
