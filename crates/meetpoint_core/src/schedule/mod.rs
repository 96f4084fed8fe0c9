//! Day-window computation and conflict resolution.
//!
//! # Responsibility
//! - Convert instants into timezone-adjusted calendar-day windows.
//! - Combine window computation with proximity queries into conflict sets.
//!
//! # Invariants
//! - Window computation is pure; no clock reads anywhere in this module.
//! - The proximity index only ever receives absolute instants, so it stays
//!   timezone-agnostic.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod conflict;
pub mod window;

/// Validation error for schedule inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleError {
    /// Radius must be a positive, finite number of meters.
    NonPositiveRadius(f64),
    /// A time window must end strictly after it starts.
    EmptyWindow { start_ms: i64, end_ms: i64 },
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveRadius(value) => {
                write!(f, "radius {value} must be a positive number of meters")
            }
            Self::EmptyWindow { start_ms, end_ms } => write!(
                f,
                "window end {end_ms} must be after start {start_ms} (epoch ms)"
            ),
        }
    }
}

impl Error for ScheduleError {}
