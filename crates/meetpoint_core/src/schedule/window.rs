//! Calendar-day window computation.
//!
//! # Responsibility
//! - Provide the half-open instant interval covering one local calendar day.
//!
//! # Invariants
//! - `day_window` is a pure function of its arguments.
//! - Every produced window spans exactly 86 400 seconds.
//! - Timezone offsets are applied verbatim, including half-hour offsets.

use super::ScheduleError;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

/// Seconds in one calendar day window.
pub const DAY_SECONDS: i64 = 86_400;

/// Half-open instant interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window, rejecting empty or reversed ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::EmptyWindow {
                start_ms: start.timestamp_millis(),
                end_ms: end.timestamp_millis(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Half-open containment check: start inclusive, end exclusive.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Computes the calendar-day window containing `at`.
///
/// The start of the UTC day containing `at` is shifted by
/// `timezone_offset_minutes` to align the window with the caller's local
/// calendar day; the window then spans exactly one day.
///
/// # Contract
/// - Pure: identical inputs always yield the identical window.
/// - Offsets are honored verbatim; nothing is rounded to hour boundaries.
pub fn day_window(at: DateTime<Utc>, timezone_offset_minutes: i32) -> TimeWindow {
    let day_start_utc = at.date_naive().and_time(NaiveTime::MIN);
    let start = DateTime::<Utc>::from_naive_utc_and_offset(day_start_utc, Utc)
        + TimeDelta::minutes(i64::from(timezone_offset_minutes));
    // end = start + 86 400 s, so the start < end invariant holds by
    // construction for every representable input.
    let end = start + TimeDelta::seconds(DAY_SECONDS);
    TimeWindow { start, end }
}
