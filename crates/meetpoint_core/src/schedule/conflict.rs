//! Conflict resolution over the proximity index.
//!
//! # Responsibility
//! - Turn a candidate (point, optional instant, radius) into the set of
//!   meetings that would clash with it.
//!
//! # Invariants
//! - The returned set never contains the same meeting id twice.
//! - No self-exclusion happens here; the lifecycle service filters the
//!   meeting being updated out of the result itself.

use super::window::day_window;
use super::ScheduleError;
use crate::model::geo::GeoPoint;
use crate::model::meeting::{Meeting, MeetingId};
use crate::repo::meeting_repo::{MeetingRepository, RepoResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Transient query describing a candidate meeting slot.
///
/// Constructed per call, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictQuery {
    pub center: GeoPoint,
    /// When absent, temporal filtering is skipped entirely.
    pub at: Option<DateTime<Utc>>,
    pub radius_meters: f64,
    /// Caller-supplied local offset used for day-window alignment.
    pub timezone_offset_minutes: i32,
}

impl ConflictQuery {
    /// Creates a query, rejecting non-positive or non-finite radii.
    pub fn new(
        center: GeoPoint,
        at: Option<DateTime<Utc>>,
        radius_meters: f64,
        timezone_offset_minutes: i32,
    ) -> Result<Self, ScheduleError> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(ScheduleError::NonPositiveRadius(radius_meters));
        }
        Ok(Self {
            center,
            at,
            radius_meters,
            timezone_offset_minutes,
        })
    }
}

/// Combines day-window computation with proximity index queries.
pub struct ConflictResolver<'repo, R: MeetingRepository> {
    repo: &'repo R,
}

impl<'repo, R: MeetingRepository> ConflictResolver<'repo, R> {
    pub fn new(repo: &'repo R) -> Self {
        Self { repo }
    }

    /// Returns every stored meeting clashing with the queried slot.
    ///
    /// # Contract
    /// - `at == None`: pure spatial filter, any `scheduled_at` matches.
    /// - `at == Some(t)`: spatial filter plus `scheduled_at` inside the
    ///   day window of `t` under the query's timezone offset.
    /// - Result is deduplicated by meeting id; ordering is unspecified.
    pub fn find_conflicts(&self, query: &ConflictQuery) -> RepoResult<Vec<Meeting>> {
        let matches = match query.at {
            None => self.repo.query_radius(&query.center, query.radius_meters)?,
            Some(at) => {
                let window = day_window(at, query.timezone_offset_minutes);
                self.repo
                    .query_radius_in_window(&query.center, query.radius_meters, &window)?
            }
        };

        let mut seen: HashSet<MeetingId> = HashSet::with_capacity(matches.len());
        let mut conflicts = Vec::with_capacity(matches.len());
        for meeting in matches {
            if seen.insert(meeting.uuid) {
                conflicts.push(meeting);
            }
        }
        Ok(conflicts)
    }
}
