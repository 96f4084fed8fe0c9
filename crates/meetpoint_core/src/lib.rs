//! Core domain logic for meetpoint.
//!
//! Users propose an in-person meeting at a geographic point and time; this
//! crate rejects the proposal when a conflicting meeting already exists
//! nearby on the same calendar day. It is the single source of truth for
//! the conflict-resolution invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::geo::{GeoBounds, GeoPoint, GeoValidationError};
pub use model::meeting::{Meeting, MeetingId, MeetingValidationError};
pub use repo::meeting_repo::{
    normalize_list_limit, GuardedSave, MeetingRepository, RepoError, RepoResult,
    SqliteMeetingRepository,
};
pub use schedule::conflict::{ConflictQuery, ConflictResolver};
pub use schedule::window::{day_window, TimeWindow, DAY_SECONDS};
pub use schedule::ScheduleError;
pub use service::meeting_service::{
    CreateMeetingResponse, CreateOutcome, ErrorKind, MeetingDraft, MeetingService,
    MeetingServiceError, MeetingUpdate, MyMeetingsPage, CONFLICT_RADIUS_METERS,
    NEARBY_RADIUS_METERS,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
