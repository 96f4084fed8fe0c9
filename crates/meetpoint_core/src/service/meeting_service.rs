//! Meeting lifecycle service.
//!
//! # Responsibility
//! - Decide whether create/update mutations may proceed, using conflict
//!   resolution over the proximity index.
//! - Provide read APIs for nearby, bounded and participant lookups.
//!
//! # Invariants
//! - Create never persists a rejected candidate.
//! - Update carries owner and followers over unchanged; only location and
//!   scheduled time can change.
//! - Every operation that computes a day window takes the caller's
//!   timezone offset explicitly; there is no implicit or fixed offset.
//! - Identity is passed in per call; no process-wide current user exists.

use crate::model::geo::{GeoBounds, GeoPoint, GeoValidationError};
use crate::model::meeting::{Meeting, MeetingId, MeetingValidationError};
use crate::repo::meeting_repo::{
    normalize_list_limit, GuardedSave, MeetingRepository, RepoError,
};
use crate::schedule::conflict::{ConflictQuery, ConflictResolver};
use crate::schedule::window::day_window;
use crate::schedule::ScheduleError;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Radius within which two meetings on the same local day clash.
pub const CONFLICT_RADIUS_METERS: f64 = 1_000.0;
/// Default radius for read-only nearby lookups (map display).
pub const NEARBY_RADIUS_METERS: f64 = 5_000.0;

/// Coarse failure classification for presentation-layer status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Unimplemented,
    Internal,
}

/// Service error for meeting lifecycle use-cases.
#[derive(Debug)]
pub enum MeetingServiceError {
    /// Target meeting does not exist.
    MeetingNotFound(MeetingId),
    /// Another meeting blocks the requested slot (hard failure on update).
    ScheduleConflict(Vec<Meeting>),
    /// Candidate record failed identity validation.
    Validation(MeetingValidationError),
    /// Schedule inputs (radius, window) are malformed.
    Schedule(ScheduleError),
    /// Geographic inputs are malformed.
    Geo(GeoValidationError),
    /// Contractually required behavior that is not implemented yet.
    Unimplemented(&'static str),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl MeetingServiceError {
    /// Classifies the failure for external status mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MeetingNotFound(_) => ErrorKind::NotFound,
            Self::ScheduleConflict(_) => ErrorKind::Conflict,
            Self::Validation(_) | Self::Schedule(_) | Self::Geo(_) => ErrorKind::InvalidInput,
            Self::Unimplemented(_) => ErrorKind::Unimplemented,
            Self::Repo(RepoError::Validation(_)) => ErrorKind::InvalidInput,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for MeetingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MeetingNotFound(id) => write!(f, "meeting not found: {id}"),
            Self::ScheduleConflict(conflicts) => write!(
                f,
                "{} other meeting(s) already planned at this place on this day",
                conflicts.len()
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Schedule(err) => write!(f, "{err}"),
            Self::Geo(err) => write!(f, "{err}"),
            Self::Unimplemented(what) => write!(f, "not implemented: {what}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MeetingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Schedule(err) => Some(err),
            Self::Geo(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MeetingServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::MeetingNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<MeetingValidationError> for MeetingServiceError {
    fn from(value: MeetingValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ScheduleError> for MeetingServiceError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

impl From<GeoValidationError> for MeetingServiceError {
    fn from(value: GeoValidationError) -> Self {
        Self::Geo(value)
    }
}

/// Request model for proposing a new meeting.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingDraft {
    /// Resolved user id of the creator (auth is external).
    pub owner: String,
    pub location: GeoPoint,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Request model for moving an existing meeting in space or time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeetingUpdate {
    pub id: MeetingId,
    pub location: GeoPoint,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Tagged create decision used by internal logic and tests.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Meeting),
    Rejected(Vec<Meeting>),
}

/// Wire shape for create results.
///
/// `id == None` is the sole caller-visible signal that creation was
/// refused; the conflicting meetings ride along so clients can show them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingResponse {
    pub id: Option<MeetingId>,
    pub near_meetings: Vec<Meeting>,
}

impl From<CreateOutcome> for CreateMeetingResponse {
    fn from(outcome: CreateOutcome) -> Self {
        match outcome {
            CreateOutcome::Created(meeting) => Self {
                id: Some(meeting.uuid),
                near_meetings: Vec::new(),
            },
            CreateOutcome::Rejected(conflicts) => Self {
                id: None,
                near_meetings: conflicts,
            },
        }
    }
}

/// List result envelope for participant listings.
#[derive(Debug, Clone, PartialEq)]
pub struct MyMeetingsPage {
    /// Owned meetings first, then followed, each in schedule order.
    pub items: Vec<Meeting>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Meeting lifecycle facade over repository implementations.
pub struct MeetingService<R: MeetingRepository> {
    repo: R,
}

impl<R: MeetingRepository> MeetingService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Proposes a new meeting.
    ///
    /// # Contract
    /// - A conflict is any stored meeting within 1000 m on the same local
    ///   day (or any distance-matching meeting when the draft is untimed).
    /// - Rejection returns the conflict set and persists nothing.
    /// - The commit re-checks conflicts atomically, so concurrent creates
    ///   cannot double-book the slot.
    pub fn create(
        &mut self,
        draft: &MeetingDraft,
        timezone_offset_minutes: i32,
    ) -> Result<CreateOutcome, MeetingServiceError> {
        let meeting = Meeting::new(draft.owner.clone(), draft.location, draft.scheduled_at);
        meeting.validate()?;

        let query = ConflictQuery::new(
            draft.location,
            draft.scheduled_at,
            CONFLICT_RADIUS_METERS,
            timezone_offset_minutes,
        )?;
        let conflicts = ConflictResolver::new(&self.repo).find_conflicts(&query)?;
        if !conflicts.is_empty() {
            warn!(
                "event=meeting_create module=service status=rejected conflicts={}",
                conflicts.len()
            );
            return Ok(CreateOutcome::Rejected(conflicts));
        }

        let window = draft
            .scheduled_at
            .map(|at| day_window(at, timezone_offset_minutes));
        match self
            .repo
            .save_guarded(&meeting, CONFLICT_RADIUS_METERS, window.as_ref())?
        {
            GuardedSave::Saved(saved) => {
                info!(
                    "event=meeting_create module=service status=ok id={}",
                    saved.uuid
                );
                Ok(CreateOutcome::Created(saved))
            }
            GuardedSave::Blocked(conflicts) => {
                warn!(
                    "event=meeting_create module=service status=rejected conflicts={} stage=commit",
                    conflicts.len()
                );
                Ok(CreateOutcome::Rejected(conflicts))
            }
        }
    }

    /// Moves an existing meeting in space or time.
    ///
    /// # Contract
    /// - Fails with `MeetingNotFound` when the id does not exist.
    /// - The meeting never conflicts with itself; other conflicts fail
    ///   hard with `ScheduleConflict` and leave the store unchanged.
    /// - Owner and followers are carried over from the stored record.
    pub fn update(
        &mut self,
        update: &MeetingUpdate,
        timezone_offset_minutes: i32,
    ) -> Result<Meeting, MeetingServiceError> {
        let existing = self
            .repo
            .find_by_id(update.id)?
            .ok_or(MeetingServiceError::MeetingNotFound(update.id))?;

        let query = ConflictQuery::new(
            update.location,
            update.scheduled_at,
            CONFLICT_RADIUS_METERS,
            timezone_offset_minutes,
        )?;
        let conflicts: Vec<Meeting> = ConflictResolver::new(&self.repo)
            .find_conflicts(&query)?
            .into_iter()
            .filter(|meeting| meeting.uuid != update.id)
            .collect();
        if !conflicts.is_empty() {
            warn!(
                "event=meeting_update module=service status=conflict id={} conflicts={}",
                update.id,
                conflicts.len()
            );
            return Err(MeetingServiceError::ScheduleConflict(conflicts));
        }

        let mut candidate = existing;
        candidate.location = update.location;
        candidate.scheduled_at = update.scheduled_at;

        let window = update
            .scheduled_at
            .map(|at| day_window(at, timezone_offset_minutes));
        match self
            .repo
            .save_guarded(&candidate, CONFLICT_RADIUS_METERS, window.as_ref())?
        {
            GuardedSave::Saved(saved) => {
                info!(
                    "event=meeting_update module=service status=ok id={}",
                    saved.uuid
                );
                Ok(saved)
            }
            GuardedSave::Blocked(conflicts) => {
                warn!(
                    "event=meeting_update module=service status=conflict id={} conflicts={} stage=commit",
                    update.id,
                    conflicts.len()
                );
                Err(MeetingServiceError::ScheduleConflict(conflicts))
            }
        }
    }

    /// Deletes a meeting by id.
    ///
    /// Deleting an absent id is not an error; the flag is always `true`.
    pub fn delete(&self, id: MeetingId) -> Result<bool, MeetingServiceError> {
        self.repo.delete_by_id(id)?;
        info!("event=meeting_delete module=service status=ok id={id}");
        Ok(true)
    }

    /// Joins a user to a meeting.
    ///
    /// # Contract (required extension point)
    /// - Must verify the user has no other meeting overlapping this one's
    ///   day window before joining, mirroring the create/update conflict
    ///   check scoped to the user's own meeting set.
    pub fn add_follower(
        &mut self,
        _meeting_id: MeetingId,
        _user_id: &str,
    ) -> Result<(), MeetingServiceError> {
        Err(MeetingServiceError::Unimplemented(
            "follower join requires an overlap guard over the user's own meetings",
        ))
    }

    /// Removes a user from a meeting's follower set.
    ///
    /// # Contract (required extension point)
    /// - Counterpart of [`Self::add_follower`]; ships together with the
    ///   overlap guard.
    pub fn remove_follower(
        &mut self,
        _meeting_id: MeetingId,
        _user_id: &str,
    ) -> Result<(), MeetingServiceError> {
        Err(MeetingServiceError::Unimplemented(
            "follower leave ships together with the follower join guard",
        ))
    }

    /// Lists meetings the given identity owns or follows, owned first.
    ///
    /// Identity is supplied by the external auth collaborator; this layer
    /// receives only a resolved user id.
    pub fn list_mine(
        &self,
        user_id: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<MyMeetingsPage, MeetingServiceError> {
        let applied_limit = normalize_list_limit(limit);
        let items = self
            .repo
            .query_by_participant(user_id, Some(applied_limit), offset)?;
        Ok(MyMeetingsPage {
            items,
            applied_limit,
        })
    }

    /// Gets one meeting by stable id.
    pub fn get_by_id(&self, id: MeetingId) -> Result<Meeting, MeetingServiceError> {
        self.repo
            .find_by_id(id)?
            .ok_or(MeetingServiceError::MeetingNotFound(id))
    }

    /// Read-only wide-radius lookup for map display. No conflict semantics.
    pub fn find_near(
        &self,
        center: GeoPoint,
        at: Option<DateTime<Utc>>,
        timezone_offset_minutes: i32,
        radius_meters: Option<f64>,
    ) -> Result<Vec<Meeting>, MeetingServiceError> {
        let radius = radius_meters.unwrap_or(NEARBY_RADIUS_METERS);
        let query = ConflictQuery::new(center, at, radius, timezone_offset_minutes)?;
        let meetings = ConflictResolver::new(&self.repo).find_conflicts(&query)?;
        Ok(meetings)
    }

    /// Meetings inside a rectangular viewport, optionally limited to the
    /// local calendar day of `at`. Corners are inclusive.
    pub fn find_within_bounds(
        &self,
        bounds: &GeoBounds,
        at: Option<DateTime<Utc>>,
        timezone_offset_minutes: i32,
    ) -> Result<Vec<Meeting>, MeetingServiceError> {
        let meetings = match at {
            None => self.repo.query_bounds(bounds)?,
            Some(at) => {
                let window = day_window(at, timezone_offset_minutes);
                self.repo.query_bounds_in_window(bounds, &window)?
            }
        };
        Ok(meetings)
    }
}
