//! Meeting domain model.
//!
//! # Responsibility
//! - Define the canonical meeting record shared by all operations.
//! - Provide constructors that keep identity invariants intact.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another meeting.
//! - `owner` is assigned on creation and never changed by updates.
//! - `scheduled_at` is an absolute instant; no timezone is stored with it.

use crate::model::geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a meeting.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type MeetingId = Uuid;

/// Validation error for meeting records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingValidationError {
    /// Nil UUIDs are reserved and never valid identities.
    NilUuid,
    /// Owner reference must be a non-empty user id.
    EmptyOwner,
}

impl Display for MeetingValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "meeting uuid must not be nil"),
            Self::EmptyOwner => write!(f, "meeting owner must be a non-empty user id"),
        }
    }
}

impl Error for MeetingValidationError {}

/// Canonical meeting record.
///
/// Followers are kept as an ordered set so membership is deduplicated and
/// serialization stays deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    /// Stable global ID used for conflict exclusion and lookups.
    pub uuid: MeetingId,
    /// User id of the creator. Immutable after creation.
    pub owner: String,
    /// User ids of joined participants, excluding the owner.
    pub followers: BTreeSet<String>,
    /// Where the meeting takes place.
    pub location: GeoPoint,
    /// Absolute instant of the meeting, if one has been fixed.
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Meeting {
    /// Creates a new meeting with a generated stable ID and no followers.
    pub fn new(owner: impl Into<String>, location: GeoPoint, scheduled_at: Option<DateTime<Utc>>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            owner: owner.into(),
            followers: BTreeSet::new(),
            location,
            scheduled_at,
        }
    }

    /// Creates a meeting with a caller-provided stable ID.
    ///
    /// Used by read paths where identity already exists in storage.
    pub fn with_id(
        uuid: MeetingId,
        owner: impl Into<String>,
        location: GeoPoint,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<Self, MeetingValidationError> {
        if uuid.is_nil() {
            return Err(MeetingValidationError::NilUuid);
        }
        Ok(Self {
            uuid,
            owner: owner.into(),
            followers: BTreeSet::new(),
            location,
            scheduled_at,
        })
    }

    /// Checks identity invariants before persistence.
    pub fn validate(&self) -> Result<(), MeetingValidationError> {
        if self.uuid.is_nil() {
            return Err(MeetingValidationError::NilUuid);
        }
        if self.owner.trim().is_empty() {
            return Err(MeetingValidationError::EmptyOwner);
        }
        Ok(())
    }

    /// Returns whether the given user owns or follows this meeting.
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.owner == user_id || self.followers.contains(user_id)
    }
}
