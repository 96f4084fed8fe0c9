//! Meeting repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the proximity-index queries (radius, bounds, participant) and
//!   CRUD APIs over canonical `meetings` storage.
//! - Own the conflict-guarded save that keeps check-and-write atomic.
//!
//! # Invariants
//! - Write paths must call `Meeting::validate()` before SQL mutations.
//! - Radius queries are exact: a bounding-box SQL prefilter narrows rows,
//!   then haversine distance decides membership.
//! - `save_guarded` holds an IMMEDIATE transaction across its conflict
//!   re-check and the write, so two writers cannot both commit clashing
//!   meetings.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::geo::{GeoBounds, GeoPoint};
use crate::model::meeting::{Meeting, MeetingId, MeetingValidationError};
use crate::schedule::window::TimeWindow;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MEETING_SELECT_SQL: &str = "SELECT
    uuid,
    owner,
    longitude,
    latitude,
    scheduled_at
FROM meetings";

const LIST_DEFAULT_LIMIT: u32 = 50;
const LIST_LIMIT_MAX: u32 = 200;

// Meters per degree of latitude, padded slightly so the SQL bounding box
// always covers the exact haversine circle applied afterwards.
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
const PREFILTER_PADDING: f64 = 1.05;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for meeting persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(MeetingValidationError),
    Db(DbError),
    NotFound(MeetingId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "meeting not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted meeting data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; run migrations first"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MeetingValidationError> for RepoError {
    fn from(value: MeetingValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a conflict-guarded save.
#[derive(Debug)]
pub enum GuardedSave {
    /// The meeting was persisted; no clashing meeting existed at commit time.
    Saved(Meeting),
    /// Nothing was written; these stored meetings block the slot.
    Blocked(Vec<Meeting>),
}

/// Proximity-index and persistence contract for meetings.
///
/// Spatial queries receive absolute instants only; all timezone semantics
/// live in the schedule layer.
pub trait MeetingRepository {
    /// Upserts a meeting together with its follower set.
    fn save(&mut self, meeting: &Meeting) -> RepoResult<Meeting>;
    /// Re-checks the conflict query and writes inside one exclusive
    /// transaction. The saved meeting's own id never blocks it.
    fn save_guarded(
        &mut self,
        meeting: &Meeting,
        radius_meters: f64,
        window: Option<&TimeWindow>,
    ) -> RepoResult<GuardedSave>;
    fn find_by_id(&self, id: MeetingId) -> RepoResult<Option<Meeting>>;
    /// Deletes a meeting; deleting an absent id is not an error.
    fn delete_by_id(&self, id: MeetingId) -> RepoResult<()>;
    /// All meetings within `radius_meters` of `center`, any time.
    fn query_radius(&self, center: &GeoPoint, radius_meters: f64) -> RepoResult<Vec<Meeting>>;
    /// All meetings within `radius_meters` of `center` scheduled inside
    /// `window`.
    fn query_radius_in_window(
        &self,
        center: &GeoPoint,
        radius_meters: f64,
        window: &TimeWindow,
    ) -> RepoResult<Vec<Meeting>>;
    /// All meetings inside the rectangle, edges inclusive, any time.
    fn query_bounds(&self, bounds: &GeoBounds) -> RepoResult<Vec<Meeting>>;
    /// All meetings inside the rectangle scheduled inside `window`.
    fn query_bounds_in_window(
        &self,
        bounds: &GeoBounds,
        window: &TimeWindow,
    ) -> RepoResult<Vec<Meeting>>;
    /// Meetings the user owns or follows, owned first, paginated.
    fn query_by_participant(
        &self,
        user_id: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> RepoResult<Vec<Meeting>>;
}

/// SQLite-backed meeting repository.
pub struct SqliteMeetingRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteMeetingRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MeetingRepository for SqliteMeetingRepository<'_> {
    fn save(&mut self, meeting: &Meeting) -> RepoResult<Meeting> {
        meeting.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        upsert_meeting(&tx, meeting)?;
        replace_followers(&tx, meeting)?;
        tx.commit()?;

        Ok(meeting.clone())
    }

    fn save_guarded(
        &mut self,
        meeting: &Meeting,
        radius_meters: f64,
        window: Option<&TimeWindow>,
    ) -> RepoResult<GuardedSave> {
        meeting.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let blocking = query_radius_on(
            &tx,
            &meeting.location,
            radius_meters,
            window,
            Some(meeting.uuid),
        )?;
        if !blocking.is_empty() {
            // Dropping the transaction rolls back; nothing was written.
            return Ok(GuardedSave::Blocked(blocking));
        }

        upsert_meeting(&tx, meeting)?;
        replace_followers(&tx, meeting)?;
        tx.commit()?;

        Ok(GuardedSave::Saved(meeting.clone()))
    }

    fn find_by_id(&self, id: MeetingId) -> RepoResult<Option<Meeting>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEETING_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let meeting = parse_meeting_row(self.conn, row)?;
            return Ok(Some(meeting));
        }
        Ok(None)
    }

    fn delete_by_id(&self, id: MeetingId) -> RepoResult<()> {
        // Follower rows cascade via the foreign key. Zero rows changed is
        // fine: delete is idempotent at this layer.
        self.conn
            .execute("DELETE FROM meetings WHERE uuid = ?1;", [id.to_string()])?;
        Ok(())
    }

    fn query_radius(&self, center: &GeoPoint, radius_meters: f64) -> RepoResult<Vec<Meeting>> {
        query_radius_on(self.conn, center, radius_meters, None, None)
    }

    fn query_radius_in_window(
        &self,
        center: &GeoPoint,
        radius_meters: f64,
        window: &TimeWindow,
    ) -> RepoResult<Vec<Meeting>> {
        query_radius_on(self.conn, center, radius_meters, Some(window), None)
    }

    fn query_bounds(&self, bounds: &GeoBounds) -> RepoResult<Vec<Meeting>> {
        query_bounds_on(self.conn, bounds, None)
    }

    fn query_bounds_in_window(
        &self,
        bounds: &GeoBounds,
        window: &TimeWindow,
    ) -> RepoResult<Vec<Meeting>> {
        query_bounds_on(self.conn, bounds, Some(window))
    }

    fn query_by_participant(
        &self,
        user_id: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> RepoResult<Vec<Meeting>> {
        let mut sql = format!(
            "{MEETING_SELECT_SQL}
             WHERE owner = ?1
                OR EXISTS (
                    SELECT 1
                    FROM meeting_followers
                    WHERE meeting_uuid = meetings.uuid
                      AND user_id = ?1
                )
             ORDER BY
                CASE WHEN owner = ?1 THEN 0 ELSE 1 END ASC,
                COALESCE(scheduled_at, {}) ASC,
                uuid ASC",
            i64::MAX
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(user_id.to_string())];

        let applied_limit = normalize_list_limit(limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(applied_limit)));
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut meetings = Vec::new();
        while let Some(row) = rows.next()? {
            meetings.push(parse_meeting_row(self.conn, row)?);
        }
        Ok(meetings)
    }
}

/// Normalizes list limit according to the listing contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => LIST_DEFAULT_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
        None => LIST_DEFAULT_LIMIT,
    }
}

fn query_radius_on(
    conn: &Connection,
    center: &GeoPoint,
    radius_meters: f64,
    window: Option<&TimeWindow>,
    exclude: Option<MeetingId>,
) -> RepoResult<Vec<Meeting>> {
    let lat_delta = radius_meters * PREFILTER_PADDING / METERS_PER_DEGREE_LAT;
    let lon_scale = center.latitude().to_radians().cos().max(1e-6);
    let lon_delta = radius_meters * PREFILTER_PADDING / (METERS_PER_DEGREE_LAT * lon_scale);

    let mut sql = format!(
        "{MEETING_SELECT_SQL}
         WHERE latitude BETWEEN ? AND ?
           AND longitude BETWEEN ? AND ?"
    );
    let mut bind_values: Vec<Value> = vec![
        Value::Real(center.latitude() - lat_delta),
        Value::Real(center.latitude() + lat_delta),
        Value::Real(center.longitude() - lon_delta),
        Value::Real(center.longitude() + lon_delta),
    ];

    push_window_clause(&mut sql, &mut bind_values, window);
    push_exclude_clause(&mut sql, &mut bind_values, exclude);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut meetings = Vec::new();
    while let Some(row) = rows.next()? {
        let meeting = parse_meeting_row(conn, row)?;
        if center.distance_meters(&meeting.location) <= radius_meters {
            meetings.push(meeting);
        }
    }
    Ok(meetings)
}

fn query_bounds_on(
    conn: &Connection,
    bounds: &GeoBounds,
    window: Option<&TimeWindow>,
) -> RepoResult<Vec<Meeting>> {
    let mut sql = format!(
        "{MEETING_SELECT_SQL}
         WHERE longitude >= ? AND longitude <= ?
           AND latitude >= ? AND latitude <= ?"
    );
    let mut bind_values: Vec<Value> = vec![
        Value::Real(bounds.upper_left().longitude()),
        Value::Real(bounds.lower_right().longitude()),
        Value::Real(bounds.lower_right().latitude()),
        Value::Real(bounds.upper_left().latitude()),
    ];

    push_window_clause(&mut sql, &mut bind_values, window);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut meetings = Vec::new();
    while let Some(row) = rows.next()? {
        meetings.push(parse_meeting_row(conn, row)?);
    }
    Ok(meetings)
}

fn push_window_clause(sql: &mut String, bind_values: &mut Vec<Value>, window: Option<&TimeWindow>) {
    if let Some(window) = window {
        sql.push_str(
            " AND scheduled_at IS NOT NULL
              AND scheduled_at >= ?
              AND scheduled_at < ?",
        );
        bind_values.push(Value::Integer(window.start().timestamp_millis()));
        bind_values.push(Value::Integer(window.end().timestamp_millis()));
    }
}

fn push_exclude_clause(sql: &mut String, bind_values: &mut Vec<Value>, exclude: Option<MeetingId>) {
    if let Some(id) = exclude {
        sql.push_str(" AND uuid <> ?");
        bind_values.push(Value::Text(id.to_string()));
    }
}

fn upsert_meeting(tx: &Transaction<'_>, meeting: &Meeting) -> RepoResult<()> {
    // Owner is deliberately absent from the update branch: updates can
    // never change ownership.
    tx.execute(
        "INSERT INTO meetings (uuid, owner, longitude, latitude, scheduled_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(uuid) DO UPDATE SET
            longitude = excluded.longitude,
            latitude = excluded.latitude,
            scheduled_at = excluded.scheduled_at,
            updated_at = (strftime('%s', 'now') * 1000);",
        rusqlite::params![
            meeting.uuid.to_string(),
            meeting.owner.as_str(),
            meeting.location.longitude(),
            meeting.location.latitude(),
            meeting.scheduled_at.map(|at| at.timestamp_millis()),
        ],
    )?;
    Ok(())
}

fn replace_followers(tx: &Transaction<'_>, meeting: &Meeting) -> RepoResult<()> {
    let uuid_text = meeting.uuid.to_string();
    tx.execute(
        "DELETE FROM meeting_followers WHERE meeting_uuid = ?1;",
        [uuid_text.as_str()],
    )?;
    for user_id in &meeting.followers {
        tx.execute(
            "INSERT INTO meeting_followers (meeting_uuid, user_id) VALUES (?1, ?2);",
            rusqlite::params![uuid_text.as_str(), user_id.as_str()],
        )?;
    }
    Ok(())
}

fn parse_meeting_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Meeting> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in meetings.uuid"))
    })?;

    let longitude: f64 = row.get("longitude")?;
    let latitude: f64 = row.get("latitude")?;
    let location = GeoPoint::new(longitude, latitude).map_err(|err| {
        RepoError::InvalidData(format!("invalid coordinates for meeting `{uuid_text}`: {err}"))
    })?;

    let scheduled_at = match row.get::<_, Option<i64>>("scheduled_at")? {
        Some(ms) => Some(DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid scheduled_at value `{ms}` for meeting `{uuid_text}`"
            ))
        })?),
        None => None,
    };

    let mut meeting = Meeting::with_id(uuid, row.get::<_, String>("owner")?, location, scheduled_at)?;
    meeting.followers = load_followers(conn, &uuid_text)?;
    meeting.validate()?;
    Ok(meeting)
}

fn load_followers(
    conn: &Connection,
    meeting_uuid: &str,
) -> RepoResult<std::collections::BTreeSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT user_id
         FROM meeting_followers
         WHERE meeting_uuid = ?1
         ORDER BY user_id ASC;",
    )?;
    let mut rows = stmt.query([meeting_uuid])?;
    let mut followers = std::collections::BTreeSet::new();
    while let Some(row) = rows.next()? {
        followers.insert(row.get::<_, String>("user_id")?);
    }
    Ok(followers)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["meetings", "meeting_followers"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in ["uuid", "owner", "longitude", "latitude", "scheduled_at"] {
        if !table_has_column(conn, "meetings", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "meetings",
                column,
            });
        }
    }

    for column in ["meeting_uuid", "user_id"] {
        if !table_has_column(conn, "meeting_followers", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "meeting_followers",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::normalize_list_limit;

    #[test]
    fn normalize_list_limit_applies_default_and_clamp() {
        assert_eq!(normalize_list_limit(None), 50);
        assert_eq!(normalize_list_limit(Some(0)), 50);
        assert_eq!(normalize_list_limit(Some(25)), 25);
        assert_eq!(normalize_list_limit(Some(10_000)), 200);
    }
}
