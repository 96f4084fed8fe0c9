use chrono::{DateTime, Utc};
use meetpoint_core::{GeoBounds, GeoPoint, GeoValidationError, Meeting, MeetingValidationError};
use uuid::Uuid;

fn instant(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

#[test]
fn geo_point_rejects_out_of_range_coordinates() {
    let lon_err = GeoPoint::new(181.0, 0.0).unwrap_err();
    assert!(matches!(
        lon_err,
        GeoValidationError::LongitudeOutOfRange(value) if value == 181.0
    ));

    let lat_err = GeoPoint::new(0.0, -90.5).unwrap_err();
    assert!(matches!(
        lat_err,
        GeoValidationError::LatitudeOutOfRange(value) if value == -90.5
    ));

    let nan_err = GeoPoint::new(f64::NAN, 0.0).unwrap_err();
    assert!(matches!(
        nan_err,
        GeoValidationError::LongitudeOutOfRange(_)
    ));
}

#[test]
fn geo_point_accepts_boundary_coordinates() {
    assert!(GeoPoint::new(-180.0, -90.0).is_ok());
    assert!(GeoPoint::new(180.0, 90.0).is_ok());
}

#[test]
fn bounds_contains_is_inclusive_on_all_edges() {
    let upper_left = GeoPoint::new(10.0, 20.0).unwrap();
    let lower_right = GeoPoint::new(12.0, 18.0).unwrap();
    let bounds = GeoBounds::new(upper_left, lower_right).unwrap();

    assert!(bounds.contains(&upper_left));
    assert!(bounds.contains(&lower_right));
    assert!(bounds.contains(&GeoPoint::new(11.0, 19.0).unwrap()));
    assert!(!bounds.contains(&GeoPoint::new(9.999999, 19.0).unwrap()));
    assert!(!bounds.contains(&GeoPoint::new(11.0, 20.000001).unwrap()));
}

#[test]
fn bounds_reject_corners_that_are_not_north_west_south_east() {
    let a = GeoPoint::new(10.0, 20.0).unwrap();
    let b = GeoPoint::new(12.0, 18.0).unwrap();

    // Swapped corners: "upper left" is actually south-east.
    let err = GeoBounds::new(b, a).unwrap_err();
    assert!(matches!(err, GeoValidationError::MalformedBounds { .. }));
}

#[test]
fn meeting_new_sets_defaults() {
    let location = GeoPoint::new(37.62, 55.75).unwrap();
    let meeting = Meeting::new("user-1", location, Some(instant("2024-06-01T09:00:00Z")));

    assert!(!meeting.uuid.is_nil());
    assert_eq!(meeting.owner, "user-1");
    assert!(meeting.followers.is_empty());
    assert_eq!(meeting.location, location);
    assert_eq!(meeting.scheduled_at, Some(instant("2024-06-01T09:00:00Z")));
}

#[test]
fn with_id_rejects_nil_uuid() {
    let location = GeoPoint::new(0.0, 0.0).unwrap();
    let err = Meeting::with_id(Uuid::nil(), "user-1", location, None).unwrap_err();
    assert_eq!(err, MeetingValidationError::NilUuid);
}

#[test]
fn validate_rejects_empty_owner() {
    let location = GeoPoint::new(0.0, 0.0).unwrap();
    let meeting = Meeting::new("  ", location, None);
    assert_eq!(
        meeting.validate().unwrap_err(),
        MeetingValidationError::EmptyOwner
    );
}

#[test]
fn has_participant_covers_owner_and_followers() {
    let location = GeoPoint::new(0.0, 0.0).unwrap();
    let mut meeting = Meeting::new("owner-1", location, None);
    meeting.followers.insert("follower-1".to_string());

    assert!(meeting.has_participant("owner-1"));
    assert!(meeting.has_participant("follower-1"));
    assert!(!meeting.has_participant("stranger"));
}

#[test]
fn meeting_serialization_uses_expected_wire_fields() {
    let meeting_id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let location = GeoPoint::new(37.62, 55.75).unwrap();
    let mut meeting = Meeting::with_id(
        meeting_id,
        "user-1",
        location,
        Some(instant("2024-06-01T09:00:00Z")),
    )
    .unwrap();
    meeting.followers.insert("user-2".to_string());

    let json = serde_json::to_value(&meeting).unwrap();
    assert_eq!(json["uuid"], meeting_id.to_string());
    assert_eq!(json["owner"], "user-1");
    assert_eq!(json["followers"], serde_json::json!(["user-2"]));
    assert_eq!(json["location"]["longitude"], 37.62);
    assert_eq!(json["location"]["latitude"], 55.75);

    let decoded: Meeting = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, meeting);
}

#[test]
fn deserialize_rejects_out_of_range_coordinates() {
    let value = serde_json::json!({
        "uuid": "11111111-2222-4333-8444-555555555555",
        "owner": "user-1",
        "followers": [],
        "location": { "longitude": 200.0, "latitude": 0.0 },
        "scheduled_at": null
    });

    let err = serde_json::from_value::<Meeting>(value).unwrap_err();
    assert!(
        err.to_string().contains("longitude"),
        "unexpected error: {err}"
    );
}
