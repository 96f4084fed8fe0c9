use chrono::{DateTime, Utc};
use meetpoint_core::db::open_db_in_memory;
use meetpoint_core::{
    GeoBounds, GeoPoint, Meeting, MeetingRepository, MeetingService, SqliteMeetingRepository,
};

fn instant(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

fn point(lon: f64, lat: f64) -> GeoPoint {
    GeoPoint::new(lon, lat).unwrap()
}

fn viewport() -> GeoBounds {
    GeoBounds::new(point(37.0, 56.0), point(38.0, 55.0)).unwrap()
}

#[test]
fn bounds_query_includes_both_corners() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteMeetingRepository::try_new(&mut conn).unwrap();

    let on_upper_left = Meeting::new("u-1", point(37.0, 56.0), None);
    let on_lower_right = Meeting::new("u-2", point(38.0, 55.0), None);
    let inside = Meeting::new("u-3", point(37.5, 55.5), None);
    repo.save(&on_upper_left).unwrap();
    repo.save(&on_lower_right).unwrap();
    repo.save(&inside).unwrap();

    let found = repo.query_bounds(&viewport()).unwrap();
    assert_eq!(found.len(), 3);
}

#[test]
fn bounds_query_excludes_points_just_outside_an_edge() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteMeetingRepository::try_new(&mut conn).unwrap();

    let west_of_edge = Meeting::new("u-1", point(36.99999999, 55.5), None);
    let north_of_edge = Meeting::new("u-2", point(37.5, 56.00000001), None);
    let east_of_edge = Meeting::new("u-3", point(38.00000001, 55.5), None);
    let south_of_edge = Meeting::new("u-4", point(37.5, 54.99999999), None);
    repo.save(&west_of_edge).unwrap();
    repo.save(&north_of_edge).unwrap();
    repo.save(&east_of_edge).unwrap();
    repo.save(&south_of_edge).unwrap();

    let found = repo.query_bounds(&viewport()).unwrap();
    assert!(found.is_empty(), "unexpected matches: {found:?}");
}

#[test]
fn windowed_bounds_query_keeps_only_the_local_day() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteMeetingRepository::try_new(&mut conn).unwrap();

        let same_day = Meeting::new(
            "u-1",
            point(37.5, 55.5),
            Some(instant("2024-06-01T09:00:00Z")),
        );
        let next_day = Meeting::new(
            "u-2",
            point(37.5, 55.5),
            Some(instant("2024-06-02T09:00:00Z")),
        );
        let untimed = Meeting::new("u-3", point(37.5, 55.5), None);
        repo.save(&same_day).unwrap();
        repo.save(&next_day).unwrap();
        repo.save(&untimed).unwrap();
    }

    let repo = SqliteMeetingRepository::try_new(&mut conn).unwrap();
    let service = MeetingService::new(repo);

    let timed = service
        .find_within_bounds(&viewport(), Some(instant("2024-06-01T12:00:00Z")), 0)
        .unwrap();
    assert_eq!(timed.len(), 1);
    assert_eq!(timed[0].owner, "u-1");
}

#[test]
fn untimed_bounds_query_returns_timed_and_untimed_meetings() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteMeetingRepository::try_new(&mut conn).unwrap();
        repo.save(&Meeting::new(
            "u-1",
            point(37.5, 55.5),
            Some(instant("2024-06-01T09:00:00Z")),
        ))
        .unwrap();
        repo.save(&Meeting::new("u-2", point(37.6, 55.6), None))
            .unwrap();
        repo.save(&Meeting::new("u-3", point(10.0, 10.0), None))
            .unwrap();
    }

    let repo = SqliteMeetingRepository::try_new(&mut conn).unwrap();
    let service = MeetingService::new(repo);

    let found = service.find_within_bounds(&viewport(), None, 0).unwrap();
    assert_eq!(found.len(), 2);
}
