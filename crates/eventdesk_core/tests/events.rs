use chrono::{DateTime, TimeZone, Utc};
use eventdesk_core::{
    open_db_in_memory, EntityKind, EventPatch, EventService, NewEvent, ServiceError,
    SqliteEventRepository, DEFAULT_MAX_PARTICIPANTS,
};
use rusqlite::Connection;

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 18, 0, 0).unwrap()
}

fn service(conn: &Connection) -> EventService<SqliteEventRepository<'_>> {
    EventService::new(SqliteEventRepository::try_new(conn).unwrap())
}

#[test]
fn create_applies_default_capacity_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);

    let created = events
        .create_event(&NewEvent::new("Workshop", "Berlin", at(2025, 5, 1)))
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.title, "Workshop");
    assert_eq!(created.location.as_deref(), Some("Berlin"));
    assert_eq!(created.date, at(2025, 5, 1));
    assert_eq!(created.max_participants, DEFAULT_MAX_PARTICIPANTS);
    assert_eq!(created.created_at, created.updated_at);
}

#[test]
fn create_rejects_missing_required_fields() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);

    let mut input = NewEvent::new("  ", "Berlin", at(2025, 5, 1));
    input.location = None;
    input.image_url = Some("not a url".to_string());
    input.max_participants = Some(0);

    match events.create_event(&input).unwrap_err() {
        ServiceError::Validation(err) => {
            assert!(err.has_field("title"));
            assert!(err.has_field("location"));
            assert!(err.has_field("image_url"));
            assert!(err.has_field("max_participants"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(events.list_events().unwrap().is_empty());
}

#[test]
fn list_orders_by_date_descending() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);

    events
        .create_event(&NewEvent::new("Early", "Hamburg", at(2025, 1, 10)))
        .unwrap();
    events
        .create_event(&NewEvent::new("Late", "Munich", at(2025, 9, 10)))
        .unwrap();
    events
        .create_event(&NewEvent::new("Middle", "Cologne", at(2025, 4, 10)))
        .unwrap();

    let titles: Vec<String> = events
        .list_events()
        .unwrap()
        .into_iter()
        .map(|summary| summary.event.title)
        .collect();
    assert_eq!(titles, ["Late", "Middle", "Early"]);
}

#[test]
fn get_missing_event_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);

    assert!(matches!(
        events.get_event(404),
        Err(ServiceError::NotFound {
            entity: EntityKind::Event,
            id: 404
        })
    ));
}

#[test]
fn partial_update_changes_only_given_fields_and_refreshes_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);

    let mut input = NewEvent::new("Workshop", "Berlin", at(2025, 5, 1));
    input.description = Some("Hands-on".to_string());
    input.max_participants = Some(20);
    let created = events.create_event(&input).unwrap();
    conn.execute(
        "UPDATE events SET created_at = 1000, updated_at = 1000 WHERE id = ?1;",
        [created.id],
    )
    .unwrap();

    let patch = EventPatch {
        title: Some("Advanced Workshop".to_string()),
        ..EventPatch::default()
    };
    let updated = events.update_event(created.id, &patch).unwrap();

    assert_eq!(updated.title, "Advanced Workshop");
    assert_eq!(updated.description.as_deref(), Some("Hands-on"));
    assert_eq!(updated.location.as_deref(), Some("Berlin"));
    assert_eq!(updated.max_participants, 20);
    assert_eq!(updated.created_at.timestamp_millis(), 1000);
    assert!(updated.updated_at.timestamp_millis() > 1000);
}

#[test]
fn update_can_clear_nullable_fields() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);

    let mut input = NewEvent::new("Meetup", "Leipzig", at(2025, 6, 1));
    input.description = Some("Bring snacks".to_string());
    input.image_url = Some("https://example.org/meetup.png".to_string());
    let created = events.create_event(&input).unwrap();

    let patch: EventPatch =
        serde_json::from_str(r#"{"description": null, "image_url": null}"#).unwrap();
    let updated = events.update_event(created.id, &patch).unwrap();
    assert_eq!(updated.description, None);
    assert_eq!(updated.image_url, None);
    assert_eq!(updated.title, "Meetup");
}

#[test]
fn update_rejects_empty_patch_and_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);

    match events.update_event(1, &EventPatch::default()).unwrap_err() {
        ServiceError::Validation(err) => assert!(err.has_field("body")),
        other => panic!("unexpected error: {other}"),
    }

    let patch = EventPatch {
        max_participants: Some(10),
        ..EventPatch::default()
    };
    assert!(matches!(
        events.update_event(77, &patch),
        Err(ServiceError::NotFound {
            entity: EntityKind::Event,
            id: 77
        })
    ));
}

#[test]
fn delete_removes_event_and_second_delete_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);

    let created = events
        .create_event(&NewEvent::new("Hackathon", "Dresden", at(2025, 7, 1)))
        .unwrap();
    events.delete_event(created.id).unwrap();

    assert!(matches!(
        events.get_event(created.id),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        events.delete_event(created.id),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn summary_serializes_flat_with_participant_count() {
    let conn = open_db_in_memory().unwrap();
    let events = service(&conn);
    events
        .create_event(&NewEvent::new("Workshop", "Berlin", at(2025, 5, 1)))
        .unwrap();

    let summaries = events.list_events().unwrap();
    let value = serde_json::to_value(&summaries[0]).unwrap();
    assert_eq!(value["title"], "Workshop");
    assert_eq!(value["participant_count"], 0);
    assert_eq!(value["tags"], serde_json::json!([]));
    assert!(value.get("event").is_none());
}
