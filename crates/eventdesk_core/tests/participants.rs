use eventdesk_core::{
    open_db_in_memory, EntityKind, NewParticipant, ParticipantPatch, ParticipantService,
    ServiceError, SqliteParticipantRepository,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> ParticipantService<SqliteParticipantRepository<'_>> {
    ParticipantService::new(SqliteParticipantRepository::try_new(conn).unwrap())
}

#[test]
fn create_normalizes_blank_optionals() {
    let conn = open_db_in_memory().unwrap();
    let participants = service(&conn);

    let mut input = NewParticipant::new("Ada", "Lovelace", "ada@example.org");
    input.phone = Some(String::new());
    input.study_program = Some("Mathematics".to_string());
    let created = participants.create_participant(&input).unwrap();

    assert_eq!(created.email, "ada@example.org");
    assert_eq!(created.phone, None);
    assert_eq!(created.study_program.as_deref(), Some("Mathematics"));
    assert_eq!(created.notes, None);
}

#[test]
fn duplicate_email_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let participants = service(&conn);

    participants
        .create_participant(&NewParticipant::new("Ada", "Lovelace", "ada@example.org"))
        .unwrap();
    let err = participants
        .create_participant(&NewParticipant::new("Augusta", "King", "ada@example.org"))
        .unwrap_err();

    match err {
        ServiceError::Conflict(message) => {
            assert_eq!(message, "A participant with this email already exists")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(participants.list_participants().unwrap().len(), 1);
}

#[test]
fn update_to_taken_email_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let participants = service(&conn);

    participants
        .create_participant(&NewParticipant::new("Ada", "Lovelace", "ada@example.org"))
        .unwrap();
    let grace = participants
        .create_participant(&NewParticipant::new("Grace", "Hopper", "grace@example.org"))
        .unwrap();

    let patch = ParticipantPatch {
        email: Some("ada@example.org".to_string()),
        ..ParticipantPatch::default()
    };
    assert!(matches!(
        participants.update_participant(grace.id, &patch),
        Err(ServiceError::Conflict(_))
    ));
    let unchanged = participants.get_participant(grace.id).unwrap();
    assert_eq!(unchanged.participant.email, "grace@example.org");
}

#[test]
fn invalid_email_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let participants = service(&conn);

    match participants
        .create_participant(&NewParticipant::new("Ada", "", "not-an-email"))
        .unwrap_err()
    {
        ServiceError::Validation(err) => {
            assert!(err.has_field("email"));
            assert!(err.has_field("last_name"));
            assert!(!err.has_field("first_name"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn list_orders_by_last_then_first_name() {
    let conn = open_db_in_memory().unwrap();
    let participants = service(&conn);

    for (first, last, email) in [
        ("Grace", "Hopper", "grace@example.org"),
        ("Alan", "Turing", "alan@example.org"),
        ("Ada", "Hopper", "ada.h@example.org"),
    ] {
        participants
            .create_participant(&NewParticipant::new(first, last, email))
            .unwrap();
    }

    let names: Vec<(String, String)> = participants
        .list_participants()
        .unwrap()
        .into_iter()
        .map(|summary| {
            assert_eq!(summary.event_count, 0);
            (summary.participant.last_name, summary.participant.first_name)
        })
        .collect();
    assert_eq!(
        names,
        [
            ("Hopper".to_string(), "Ada".to_string()),
            ("Hopper".to_string(), "Grace".to_string()),
            ("Turing".to_string(), "Alan".to_string()),
        ]
    );
}

#[test]
fn partial_update_clears_notes_and_keeps_the_rest() {
    let conn = open_db_in_memory().unwrap();
    let participants = service(&conn);

    let mut input = NewParticipant::new("Ada", "Lovelace", "ada@example.org");
    input.notes = Some("vegetarian".to_string());
    input.phone = Some("+49 30 1234".to_string());
    let created = participants.create_participant(&input).unwrap();
    conn.execute(
        "UPDATE participants SET updated_at = 1000 WHERE id = ?1;",
        [created.id],
    )
    .unwrap();

    let patch: ParticipantPatch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
    let updated = participants.update_participant(created.id, &patch).unwrap();

    assert_eq!(updated.notes, None);
    assert_eq!(updated.phone.as_deref(), Some("+49 30 1234"));
    assert_eq!(updated.first_name, "Ada");
    assert!(updated.updated_at.timestamp_millis() > 1000);
}

#[test]
fn missing_participant_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let participants = service(&conn);

    assert!(matches!(
        participants.get_participant(5),
        Err(ServiceError::NotFound {
            entity: EntityKind::Participant,
            id: 5
        })
    ));
    assert!(matches!(
        participants.delete_participant(5),
        Err(ServiceError::NotFound { .. })
    ));
}
