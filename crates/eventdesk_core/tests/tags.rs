use eventdesk_core::{
    open_db_in_memory, EntityKind, NewTag, ServiceError, SqliteTagRepository, TagPatch, TagService,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> TagService<SqliteTagRepository<'_>> {
    TagService::new(SqliteTagRepository::try_new(conn).unwrap())
}

#[test]
fn create_and_list_by_name() {
    let conn = open_db_in_memory().unwrap();
    let tags = service(&conn);

    tags.create_tag(&NewTag::new("Workshop", "#00AA00")).unwrap();
    tags.create_tag(&NewTag::new("Career", "#ff5733")).unwrap();

    let listed = tags.list_tags().unwrap();
    let names: Vec<&str> = listed.iter().map(|tag| tag.tag.name.as_str()).collect();
    assert_eq!(names, ["Career", "Workshop"]);
    assert!(listed.iter().all(|tag| tag.event_count == 0));
}

#[test]
fn non_hex_color_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let tags = service(&conn);

    for color in ["blue", "#12345", "#GGGGGG", "FF5733"] {
        match tags.create_tag(&NewTag::new("Sports", color)).unwrap_err() {
            ServiceError::Validation(err) => assert!(err.has_field("color"), "{color}"),
            other => panic!("unexpected error for {color}: {other}"),
        }
    }
    assert!(tags.list_tags().unwrap().is_empty());
}

#[test]
fn duplicate_name_is_a_conflict_on_create_and_update() {
    let conn = open_db_in_memory().unwrap();
    let tags = service(&conn);

    tags.create_tag(&NewTag::new("Sports", "#FF5733")).unwrap();
    let music = tags.create_tag(&NewTag::new("Music", "#3357FF")).unwrap();

    assert!(matches!(
        tags.create_tag(&NewTag::new("Sports", "#000000")),
        Err(ServiceError::Conflict(message)) if message == "A tag with this name already exists"
    ));

    let rename = TagPatch {
        name: Some("Sports".to_string()),
        ..TagPatch::default()
    };
    assert!(matches!(
        tags.update_tag(music.id, &rename),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn update_color_only() {
    let conn = open_db_in_memory().unwrap();
    let tags = service(&conn);

    let created = tags.create_tag(&NewTag::new("Sports", "#FF5733")).unwrap();
    let patch = TagPatch {
        color: Some("#000000".to_string()),
        ..TagPatch::default()
    };
    let updated = tags.update_tag(created.id, &patch).unwrap();

    assert_eq!(updated.name, "Sports");
    assert_eq!(updated.color, "#000000");
    assert_eq!(updated.created_at, created.created_at);
}

#[test]
fn missing_tag_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let tags = service(&conn);

    assert!(matches!(
        tags.get_tag(3),
        Err(ServiceError::NotFound {
            entity: EntityKind::Tag,
            id: 3
        })
    ));
    let patch = TagPatch {
        color: Some("#000000".to_string()),
        ..TagPatch::default()
    };
    assert!(matches!(
        tags.update_tag(3, &patch),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        tags.delete_tag(3),
        Err(ServiceError::NotFound { .. })
    ));
}
