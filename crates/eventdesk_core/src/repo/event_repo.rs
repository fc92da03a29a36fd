//! Event repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `events`.
//! - Own both association tables from the event side (add/remove links).
//! - Provide per-item and joined read paths for derived participant counts.
//!
//! # Invariants
//! - Event listing is ordered by `date DESC, id DESC`.
//! - Association inserts rely on the composite primary key for duplicate
//!   detection and on foreign keys for endpoint existence.
//! - Association removal reports whether a row was deleted but never fails
//!   for an absent pair.

use crate::model::event::{Event, EventId, EventPatch, EventSummary, NewEvent, RegisteredParticipant};
use crate::model::participant::ParticipantId;
use crate::model::tag::{TagId, TagRef};
use crate::model::EntityKind;
use crate::repo::participant_repo::parse_participant_row;
use crate::repo::{
    count_event_participants, ensure_connection_ready, entity_exists, now_ms, to_datetime,
    ConstraintKind, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;

pub(crate) const EVENT_COLUMNS: &str = "e.id,
    e.title,
    e.description,
    e.location,
    e.date,
    e.image_url,
    e.max_participants,
    e.created_at,
    e.updated_at";

/// Repository interface for event and association operations.
pub trait EventRepository {
    fn create_event(&self, input: &NewEvent) -> RepoResult<EventId>;
    /// Applies only the fields present in `patch` and refreshes `updated_at`.
    fn update_event(&self, id: EventId, patch: &EventPatch) -> RepoResult<()>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    /// Lists events ordered by date descending.
    fn list_events(&self) -> RepoResult<Vec<Event>>;
    /// Deletes one event; associations cascade in the store.
    fn delete_event(&self, id: EventId) -> RepoResult<()>;
    /// Lists tags attached to one event, ordered by name.
    fn list_event_tags(&self, id: EventId) -> RepoResult<Vec<TagRef>>;
    /// Lists participants registered for one event, in registration order.
    fn list_event_participants(&self, id: EventId) -> RepoResult<Vec<RegisteredParticipant>>;
    /// Counts registrations of one event.
    fn count_participants(&self, id: EventId) -> RepoResult<i64>;
    /// Joined alternative to `list_events` + per-item tags/count queries.
    fn list_event_summaries(&self) -> RepoResult<Vec<EventSummary>>;
    fn add_participant(&self, event_id: EventId, participant_id: ParticipantId)
        -> RepoResult<()>;
    /// Returns `true` when a registration row was removed.
    fn remove_participant(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> RepoResult<bool>;
    fn add_tag(&self, event_id: EventId, tag_id: TagId) -> RepoResult<()>;
    /// Returns `true` when a tag link was removed.
    fn remove_tag(&self, event_id: EventId, tag_id: TagId) -> RepoResult<bool>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Maps a foreign key failure on an association insert to the endpoint
    /// that does not exist.
    fn missing_endpoint(
        &self,
        event_id: EventId,
        other: (EntityKind, &'static str, i64),
        err: RepoError,
    ) -> RepoError {
        if err.constraint_kind() != Some(ConstraintKind::ForeignKey) {
            return err;
        }
        match entity_exists(self.conn, "events", event_id) {
            Ok(false) => RepoError::NotFound {
                entity: EntityKind::Event,
                id: event_id,
            },
            Ok(true) => {
                let (entity, table, id) = other;
                match entity_exists(self.conn, table, id) {
                    Ok(false) => RepoError::NotFound { entity, id },
                    Ok(true) => err,
                    Err(lookup_err) => lookup_err,
                }
            }
            Err(lookup_err) => lookup_err,
        }
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, input: &NewEvent) -> RepoResult<EventId> {
        let now = now_ms();
        self.conn.execute(
            "INSERT INTO events (
                title,
                description,
                location,
                date,
                image_url,
                max_participants,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
            params![
                input.title.as_str(),
                input.description.as_deref(),
                input.location.as_deref(),
                input.date.timestamp_millis(),
                input.image_url.as_deref(),
                input.effective_max_participants(),
                now,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_event(&self, id: EventId, patch: &EventPatch) -> RepoResult<()> {
        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(description) = patch.description.as_ref() {
            assignments.push("description = ?");
            bind_values.push(optional_text(description));
        }
        if let Some(location) = patch.location.as_ref() {
            assignments.push("location = ?");
            bind_values.push(optional_text(location));
        }
        if let Some(date) = patch.date {
            assignments.push("date = ?");
            bind_values.push(Value::Integer(date.timestamp_millis()));
        }
        if let Some(image_url) = patch.image_url.as_ref() {
            assignments.push("image_url = ?");
            bind_values.push(optional_text(image_url));
        }
        if let Some(max_participants) = patch.max_participants {
            assignments.push("max_participants = ?");
            bind_values.push(Value::Integer(i64::from(max_participants)));
        }
        assignments.push("updated_at = ?");
        bind_values.push(Value::Integer(now_ms()));
        bind_values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE events SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Event,
                id,
            });
        }

        Ok(())
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_event_row(row)?));
        }

        Ok(None)
    }

    fn list_events(&self) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events e ORDER BY e.date DESC, e.id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn delete_event(&self, id: EventId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Event,
                id,
            });
        }
        Ok(())
    }

    fn list_event_tags(&self, id: EventId) -> RepoResult<Vec<TagRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.color
             FROM event_tags et
             INNER JOIN tags t ON t.id = et.tag_id
             WHERE et.event_id = ?1
             ORDER BY t.name ASC, t.id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_ref_row(row)?);
        }
        Ok(tags)
    }

    fn list_event_participants(&self, id: EventId) -> RepoResult<Vec<RegisteredParticipant>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                p.id,
                p.first_name,
                p.last_name,
                p.email,
                p.phone,
                p.study_program,
                p.notes,
                p.created_at,
                p.updated_at,
                ep.registered_at
             FROM event_participants ep
             INNER JOIN participants p ON p.id = ep.participant_id
             WHERE ep.event_id = ?1
             ORDER BY ep.registered_at ASC, p.id ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut participants = Vec::new();
        while let Some(row) = rows.next()? {
            participants.push(RegisteredParticipant {
                participant: parse_participant_row(row)?,
                registered_at: to_datetime(
                    row.get("registered_at")?,
                    "event_participants.registered_at",
                )?,
            });
        }
        Ok(participants)
    }

    fn count_participants(&self, id: EventId) -> RepoResult<i64> {
        count_event_participants(self.conn, id)
    }

    fn list_event_summaries(&self) -> RepoResult<Vec<EventSummary>> {
        let mut tags_by_event: HashMap<EventId, Vec<TagRef>> = HashMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT et.event_id, t.id, t.name, t.color
                 FROM event_tags et
                 INNER JOIN tags t ON t.id = et.tag_id
                 ORDER BY t.name ASC, t.id ASC;",
            )?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let event_id: EventId = row.get("event_id")?;
                tags_by_event
                    .entry(event_id)
                    .or_default()
                    .push(parse_tag_ref_row(row)?);
            }
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS}, COALESCE(pc.participant_count, 0) AS participant_count
             FROM events e
             LEFT JOIN (
                SELECT event_id, COUNT(*) AS participant_count
                FROM event_participants
                GROUP BY event_id
             ) pc ON pc.event_id = e.id
             ORDER BY e.date DESC, e.id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            let event = parse_event_row(row)?;
            let tags = tags_by_event.remove(&event.id).unwrap_or_default();
            summaries.push(EventSummary {
                event,
                tags,
                participant_count: row.get("participant_count")?,
            });
        }
        Ok(summaries)
    }

    fn add_participant(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO event_participants (event_id, participant_id, registered_at)
                 VALUES (?1, ?2, ?3);",
                params![event_id, participant_id, now_ms()],
            )
            .map_err(|err| {
                self.missing_endpoint(
                    event_id,
                    (EntityKind::Participant, "participants", participant_id),
                    err.into(),
                )
            })?;
        Ok(())
    }

    fn remove_participant(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM event_participants WHERE event_id = ?1 AND participant_id = ?2;",
            params![event_id, participant_id],
        )?;
        Ok(changed > 0)
    }

    fn add_tag(&self, event_id: EventId, tag_id: TagId) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO event_tags (event_id, tag_id) VALUES (?1, ?2);",
                params![event_id, tag_id],
            )
            .map_err(|err| {
                self.missing_endpoint(event_id, (EntityKind::Tag, "tags", tag_id), err.into())
            })?;
        Ok(())
    }

    fn remove_tag(&self, event_id: EventId, tag_id: TagId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM event_tags WHERE event_id = ?1 AND tag_id = ?2;",
            params![event_id, tag_id],
        )?;
        Ok(changed > 0)
    }
}

/// Decodes one event from a row selected with [`EVENT_COLUMNS`].
pub(crate) fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    Ok(Event {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        location: row.get("location")?,
        date: to_datetime(row.get("date")?, "events.date")?,
        image_url: row.get("image_url")?,
        max_participants: row.get("max_participants")?,
        created_at: to_datetime(row.get("created_at")?, "events.created_at")?,
        updated_at: to_datetime(row.get("updated_at")?, "events.updated_at")?,
    })
}

fn parse_tag_ref_row(row: &Row<'_>) -> RepoResult<TagRef> {
    Ok(TagRef {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
    })
}

pub(crate) fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

