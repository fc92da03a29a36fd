//! Participant repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by `last_name ASC, first_name ASC, id ASC`.
//! - `email` uniqueness is enforced by the store; collisions surface as
//!   [`ConstraintKind::Unique`](crate::repo::ConstraintKind::Unique).
//! - Nested events report the event's global participant count.

use crate::model::event::{Event, EventId, RegisteredEvent};
use crate::model::participant::{
    NewParticipant, Participant, ParticipantId, ParticipantPatch, ParticipantSummary,
};
use crate::model::EntityKind;
use crate::repo::event_repo::{optional_text, parse_event_row, EVENT_COLUMNS};
use crate::repo::{
    count_event_participants, ensure_connection_ready, now_ms, to_datetime, RepoError, RepoResult,
};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PARTICIPANT_SELECT_SQL: &str = "SELECT
    p.id,
    p.first_name,
    p.last_name,
    p.email,
    p.phone,
    p.study_program,
    p.notes,
    p.created_at,
    p.updated_at
FROM participants p";

/// Repository interface for participant operations.
pub trait ParticipantRepository {
    fn create_participant(&self, input: &NewParticipant) -> RepoResult<ParticipantId>;
    fn update_participant(&self, id: ParticipantId, patch: &ParticipantPatch) -> RepoResult<()>;
    fn get_participant(&self, id: ParticipantId) -> RepoResult<Option<Participant>>;
    fn list_participants(&self) -> RepoResult<Vec<Participant>>;
    fn delete_participant(&self, id: ParticipantId) -> RepoResult<()>;
    /// Counts events this participant is registered for.
    fn count_events(&self, id: ParticipantId) -> RepoResult<i64>;
    /// Lists events of one participant with the registration timestamp.
    fn list_registrations(
        &self,
        id: ParticipantId,
    ) -> RepoResult<Vec<(Event, DateTime<Utc>)>>;
    /// Counts all registrations of one event.
    fn count_event_participants(&self, event_id: EventId) -> RepoResult<i64>;
    /// Joined alternative to `list_participants` + per-item counts.
    fn list_participant_summaries(&self) -> RepoResult<Vec<ParticipantSummary>>;
    /// Joined alternative to `list_registrations` + per-event counts.
    fn list_registered_events(&self, id: ParticipantId) -> RepoResult<Vec<RegisteredEvent>>;
}

/// SQLite-backed participant repository.
pub struct SqliteParticipantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParticipantRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ParticipantRepository for SqliteParticipantRepository<'_> {
    fn create_participant(&self, input: &NewParticipant) -> RepoResult<ParticipantId> {
        let now = now_ms();
        self.conn.execute(
            "INSERT INTO participants (
                first_name,
                last_name,
                email,
                phone,
                study_program,
                notes,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
            params![
                input.first_name.as_str(),
                input.last_name.as_str(),
                input.email.as_str(),
                input.phone.as_deref(),
                input.study_program.as_deref(),
                input.notes.as_deref(),
                now,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_participant(&self, id: ParticipantId, patch: &ParticipantPatch) -> RepoResult<()> {
        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        for (column, value) in [
            ("first_name = ?", patch.first_name.as_ref()),
            ("last_name = ?", patch.last_name.as_ref()),
            ("email = ?", patch.email.as_ref()),
        ] {
            if let Some(value) = value {
                assignments.push(column);
                bind_values.push(Value::Text(value.clone()));
            }
        }
        for (column, value) in [
            ("phone = ?", patch.phone.as_ref()),
            ("study_program = ?", patch.study_program.as_ref()),
            ("notes = ?", patch.notes.as_ref()),
        ] {
            if let Some(value) = value {
                assignments.push(column);
                bind_values.push(optional_text(value));
            }
        }
        assignments.push("updated_at = ?");
        bind_values.push(Value::Integer(now_ms()));
        bind_values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE participants SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Participant,
                id,
            });
        }

        Ok(())
    }

    fn get_participant(&self, id: ParticipantId) -> RepoResult<Option<Participant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARTICIPANT_SELECT_SQL} WHERE p.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_participant_row(row)?));
        }

        Ok(None)
    }

    fn list_participants(&self) -> RepoResult<Vec<Participant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARTICIPANT_SELECT_SQL} ORDER BY p.last_name ASC, p.first_name ASC, p.id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut participants = Vec::new();
        while let Some(row) = rows.next()? {
            participants.push(parse_participant_row(row)?);
        }
        Ok(participants)
    }

    fn delete_participant(&self, id: ParticipantId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM participants WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Participant,
                id,
            });
        }
        Ok(())
    }

    fn count_events(&self, id: ParticipantId) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_participants WHERE participant_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_registrations(
        &self,
        id: ParticipantId,
    ) -> RepoResult<Vec<(Event, DateTime<Utc>)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS}, ep.registered_at
             FROM event_participants ep
             INNER JOIN events e ON e.id = ep.event_id
             WHERE ep.participant_id = ?1
             ORDER BY e.date DESC, e.id DESC;"
        ))?;
        let mut rows = stmt.query([id])?;
        let mut registrations = Vec::new();
        while let Some(row) = rows.next()? {
            registrations.push((parse_event_row(row)?, parse_registered_at(row)?));
        }
        Ok(registrations)
    }

    fn count_event_participants(&self, event_id: EventId) -> RepoResult<i64> {
        count_event_participants(self.conn, event_id)
    }

    fn list_participant_summaries(&self) -> RepoResult<Vec<ParticipantSummary>> {
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
                COALESCE(ec.event_count, 0) AS event_count
             FROM participants p
             LEFT JOIN (
                SELECT participant_id, COUNT(*) AS event_count
                FROM event_participants
                GROUP BY participant_id
             ) ec ON ec.participant_id = p.id
             ORDER BY p.last_name ASC, p.first_name ASC, p.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(ParticipantSummary {
                participant: parse_participant_row(row)?,
                event_count: row.get("event_count")?,
            });
        }
        Ok(summaries)
    }

    fn list_registered_events(&self, id: ParticipantId) -> RepoResult<Vec<RegisteredEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS}, ep.registered_at, COALESCE(pc.participant_count, 0) AS participant_count
             FROM event_participants ep
             INNER JOIN events e ON e.id = ep.event_id
             LEFT JOIN (
                SELECT event_id, COUNT(*) AS participant_count
                FROM event_participants
                GROUP BY event_id
             ) pc ON pc.event_id = e.id
             WHERE ep.participant_id = ?1
             ORDER BY e.date DESC, e.id DESC;"
        ))?;
        let mut rows = stmt.query([id])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(RegisteredEvent {
                event: parse_event_row(row)?,
                registered_at: parse_registered_at(row)?,
                participant_count: row.get("participant_count")?,
            });
        }
        Ok(events)
    }
}

/// Decodes one participant from a row selecting the `participants` columns.
pub(crate) fn parse_participant_row(row: &Row<'_>) -> RepoResult<Participant> {
    Ok(Participant {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        study_program: row.get("study_program")?,
        notes: row.get("notes")?,
        created_at: to_datetime(row.get("created_at")?, "participants.created_at")?,
        updated_at: to_datetime(row.get("updated_at")?, "participants.updated_at")?,
    })
}

fn parse_registered_at(row: &Row<'_>) -> RepoResult<DateTime<Utc>> {
    to_datetime(
        row.get("registered_at")?,
        "event_participants.registered_at",
    )
}
