//! Tag repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing is ordered by `name ASC`.
//! - `name` uniqueness and the `#RRGGBB` color format are enforced by the
//!   store as well as by validation.

use crate::model::event::{Event, EventId, EventWithCount};
use crate::model::tag::{NewTag, Tag, TagId, TagPatch, TagSummary};
use crate::model::EntityKind;
use crate::repo::event_repo::{parse_event_row, EVENT_COLUMNS};
use crate::repo::{
    count_event_participants, ensure_connection_ready, now_ms, to_datetime, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

/// Repository interface for tag operations.
pub trait TagRepository {
    fn create_tag(&self, input: &NewTag) -> RepoResult<TagId>;
    fn update_tag(&self, id: TagId, patch: &TagPatch) -> RepoResult<()>;
    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>>;
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    fn delete_tag(&self, id: TagId) -> RepoResult<()>;
    /// Counts events carrying this tag.
    fn count_events(&self, id: TagId) -> RepoResult<i64>;
    /// Lists events carrying this tag, newest first.
    fn list_tag_events(&self, id: TagId) -> RepoResult<Vec<Event>>;
    fn count_event_participants(&self, event_id: EventId) -> RepoResult<i64>;
    /// Joined alternative to `list_tags` + per-item counts.
    fn list_tag_summaries(&self) -> RepoResult<Vec<TagSummary>>;
    /// Joined alternative to `list_tag_events` + per-event counts.
    fn list_tag_events_with_counts(&self, id: TagId) -> RepoResult<Vec<EventWithCount>>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn create_tag(&self, input: &NewTag) -> RepoResult<TagId> {
        self.conn.execute(
            "INSERT INTO tags (name, color, created_at) VALUES (?1, ?2, ?3);",
            params![input.name.as_str(), input.color.as_str(), now_ms()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_tag(&self, id: TagId, patch: &TagPatch) -> RepoResult<()> {
        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(name) = patch.name.as_ref() {
            assignments.push("name = ?");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(color) = patch.color.as_ref() {
            assignments.push("color = ?");
            bind_values.push(Value::Text(color.clone()));
        }

        // Tags carry no updated_at; an empty patch only probes existence.
        let changed = if assignments.is_empty() {
            self.conn
                .execute("UPDATE tags SET id = id WHERE id = ?1;", [id])?
        } else {
            bind_values.push(Value::Integer(id));
            let sql = format!("UPDATE tags SET {} WHERE id = ?;", assignments.join(", "));
            self.conn.execute(&sql, params_from_iter(bind_values))?
        };
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Tag,
                id,
            });
        }

        Ok(())
    }

    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, created_at
             FROM tags
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tag_row(row)?));
        }
        Ok(None)
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, created_at
             FROM tags
             ORDER BY name ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }

    fn delete_tag(&self, id: TagId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tags WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Tag,
                id,
            });
        }
        Ok(())
    }

    fn count_events(&self, id: TagId) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_tags WHERE tag_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_tag_events(&self, id: TagId) -> RepoResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS}
             FROM event_tags et
             INNER JOIN events e ON e.id = et.event_id
             WHERE et.tag_id = ?1
             ORDER BY e.date DESC, e.id DESC;"
        ))?;
        let mut rows = stmt.query([id])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn count_event_participants(&self, event_id: EventId) -> RepoResult<i64> {
        count_event_participants(self.conn, event_id)
    }

    fn list_tag_summaries(&self) -> RepoResult<Vec<TagSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name, t.color, t.created_at, COALESCE(ec.event_count, 0) AS event_count
             FROM tags t
             LEFT JOIN (
                SELECT tag_id, COUNT(*) AS event_count
                FROM event_tags
                GROUP BY tag_id
             ) ec ON ec.tag_id = t.id
             ORDER BY t.name ASC, t.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(TagSummary {
                tag: parse_tag_row(row)?,
                event_count: row.get("event_count")?,
            });
        }
        Ok(summaries)
    }

    fn list_tag_events_with_counts(&self, id: TagId) -> RepoResult<Vec<EventWithCount>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS}, COALESCE(pc.participant_count, 0) AS participant_count
             FROM event_tags et
             INNER JOIN events e ON e.id = et.event_id
             LEFT JOIN (
                SELECT event_id, COUNT(*) AS participant_count
                FROM event_participants
                GROUP BY event_id
             ) pc ON pc.event_id = e.id
             WHERE et.tag_id = ?1
             ORDER BY e.date DESC, e.id DESC;"
        ))?;
        let mut rows = stmt.query([id])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(EventWithCount {
                event: parse_event_row(row)?,
                participant_count: row.get("participant_count")?,
            });
        }
        Ok(events)
    }
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        created_at: to_datetime(row.get("created_at")?, "tags.created_at")?,
    })
}
