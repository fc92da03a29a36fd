//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Keep SQL details (joins, aggregates, constraint codes) inside the
//!   persistence boundary.
//!
//! # Invariants
//! - Repositories borrow an injected connection and never open their own.
//! - Store constraint violations are reported as [`RepoError::Constraint`]
//!   with a classified [`ConstraintKind`], never as opaque DB errors.
//! - Derived counts are computed by SQL at call time and never cached.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::event::EventId;
use crate::model::EntityKind;
use chrono::{DateTime, Utc};
use rusqlite::{ffi, Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod event_repo;
pub mod participant_repo;
pub mod tag_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// How list/detail reads compute derived counts.
///
/// Both strategies return identical results; they differ only in the number
/// of statements issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregateStrategy {
    /// One dependent count query per returned item.
    #[default]
    PerItem,
    /// Grouped joins, a fixed number of statements per call.
    Joined,
}

impl AggregateStrategy {
    /// Parses the config spelling (`per_item` | `joined`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "per_item" | "per-item" => Some(Self::PerItem),
            "joined" => Some(Self::Joined),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerItem => "per_item",
            Self::Joined => "joined",
        }
    }
}

/// Store-level constraint category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// UNIQUE or PRIMARY KEY collision.
    Unique,
    NotNull,
    Check,
    ForeignKey,
    Other,
}

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        entity: EntityKind,
        id: i64,
    },
    /// Write rejected by a schema constraint.
    Constraint {
        kind: ConstraintKind,
        detail: String,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Connection was opened without foreign key enforcement.
    ForeignKeysDisabled,
    InvalidData(String),
}

impl RepoError {
    /// Returns the constraint category when this is a constraint violation.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Constraint { detail, .. } => write!(f, "{detail}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::ForeignKeysDisabled => {
                write!(f, "repository requires PRAGMA foreign_keys = ON")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            if failure.code == ErrorCode::ConstraintViolation {
                let kind = match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        ConstraintKind::Unique
                    }
                    ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
                    ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
                    _ => ConstraintKind::Other,
                };
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                return Self::Constraint { kind, detail };
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects connections that were not bootstrapped through [`crate::db`].
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    if foreign_keys != 1 {
        return Err(RepoError::ForeignKeysDisabled);
    }

    Ok(())
}

/// Current wall clock in epoch milliseconds, the storage unit for timestamps.
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub(crate) fn to_datetime(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!("timestamp `{value}` out of range in {column}"))
    })
}

/// Counts registrations of one event. Shared by all entity repositories so
/// nested events always report the event's global count.
pub(crate) fn count_event_participants(conn: &Connection, event_id: EventId) -> RepoResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM event_participants WHERE event_id = ?1;",
        [event_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub(crate) fn entity_exists(conn: &Connection, table: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
