//! Core domain logic for eventdesk.
//! Events, participants and tags with their registrations and tag links,
//! persisted in SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{
    Event, EventDetail, EventId, EventPatch, EventSummary, EventWithCount, NewEvent,
    RegisteredEvent, RegisteredParticipant, DEFAULT_MAX_PARTICIPANTS,
};
pub use model::participant::{
    NewParticipant, Participant, ParticipantDetail, ParticipantId, ParticipantPatch,
    ParticipantSummary,
};
pub use model::tag::{NewTag, Tag, TagDetail, TagId, TagPatch, TagRef, TagSummary};
pub use model::EntityKind;
pub use repo::event_repo::{EventRepository, SqliteEventRepository};
pub use repo::participant_repo::{ParticipantRepository, SqliteParticipantRepository};
pub use repo::tag_repo::{SqliteTagRepository, TagRepository};
pub use repo::{AggregateStrategy, ConstraintKind, RepoError, RepoResult};
pub use service::event_service::EventService;
pub use service::participant_service::ParticipantService;
pub use service::tag_service::TagService;
pub use service::{ServiceError, ServiceResult};
pub use validation::{FieldIssue, ValidationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
