//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation and repository calls into use-case level APIs.
//! - Translate store constraint signals into the service error taxonomy.
//! - Compose derived counts according to the configured
//!   [`AggregateStrategy`](crate::repo::AggregateStrategy).
//!
//! # Invariants
//! - Services never retry; each mutation is a single store statement.
//! - Association removal never reports `NotFound`.

use crate::model::EntityKind;
use crate::repo::{ConstraintKind, RepoError};
use crate::validation::ValidationError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod event_service;
pub mod participant_service;
pub mod tag_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Message used when the store rejects a row for a missing NOT NULL value.
pub const REQUIRED_FIELD_MISSING: &str = "Required field missing";

/// Service error taxonomy exposed to the routing layer.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed or missing input, detected by validation or by a store
    /// NOT NULL / CHECK constraint.
    Validation(ValidationError),
    /// Target id does not exist.
    NotFound { entity: EntityKind, id: i64 },
    /// Write would violate a uniqueness invariant.
    Conflict(String),
    /// Any other persistence failure.
    Repo(RepoError),
    /// Internal mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl ServiceError {
    /// Stable label used in log metadata.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Repo(_) => "store",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Constraint {
                kind: ConstraintKind::NotNull,
                ..
            } => Self::Validation(ValidationError::single("body", REQUIRED_FIELD_MISSING)),
            RepoError::Constraint {
                kind: ConstraintKind::Check,
                detail,
            } => Self::Validation(ValidationError::single("body", detail)),
            RepoError::Constraint {
                kind: ConstraintKind::Unique,
                detail,
            } => Self::Conflict(detail),
            other => Self::Repo(other),
        }
    }
}

/// Translates a repository error, replacing unique-violation details with a
/// caller-facing conflict message.
pub(crate) fn conflict_as(message: &'static str) -> impl Fn(RepoError) -> ServiceError {
    move |err| match err.constraint_kind() {
        Some(ConstraintKind::Unique) => ServiceError::Conflict(message.to_string()),
        _ => err.into(),
    }
}

/// Rejects non-positive ids before they reach the store.
pub(crate) fn ensure_positive_id(field: &'static str, id: i64) -> ServiceResult<()> {
    if id <= 0 {
        return Err(ValidationError::single(field, "must be a positive integer").into());
    }
    Ok(())
}

/// Emits one metadata-only log line for a mutating use-case.
pub(crate) fn log_write<T>(event: &str, subject: &str, result: &ServiceResult<T>) {
    match result {
        Ok(_) => info!("event={event} module=service status=ok {subject}"),
        Err(err) => warn!(
            "event={event} module=service status=error error_kind={} {subject}",
            err.kind_label()
        ),
    }
}
