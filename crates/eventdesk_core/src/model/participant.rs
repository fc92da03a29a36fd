//! Participant entity and participant-centric read models.
//!
//! # Invariants
//! - `email` is globally unique; collisions surface as conflicts.

use super::event::RegisteredEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned participant identifier.
pub type ParticipantId = i64;

/// Persisted participant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub study_program: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create input for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParticipant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub study_program: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewParticipant {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            study_program: None,
            notes: None,
        }
    }
}

/// Partial update for one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub study_program: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
}

impl ParticipantPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.study_program.is_none()
            && self.notes.is_none()
    }
}

/// List item returned by participant listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    #[serde(flatten)]
    pub participant: Participant,
    pub event_count: i64,
}

/// Participant detail with every event it is registered for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantDetail {
    #[serde(flatten)]
    pub participant: Participant,
    pub events: Vec<RegisteredEvent>,
}
