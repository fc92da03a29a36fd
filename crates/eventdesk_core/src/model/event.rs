//! Event entity and event-centric read models.
//!
//! # Invariants
//! - `max_participants` defaults to [`DEFAULT_MAX_PARTICIPANTS`] when a
//!   create input omits it.
//! - `updated_at` changes on every successful update.

use super::participant::Participant;
use super::tag::TagRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned event identifier.
pub type EventId = i64;

/// Capacity used when a create input does not specify one.
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 50;

/// Persisted event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Required, at most 255 chars.
    pub title: String,
    pub description: Option<String>,
    /// At most 255 chars.
    pub location: Option<String>,
    /// Scheduled start of the event.
    pub date: DateTime<Utc>,
    /// Absolute http(s) URL, at most 500 chars.
    pub image_url: Option<String>,
    pub max_participants: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create input for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Falls back to [`DEFAULT_MAX_PARTICIPANTS`] when `None`.
    #[serde(default)]
    pub max_participants: Option<i32>,
}

impl NewEvent {
    /// Builds a create input with the fields the create contract requires.
    pub fn new(title: impl Into<String>, location: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            location: Some(location.into()),
            date,
            image_url: None,
            max_participants: None,
        }
    }

    /// Capacity that will be persisted for this input.
    pub fn effective_max_participants(&self) -> i32 {
        self.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS)
    }
}

/// Partial update for one event.
///
/// Outer `None` leaves the column unchanged. For nullable columns,
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub location: Option<Option<String>>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub max_participants: Option<i32>,
}

impl EventPatch {
    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.date.is_none()
            && self.image_url.is_none()
            && self.max_participants.is_none()
    }
}

/// List item returned by event listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub tags: Vec<TagRef>,
    /// Number of registrations for this event at read time.
    pub participant_count: i64,
}

/// Event detail with its tags and registered participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub tags: Vec<TagRef>,
    pub participants: Vec<RegisteredParticipant>,
}

/// Participant as seen from one event, with the registration timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredParticipant {
    #[serde(flatten)]
    pub participant: Participant,
    pub registered_at: DateTime<Utc>,
}

/// Event nested under a tag detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventWithCount {
    #[serde(flatten)]
    pub event: Event,
    /// Global registration count of the event.
    pub participant_count: i64,
}

/// Event nested under a participant detail.
///
/// `participant_count` counts every participant of the event, not only the
/// participant whose detail is being read, so callers can show fullness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredEvent {
    #[serde(flatten)]
    pub event: Event,
    pub registered_at: DateTime<Utc>,
    pub participant_count: i64,
}
