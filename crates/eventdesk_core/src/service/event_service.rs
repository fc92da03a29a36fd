//! Event use-case service.
//!
//! # Responsibility
//! - Provide event CRUD entry points for the routing layer.
//! - Manage participant and tag links from the event side.
//!
//! # Invariants
//! - `participant_count` is recomputed on every read.
//! - Adding an existing link is a conflict; removing an absent link is a no-op.
//! - Deleting an event leaves its participants and tags untouched; only the
//!   association rows cascade.

use crate::model::event::{Event, EventDetail, EventId, EventPatch, EventSummary, NewEvent};
use crate::model::participant::ParticipantId;
use crate::model::tag::TagId;
use crate::model::EntityKind;
use crate::repo::event_repo::EventRepository;
use crate::repo::AggregateStrategy;
use crate::service::{
    conflict_as, ensure_positive_id, log_write, ServiceError, ServiceResult,
};
use crate::validation::{normalize_event_patch, normalize_new_event};
use log::debug;

const EVENT_CONFLICT: &str = "Event with this data already exists";
const REGISTRATION_CONFLICT: &str = "Participant is already registered for this event";
const EVENT_TAG_CONFLICT: &str = "Tag is already assigned to this event";

/// Event service facade over repository implementations.
pub struct EventService<R: EventRepository> {
    repo: R,
    strategy: AggregateStrategy,
}

impl<R: EventRepository> EventService<R> {
    /// Creates a service using per-item aggregate queries.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            strategy: AggregateStrategy::default(),
        }
    }

    /// Switches how list reads compute tags and participant counts.
    pub fn with_aggregate_strategy(mut self, strategy: AggregateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Lists all events, newest date first, with tags and participant count.
    pub fn list_events(&self) -> ServiceResult<Vec<EventSummary>> {
        let summaries = match self.strategy {
            AggregateStrategy::Joined => self.repo.list_event_summaries()?,
            AggregateStrategy::PerItem => {
                let events = self.repo.list_events()?;
                let mut summaries = Vec::with_capacity(events.len());
                for event in events {
                    let tags = self.repo.list_event_tags(event.id)?;
                    let participant_count = self.repo.count_participants(event.id)?;
                    summaries.push(EventSummary {
                        event,
                        tags,
                        participant_count,
                    });
                }
                summaries
            }
        };
        debug!(
            "event=events_list module=service status=ok strategy={} count={}",
            self.strategy.as_str(),
            summaries.len()
        );
        Ok(summaries)
    }

    /// Gets one event with its tags and registered participants.
    pub fn get_event(&self, id: EventId) -> ServiceResult<EventDetail> {
        let event = self.repo.get_event(id)?.ok_or(ServiceError::NotFound {
            entity: EntityKind::Event,
            id,
        })?;
        let tags = self.repo.list_event_tags(id)?;
        let participants = self.repo.list_event_participants(id)?;
        Ok(EventDetail {
            event,
            tags,
            participants,
        })
    }

    /// Creates one event. `max_participants` defaults to 50.
    pub fn create_event(&self, input: &NewEvent) -> ServiceResult<Event> {
        let result = normalize_new_event(input)
            .map_err(ServiceError::from)
            .and_then(|normalized| {
                self.repo
                    .create_event(&normalized)
                    .map_err(conflict_as(EVENT_CONFLICT))
            })
            .and_then(|id| {
                self.repo.get_event(id)?.ok_or(ServiceError::InconsistentState(
                    "created event not found in read-back",
                ))
            });
        let subject = match &result {
            Ok(event) => format!("event_id={}", event.id),
            Err(_) => "event_id=none".to_string(),
        };
        log_write("event_create", &subject, &result);
        result
    }

    /// Applies a partial update; omitted fields stay unchanged.
    pub fn update_event(&self, id: EventId, patch: &EventPatch) -> ServiceResult<Event> {
        let result = normalize_event_patch(patch)
            .map_err(ServiceError::from)
            .and_then(|normalized| {
                self.repo
                    .update_event(id, &normalized)
                    .map_err(conflict_as(EVENT_CONFLICT))
            })
            .and_then(|()| {
                self.repo.get_event(id)?.ok_or(ServiceError::InconsistentState(
                    "updated event not found in read-back",
                ))
            });
        log_write("event_update", &format!("event_id={id}"), &result);
        result
    }

    /// Deletes one event; its registrations and tag links cascade.
    pub fn delete_event(&self, id: EventId) -> ServiceResult<()> {
        let result = self.repo.delete_event(id).map_err(ServiceError::from);
        log_write("event_delete", &format!("event_id={id}"), &result);
        result
    }

    /// Registers a participant for an event.
    pub fn add_participant_to_event(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> ServiceResult<()> {
        let result = ensure_positive_id("event_id", event_id)
            .and_then(|()| ensure_positive_id("participant_id", participant_id))
            .and_then(|()| {
                self.repo
                    .add_participant(event_id, participant_id)
                    .map_err(conflict_as(REGISTRATION_CONFLICT))
            });
        log_write(
            "participant_register",
            &format!("event_id={event_id} participant_id={participant_id}"),
            &result,
        );
        result
    }

    /// Removes a registration. Absent pairs are not an error.
    pub fn remove_participant_from_event(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> ServiceResult<()> {
        let result = ensure_positive_id("event_id", event_id)
            .and_then(|()| ensure_positive_id("participant_id", participant_id))
            .and_then(|()| {
                self.repo
                    .remove_participant(event_id, participant_id)
                    .map_err(ServiceError::from)
            });
        let subject = format!(
            "event_id={event_id} participant_id={participant_id} removed={}",
            matches!(result, Ok(true))
        );
        let result = result.map(|_| ());
        log_write("participant_unregister", &subject, &result);
        result
    }

    /// Attaches a tag to an event.
    pub fn add_tag_to_event(&self, event_id: EventId, tag_id: TagId) -> ServiceResult<()> {
        let result = ensure_positive_id("event_id", event_id)
            .and_then(|()| ensure_positive_id("tag_id", tag_id))
            .and_then(|()| {
                self.repo
                    .add_tag(event_id, tag_id)
                    .map_err(conflict_as(EVENT_TAG_CONFLICT))
            });
        log_write(
            "event_tag_add",
            &format!("event_id={event_id} tag_id={tag_id}"),
            &result,
        );
        result
    }

    /// Detaches a tag from an event. Absent pairs are not an error.
    pub fn remove_tag_from_event(&self, event_id: EventId, tag_id: TagId) -> ServiceResult<()> {
        let result = ensure_positive_id("event_id", event_id)
            .and_then(|()| ensure_positive_id("tag_id", tag_id))
            .and_then(|()| {
                self.repo
                    .remove_tag(event_id, tag_id)
                    .map_err(ServiceError::from)
            });
        let subject = format!(
            "event_id={event_id} tag_id={tag_id} removed={}",
            matches!(result, Ok(true))
        );
        let result = result.map(|_| ());
        log_write("event_tag_remove", &subject, &result);
        result
    }
}
