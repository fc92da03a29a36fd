//! Participant use-case service.
//!
//! # Responsibility
//! - Provide participant CRUD entry points for the routing layer.
//! - Compose participant detail with every registered event.
//!
//! # Invariants
//! - `event_count` is recomputed on every read.
//! - Each nested event reports the event's global `participant_count`, i.e.
//!   how full the event is, not the count of this relation alone.
//! - Duplicate emails are conflicts on both create and update.

use crate::model::event::RegisteredEvent;
use crate::model::participant::{
    NewParticipant, Participant, ParticipantDetail, ParticipantId, ParticipantPatch,
    ParticipantSummary,
};
use crate::model::EntityKind;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::AggregateStrategy;
use crate::service::{conflict_as, log_write, ServiceError, ServiceResult};
use crate::validation::{normalize_new_participant, normalize_participant_patch};
use log::debug;

const EMAIL_CONFLICT: &str = "A participant with this email already exists";

/// Participant service facade over repository implementations.
pub struct ParticipantService<R: ParticipantRepository> {
    repo: R,
    strategy: AggregateStrategy,
}

impl<R: ParticipantRepository> ParticipantService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            strategy: AggregateStrategy::default(),
        }
    }

    pub fn with_aggregate_strategy(mut self, strategy: AggregateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Lists participants by last name, then first name, with event counts.
    pub fn list_participants(&self) -> ServiceResult<Vec<ParticipantSummary>> {
        let summaries = match self.strategy {
            AggregateStrategy::Joined => self.repo.list_participant_summaries()?,
            AggregateStrategy::PerItem => {
                let participants = self.repo.list_participants()?;
                let mut summaries = Vec::with_capacity(participants.len());
                for participant in participants {
                    let event_count = self.repo.count_events(participant.id)?;
                    summaries.push(ParticipantSummary {
                        participant,
                        event_count,
                    });
                }
                summaries
            }
        };
        debug!(
            "event=participants_list module=service status=ok strategy={} count={}",
            self.strategy.as_str(),
            summaries.len()
        );
        Ok(summaries)
    }

    /// Gets one participant with every event it is registered for.
    pub fn get_participant(&self, id: ParticipantId) -> ServiceResult<ParticipantDetail> {
        let participant = self
            .repo
            .get_participant(id)?
            .ok_or(ServiceError::NotFound {
                entity: EntityKind::Participant,
                id,
            })?;

        let events = match self.strategy {
            AggregateStrategy::Joined => self.repo.list_registered_events(id)?,
            AggregateStrategy::PerItem => {
                let registrations = self.repo.list_registrations(id)?;
                let mut events = Vec::with_capacity(registrations.len());
                for (event, registered_at) in registrations {
                    let participant_count = self.repo.count_event_participants(event.id)?;
                    events.push(RegisteredEvent {
                        event,
                        registered_at,
                        participant_count,
                    });
                }
                events
            }
        };

        Ok(ParticipantDetail {
            participant,
            events,
        })
    }

    /// Creates one participant. Fails with a conflict on duplicate email.
    pub fn create_participant(&self, input: &NewParticipant) -> ServiceResult<Participant> {
        let result = normalize_new_participant(input)
            .map_err(ServiceError::from)
            .and_then(|normalized| {
                self.repo
                    .create_participant(&normalized)
                    .map_err(conflict_as(EMAIL_CONFLICT))
            })
            .and_then(|id| {
                self.repo
                    .get_participant(id)?
                    .ok_or(ServiceError::InconsistentState(
                        "created participant not found in read-back",
                    ))
            });
        let subject = match &result {
            Ok(participant) => format!("participant_id={}", participant.id),
            Err(_) => "participant_id=none".to_string(),
        };
        log_write("participant_create", &subject, &result);
        result
    }

    /// Applies a partial update. A new email colliding with another
    /// participant is a conflict.
    pub fn update_participant(
        &self,
        id: ParticipantId,
        patch: &ParticipantPatch,
    ) -> ServiceResult<Participant> {
        let result = normalize_participant_patch(patch)
            .map_err(ServiceError::from)
            .and_then(|normalized| {
                self.repo
                    .update_participant(id, &normalized)
                    .map_err(conflict_as(EMAIL_CONFLICT))
            })
            .and_then(|()| {
                self.repo
                    .get_participant(id)?
                    .ok_or(ServiceError::InconsistentState(
                        "updated participant not found in read-back",
                    ))
            });
        log_write("participant_update", &format!("participant_id={id}"), &result);
        result
    }

    /// Deletes one participant; its registrations cascade.
    pub fn delete_participant(&self, id: ParticipantId) -> ServiceResult<()> {
        let result = self
            .repo
            .delete_participant(id)
            .map_err(ServiceError::from);
        log_write("participant_delete", &format!("participant_id={id}"), &result);
        result
    }
}
