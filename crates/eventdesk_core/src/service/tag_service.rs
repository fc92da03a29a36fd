//! Tag use-case service.
//!
//! # Invariants
//! - `event_count` is recomputed on every read.
//! - Nested events report their global `participant_count`.
//! - Duplicate names are conflicts on both create and update.

use crate::model::event::EventWithCount;
use crate::model::tag::{NewTag, Tag, TagDetail, TagId, TagPatch, TagSummary};
use crate::model::EntityKind;
use crate::repo::tag_repo::TagRepository;
use crate::repo::AggregateStrategy;
use crate::service::{conflict_as, log_write, ServiceError, ServiceResult};
use crate::validation::{normalize_new_tag, normalize_tag_patch};
use log::debug;

const NAME_CONFLICT: &str = "A tag with this name already exists";

/// Tag service facade over repository implementations.
pub struct TagService<R: TagRepository> {
    repo: R,
    strategy: AggregateStrategy,
}

impl<R: TagRepository> TagService<R> {
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

    /// Lists tags by name with event counts.
    pub fn list_tags(&self) -> ServiceResult<Vec<TagSummary>> {
        let summaries = match self.strategy {
            AggregateStrategy::Joined => self.repo.list_tag_summaries()?,
            AggregateStrategy::PerItem => {
                let tags = self.repo.list_tags()?;
                let mut summaries = Vec::with_capacity(tags.len());
                for tag in tags {
                    let event_count = self.repo.count_events(tag.id)?;
                    summaries.push(TagSummary { tag, event_count });
                }
                summaries
            }
        };
        debug!(
            "event=tags_list module=service status=ok strategy={} count={}",
            self.strategy.as_str(),
            summaries.len()
        );
        Ok(summaries)
    }

    /// Gets one tag with every event carrying it.
    pub fn get_tag(&self, id: TagId) -> ServiceResult<TagDetail> {
        let tag = self.repo.get_tag(id)?.ok_or(ServiceError::NotFound {
            entity: EntityKind::Tag,
            id,
        })?;

        let events = match self.strategy {
            AggregateStrategy::Joined => self.repo.list_tag_events_with_counts(id)?,
            AggregateStrategy::PerItem => {
                let tagged = self.repo.list_tag_events(id)?;
                let mut events = Vec::with_capacity(tagged.len());
                for event in tagged {
                    let participant_count = self.repo.count_event_participants(event.id)?;
                    events.push(EventWithCount {
                        event,
                        participant_count,
                    });
                }
                events
            }
        };

        Ok(TagDetail { tag, events })
    }

    /// Creates one tag. Fails with a conflict on duplicate name.
    pub fn create_tag(&self, input: &NewTag) -> ServiceResult<Tag> {
        let result = normalize_new_tag(input)
            .map_err(ServiceError::from)
            .and_then(|normalized| {
                self.repo
                    .create_tag(&normalized)
                    .map_err(conflict_as(NAME_CONFLICT))
            })
            .and_then(|id| {
                self.repo.get_tag(id)?.ok_or(ServiceError::InconsistentState(
                    "created tag not found in read-back",
                ))
            });
        let subject = match &result {
            Ok(tag) => format!("tag_id={}", tag.id),
            Err(_) => "tag_id=none".to_string(),
        };
        log_write("tag_create", &subject, &result);
        result
    }

    pub fn update_tag(&self, id: TagId, patch: &TagPatch) -> ServiceResult<Tag> {
        let result = normalize_tag_patch(patch)
            .map_err(ServiceError::from)
            .and_then(|normalized| {
                self.repo
                    .update_tag(id, &normalized)
                    .map_err(conflict_as(NAME_CONFLICT))
            })
            .and_then(|()| {
                self.repo.get_tag(id)?.ok_or(ServiceError::InconsistentState(
                    "updated tag not found in read-back",
                ))
            });
        log_write("tag_update", &format!("tag_id={id}"), &result);
        result
    }

    /// Deletes one tag; its event links cascade.
    pub fn delete_tag(&self, id: TagId) -> ServiceResult<()> {
        let result = self.repo.delete_tag(id).map_err(ServiceError::from);
        log_write("tag_delete", &format!("tag_id={id}"), &result);
        result
    }
}
