//! Domain model for events, participants and tags.
//!
//! # Responsibility
//! - Define entity records, write inputs and partial-update shapes.
//! - Define the read models returned by list/detail use-cases.
//!
//! # Invariants
//! - Entities are identified by store-assigned integer ids.
//! - Derived counts (`participant_count`, `event_count`) exist only on read
//!   models and are never persisted.
//! - Patch types list every mutable field explicitly; `None` means unchanged.

use serde::{Deserialize, Deserializer};
use std::fmt::{Display, Formatter};

pub mod event;
pub mod participant;
pub mod tag;

/// Entity category, used for not-found reporting and log metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Event,
    Participant,
    Tag,
}

impl EntityKind {
    /// Capitalized label used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::Participant => "Participant",
            Self::Tag => "Tag",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event => f.write_str("event"),
            Self::Participant => f.write_str("participant"),
            Self::Tag => f.write_str("tag"),
        }
    }
}

/// Deserializes a nullable patch field.
///
/// Absent keys stay `None` through `#[serde(default)]`; an explicit `null`
/// becomes `Some(None)` and clears the column.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
