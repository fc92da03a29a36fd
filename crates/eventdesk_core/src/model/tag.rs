//! Tag entity and tag-centric read models.

use super::event::EventWithCount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned tag identifier.
pub type TagId = i64;

/// Persisted tag record. `name` is globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    /// `#RRGGBB` hex color.
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub color: String,
}

impl NewTag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TagPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none()
    }
}

/// Compact tag view nested under events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

/// List item returned by tag listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    #[serde(flatten)]
    pub tag: Tag,
    pub event_count: i64,
}

/// Tag detail with every event carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagDetail {
    #[serde(flatten)]
    pub tag: Tag,
    pub events: Vec<EventWithCount>,
}
