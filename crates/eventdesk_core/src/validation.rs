//! Input validation for create and patch payloads.
//!
//! # Responsibility
//! - Check field presence, length limits and formats before any store write.
//! - Normalize optional text so empty strings are persisted as `NULL`.
//!
//! # Invariants
//! - Length limits mirror the `CHECK` constraints of the schema.
//! - Patches must carry at least one field.
//! - All issues of one payload are reported together, in field order.

use crate::model::event::{EventPatch, NewEvent};
use crate::model::participant::{NewParticipant, ParticipantPatch};
use crate::model::tag::{NewTag, TagPatch};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TITLE_MAX_CHARS: usize = 255;
pub const LOCATION_MAX_CHARS: usize = 255;
pub const IMAGE_URL_MAX_CHARS: usize = 500;
pub const PERSON_NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 255;
pub const PHONE_MAX_CHARS: usize = 50;
pub const STUDY_PROGRAM_MAX_CHARS: usize = 255;
pub const TAG_NAME_MAX_CHARS: usize = 100;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://[^\s/?#]+[^\s]*$").expect("valid url regex"));

/// One rejected field with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Validation failure carrying every issue found in one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Builds an error with exactly one issue.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Returns whether any issue targets `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        for (idx, issue) in self.issues.iter().enumerate() {
            let separator = if idx == 0 { ": " } else { "; " };
            write!(f, "{separator}{} {}", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn required_text(&mut self, field: &str, label: &str, value: &str, max_chars: usize) {
        if value.trim().is_empty() {
            self.push(field, format!("{label} is required"));
        } else {
            self.max_chars(field, value, max_chars);
        }
    }

    fn max_chars(&mut self, field: &str, value: &str, max_chars: usize) {
        if value.chars().count() > max_chars {
            self.push(field, format!("must be at most {max_chars} characters"));
        }
    }

    fn email(&mut self, value: &str) {
        if !EMAIL_RE.is_match(value) {
            self.push("email", "Invalid email format");
        } else {
            self.max_chars("email", value, EMAIL_MAX_CHARS);
        }
    }

    fn image_url(&mut self, value: Option<&str>) {
        let Some(url) = value else {
            return;
        };
        if !URL_RE.is_match(url) {
            self.push("image_url", "Invalid url");
        } else {
            self.max_chars("image_url", url, IMAGE_URL_MAX_CHARS);
        }
    }

    fn max_participants(&mut self, value: Option<i32>) {
        if matches!(value, Some(max) if max <= 0) {
            self.push("max_participants", "must be a positive integer");
        }
    }

    fn color(&mut self, value: &str) {
        if !is_hex_color(value) {
            self.push("color", "Color must be HEX (e.g. #FF5733)");
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { issues: self.0 })
        }
    }
}

/// Validates and normalizes an event create input.
///
/// `location` is required on create even though the column is nullable.
pub fn normalize_new_event(input: &NewEvent) -> Result<NewEvent, ValidationError> {
    let mut normalized = input.clone();
    normalized.description = blank_to_none(normalized.description);
    normalized.image_url = blank_to_none(normalized.image_url);

    let mut issues = Issues::default();
    issues.required_text("title", "Title", &normalized.title, TITLE_MAX_CHARS);
    issues.required_text(
        "location",
        "Location",
        normalized.location.as_deref().unwrap_or(""),
        LOCATION_MAX_CHARS,
    );
    issues.image_url(normalized.image_url.as_deref());
    issues.max_participants(normalized.max_participants);
    issues.finish(normalized)
}

/// Validates and normalizes an event patch.
pub fn normalize_event_patch(patch: &EventPatch) -> Result<EventPatch, ValidationError> {
    ensure_not_empty(patch.is_empty())?;

    let mut normalized = patch.clone();
    normalized.description = normalized.description.map(blank_to_none);
    normalized.image_url = normalized.image_url.map(blank_to_none);

    let mut issues = Issues::default();
    if let Some(title) = normalized.title.as_deref() {
        issues.required_text("title", "Title", title, TITLE_MAX_CHARS);
    }
    if let Some(location) = normalized.location.as_ref() {
        issues.required_text(
            "location",
            "Location",
            location.as_deref().unwrap_or(""),
            LOCATION_MAX_CHARS,
        );
    }
    if let Some(image_url) = normalized.image_url.as_ref() {
        issues.image_url(image_url.as_deref());
    }
    issues.max_participants(normalized.max_participants);
    issues.finish(normalized)
}

/// Validates and normalizes a participant create input.
pub fn normalize_new_participant(
    input: &NewParticipant,
) -> Result<NewParticipant, ValidationError> {
    let mut normalized = input.clone();
    normalized.phone = blank_to_none(normalized.phone);
    normalized.study_program = blank_to_none(normalized.study_program);
    normalized.notes = blank_to_none(normalized.notes);

    let mut issues = Issues::default();
    issues.required_text(
        "first_name",
        "First name",
        &normalized.first_name,
        PERSON_NAME_MAX_CHARS,
    );
    issues.required_text(
        "last_name",
        "Last name",
        &normalized.last_name,
        PERSON_NAME_MAX_CHARS,
    );
    issues.email(&normalized.email);
    if let Some(phone) = normalized.phone.as_deref() {
        issues.max_chars("phone", phone, PHONE_MAX_CHARS);
    }
    if let Some(program) = normalized.study_program.as_deref() {
        issues.max_chars("study_program", program, STUDY_PROGRAM_MAX_CHARS);
    }
    issues.finish(normalized)
}

/// Validates and normalizes a participant patch.
pub fn normalize_participant_patch(
    patch: &ParticipantPatch,
) -> Result<ParticipantPatch, ValidationError> {
    ensure_not_empty(patch.is_empty())?;

    let mut normalized = patch.clone();
    normalized.phone = normalized.phone.map(blank_to_none);
    normalized.study_program = normalized.study_program.map(blank_to_none);
    normalized.notes = normalized.notes.map(blank_to_none);

    let mut issues = Issues::default();
    if let Some(first_name) = normalized.first_name.as_deref() {
        issues.required_text("first_name", "First name", first_name, PERSON_NAME_MAX_CHARS);
    }
    if let Some(last_name) = normalized.last_name.as_deref() {
        issues.required_text("last_name", "Last name", last_name, PERSON_NAME_MAX_CHARS);
    }
    if let Some(email) = normalized.email.as_deref() {
        issues.email(email);
    }
    if let Some(Some(phone)) = normalized.phone.as_ref() {
        issues.max_chars("phone", phone, PHONE_MAX_CHARS);
    }
    if let Some(Some(program)) = normalized.study_program.as_ref() {
        issues.max_chars("study_program", program, STUDY_PROGRAM_MAX_CHARS);
    }
    issues.finish(normalized)
}

/// Validates a tag create input.
pub fn normalize_new_tag(input: &NewTag) -> Result<NewTag, ValidationError> {
    let mut issues = Issues::default();
    issues.required_text("name", "Tag name", &input.name, TAG_NAME_MAX_CHARS);
    issues.color(&input.color);
    issues.finish(input.clone())
}

/// Validates a tag patch.
pub fn normalize_tag_patch(patch: &TagPatch) -> Result<TagPatch, ValidationError> {
    ensure_not_empty(patch.is_empty())?;

    let mut issues = Issues::default();
    if let Some(name) = patch.name.as_deref() {
        issues.required_text("name", "Tag name", name, TAG_NAME_MAX_CHARS);
    }
    if let Some(color) = patch.color.as_deref() {
        issues.color(color);
    }
    issues.finish(patch.clone())
}

/// Returns whether `value` is a `#RRGGBB` color.
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value)
}

fn ensure_not_empty(is_empty: bool) -> Result<(), ValidationError> {
    if is_empty {
        return Err(ValidationError::single(
            "body",
            "At least one field required",
        ));
    }
    Ok(())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        is_hex_color, normalize_event_patch, normalize_new_event, normalize_new_participant,
        normalize_new_tag, normalize_participant_patch, normalize_tag_patch,
    };
    use crate::model::event::{EventPatch, NewEvent};
    use crate::model::participant::{NewParticipant, ParticipantPatch};
    use crate::model::tag::{NewTag, TagPatch};
    use chrono::{TimeZone, Utc};

    fn sample_event() -> NewEvent {
        NewEvent::new(
            "Rust Meetup",
            "Berlin",
            Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn hex_color_requires_six_digits() {
        assert!(is_hex_color("#3B82F6"));
        assert!(is_hex_color("#abcdef"));
        assert!(!is_hex_color("3B82F6"));
        assert!(!is_hex_color("#3B82F"));
        assert!(!is_hex_color("#3B82FG"));
    }

    #[test]
    fn new_event_requires_title_and_location() {
        let mut input = sample_event();
        input.title = "  ".to_string();
        input.location = None;

        let err = normalize_new_event(&input).unwrap_err();
        assert!(err.has_field("title"));
        assert!(err.has_field("location"));
        assert_eq!(err.issues().len(), 2);
    }

    #[test]
    fn new_event_normalizes_blank_optionals() {
        let mut input = sample_event();
        input.description = Some(String::new());
        input.image_url = Some(String::new());

        let normalized = normalize_new_event(&input).unwrap();
        assert_eq!(normalized.description, None);
        assert_eq!(normalized.image_url, None);
    }

    #[test]
    fn new_event_rejects_bad_url_and_capacity() {
        let mut input = sample_event();
        input.image_url = Some("not a url".to_string());
        input.max_participants = Some(0);

        let err = normalize_new_event(&input).unwrap_err();
        assert!(err.has_field("image_url"));
        assert!(err.has_field("max_participants"));
    }

    #[test]
    fn new_event_rejects_overlong_title() {
        let mut input = sample_event();
        input.title = "x".repeat(256);
        assert!(normalize_new_event(&input).unwrap_err().has_field("title"));

        input.title = "x".repeat(255);
        assert!(normalize_new_event(&input).is_ok());
    }

    #[test]
    fn empty_patches_are_rejected() {
        assert!(normalize_event_patch(&EventPatch::default())
            .unwrap_err()
            .has_field("body"));
        assert!(normalize_participant_patch(&ParticipantPatch::default())
            .unwrap_err()
            .has_field("body"));
        assert!(normalize_tag_patch(&TagPatch::default())
            .unwrap_err()
            .has_field("body"));
    }

    #[test]
    fn event_patch_turns_blank_description_into_clear() {
        let patch = EventPatch {
            description: Some(Some(String::new())),
            ..EventPatch::default()
        };
        let normalized = normalize_event_patch(&patch).unwrap();
        assert_eq!(normalized.description, Some(None));
    }

    #[test]
    fn participant_requires_valid_email() {
        let input = NewParticipant::new("Ada", "Lovelace", "ada.example.com");
        let err = normalize_new_participant(&input).unwrap_err();
        assert!(err.has_field("email"));
        assert!(err.to_string().contains("Invalid email format"));
    }

    #[test]
    fn participant_phone_limit_is_enforced() {
        let mut input = NewParticipant::new("Ada", "Lovelace", "ada@example.com");
        input.phone = Some("1".repeat(51));
        assert!(normalize_new_participant(&input)
            .unwrap_err()
            .has_field("phone"));
    }

    #[test]
    fn tag_requires_name_and_hex_color() {
        let err = normalize_new_tag(&NewTag::new("", "blue")).unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("color"));

        assert!(normalize_new_tag(&NewTag::new("Workshop", "#3B82F6")).is_ok());
    }

    #[test]
    fn whitespace_only_names_count_as_missing() {
        let err = normalize_new_participant(&NewParticipant::new(" ", "\t", "ada@example.com"))
            .unwrap_err();
        assert!(err.has_field("first_name"));
        assert!(err.has_field("last_name"));

        let err = normalize_new_tag(&NewTag::new("   ", "#3B82F6")).unwrap_err();
        assert_eq!(err.issues()[0].message, "Tag name is required");
    }
}
