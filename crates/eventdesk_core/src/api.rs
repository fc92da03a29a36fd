//! Response envelopes for the routing layer.
//!
//! # Responsibility
//! - Render service outcomes into `{success, message, data, errors}` bodies
//!   with the matching HTTP status code.
//! - Parse path/body ids with the positive-integer rule.
//!
//! # Invariants
//! - Every failure renders `success=false` with a non-empty `message`.
//! - Store failures are the only outcome carrying an `error` detail.

use crate::model::EntityKind;
use crate::service::{ServiceError, REQUIRED_FIELD_MISSING};
use crate::validation::FieldIssue;
use serde::Serialize;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// JSON body shared by every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status code plus body, ready for a transport to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply<T> {
    pub status: u16,
    pub body: ApiResponse<T>,
}

/// How a successful outcome is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Success {
    /// 200 with `data` only (list/detail reads).
    Data,
    /// 201 with message and `data`.
    Created(&'static str),
    /// 201 with message only (association adds).
    CreatedMessage(&'static str),
    /// 200 with message and `data`.
    Updated(&'static str),
    /// 200 with message only (deletes, association removes).
    Message(&'static str),
}

/// Renders a service result. `action` names the operation in 500 messages,
/// e.g. `"loading events"`.
pub fn respond<T>(
    result: Result<T, ServiceError>,
    success: Success,
    action: &str,
) -> ApiReply<T> {
    match result {
        Ok(data) => render_success(data, success),
        Err(err) => from_error(&err, action),
    }
}

/// Renders one service error.
pub fn from_error<T>(err: &ServiceError, action: &str) -> ApiReply<T> {
    match err {
        ServiceError::Validation(validation) => {
            let message = match validation.issues() {
                [only] if only.message == REQUIRED_FIELD_MISSING => REQUIRED_FIELD_MISSING,
                _ => "Validation error",
            };
            ApiReply {
                status: STATUS_BAD_REQUEST,
                body: ApiResponse {
                    errors: Some(validation.issues().to_vec()),
                    ..failure(message)
                },
            }
        }
        ServiceError::NotFound { entity, .. } => ApiReply {
            status: STATUS_NOT_FOUND,
            body: failure(format!("{} not found", entity.label())),
        },
        ServiceError::Conflict(message) => ApiReply {
            status: STATUS_CONFLICT,
            body: failure(message.clone()),
        },
        ServiceError::Repo(_) | ServiceError::InconsistentState(_) => ApiReply {
            status: STATUS_INTERNAL_ERROR,
            body: ApiResponse {
                error: Some(err.to_string()),
                ..failure(format!("Error {action}"))
            },
        },
    }
}

/// Parses an id from a path segment or body value. Only positive integers
/// are accepted.
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// 400 reply for an id that failed [`parse_id`].
pub fn invalid_id<T>(entity: EntityKind) -> ApiReply<T> {
    ApiReply {
        status: STATUS_BAD_REQUEST,
        body: failure(format!(
            "Invalid {entity} ID. Must be a positive integer."
        )),
    }
}

fn render_success<T>(data: T, success: Success) -> ApiReply<T> {
    let (status, message, data) = match success {
        Success::Data => (STATUS_OK, None, Some(data)),
        Success::Created(message) => (STATUS_CREATED, Some(message), Some(data)),
        Success::CreatedMessage(message) => (STATUS_CREATED, Some(message), None),
        Success::Updated(message) => (STATUS_OK, Some(message), Some(data)),
        Success::Message(message) => (STATUS_OK, Some(message), None),
    };
    ApiReply {
        status,
        body: ApiResponse {
            success: true,
            message: message.map(str::to_string),
            data,
            errors: None,
            error: None,
        },
    }
}

fn failure<T>(message: impl Into<String>) -> ApiResponse<T> {
    ApiResponse {
        success: false,
        message: Some(message.into()),
        data: None,
        errors: None,
        error: None,
    }
}
