pub mod attendee;
pub mod children;
pub mod date;
pub mod event;
pub mod task;
pub mod user;

pub use attendee::{Attendee, NewAttendee};
pub use children::{Children, Identified};
pub use event::{Event, EventChanges, EventView, NewEvent};
pub use task::{Assignee, EventTaskView, NewTask, Task, TaskChanges, TaskStatus, TaskView};
pub use user::User;

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::utils::error::AppError;

/// Trims a required text field and rejects it when nothing is left.
pub(crate) fn required_text(
    model: &str,
    field: &str,
    value: Option<String>,
) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(model, field)),
    }
}

/// Like [`required_text`] but stores the value as sent.
pub(crate) fn required_raw(
    model: &str,
    field: &str,
    value: Option<String>,
) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(model, field)),
    }
}

pub(crate) fn missing(model: &str, field: &str) -> AppError {
    AppError::ValidationError(format!("{model} validation failed: {field} is required"))
}

/// `assignedTo` as sent by forms: absent, `null` and `""` all mean nobody.
pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => Uuid::parse_str(raw.trim())
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{raw}'"))),
        None => Ok(None),
    }
}

/// Like [`optional_id`] for partial updates: the outer `Option` tells
/// "field absent" apart from "field cleared". Pair with `#[serde(default)]`.
pub(crate) fn patch_id<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_id(deserializer).map(Some)
}

/// Partial-update field: absent stays `None`, an explicit `null` arrives as
/// `Some(None)`. Pair with `#[serde(default)]`.
pub(crate) fn patch<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
