use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::models::{Attendee, NewAttendee};
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{child_id, parse_id, ApiJson};
use crate::utils::response::{created, success};

#[derive(Serialize)]
struct AttendeeList {
    attendees: Vec<Attendee>,
}

pub async fn list_event_attendees(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    let attendees = state.events.list_event_attendees(event_id).await?;
    Ok(success(AttendeeList { attendees }))
}

pub async fn add_attendee(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(event_id): Path<String>,
    ApiJson(input): ApiJson<NewAttendee>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    let event = state.events.add_attendee_to_event(event_id, input).await?;
    Ok(created(event))
}

/// `POST /api/attendees/:eventId`, kept for older clients. Answers 200.
pub async fn add_attendee_legacy(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(event_id): Path<String>,
    ApiJson(input): ApiJson<NewAttendee>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    let event = state.events.add_attendee_to_event(event_id, input).await?;
    tracing::info!(%event_id, "Added attendee to event");
    Ok(success(event))
}

pub async fn remove_attendee(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((event_id, attendee_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    let event = match child_id(&attendee_id) {
        Some(attendee_id) => {
            state
                .events
                .remove_attendee_from_event(event_id, attendee_id)
                .await?
        }
        None => {
            tracing::warn!(%event_id, %attendee_id, "Attendee id matches no attendee");
            state.events.get_event(event_id).await?
        }
    };
    Ok(success(event))
}

pub async fn list_all_attendees(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Response, AppError> {
    let attendees = state.events.list_all_attendees().await?;
    Ok(success(AttendeeList { attendees }))
}
