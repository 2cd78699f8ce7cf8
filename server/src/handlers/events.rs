use axum::extract::{Path, State};
use axum::response::Response;

use crate::auth::AuthUser;
use crate::models::{EventChanges, NewEvent};
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{parse_id, ApiJson};
use crate::utils::response::{created, success};

pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<NewEvent>,
) -> Result<Response, AppError> {
    tracing::debug!(user_id = %user.id, "Received event creation request");
    let event = state.events.create_event(user.id, input).await?;
    tracing::info!(event_id = %event.id, "Event created");
    Ok(created(event))
}

pub async fn list_events(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Response, AppError> {
    let events = state.events.list_events().await?;
    Ok(success(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "event")?;
    let event = state.events.get_event(id).await?;
    Ok(success(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiJson(changes): ApiJson<EventChanges>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "event")?;
    let event = state.events.update_event(id, changes).await?;
    Ok(success(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "event")?;
    let ack = state.events.delete_event(id).await?;
    Ok(success(ack))
}
