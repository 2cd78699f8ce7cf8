use axum::extract::{Path, State};
use axum::response::Response;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::models::{NewTask, TaskChanges};
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{child_id, parse_id, ApiJson};
use crate::utils::response::{created, success, Ack};

#[derive(Serialize)]
struct TaskList<T> {
    tasks: Vec<T>,
}

pub async fn list_event_tasks(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    tracing::debug!(%event_id, "Fetching tasks for event");
    let tasks = state.events.list_event_tasks(event_id).await?;
    Ok(success(TaskList { tasks }))
}

/// Responds with the created task alone, not the whole event.
pub async fn create_task(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(event_id): Path<String>,
    ApiJson(input): ApiJson<NewTask>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    let event = state.events.add_task_to_event(event_id, input).await?;

    let task = event
        .tasks
        .last()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Task missing after insert".to_string()))?;

    tracing::info!(%event_id, task_id = %task.id, "Task created for event");
    Ok(created(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((event_id, task_id)): Path<(String, String)>,
    ApiJson(changes): ApiJson<TaskChanges>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    let task_id = parse_id(&task_id, "task")?;
    let task = state
        .events
        .update_task_in_event(event_id, task_id, changes)
        .await?;
    Ok(success(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((event_id, task_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&event_id, "event")?;
    let ack = match child_id(&task_id) {
        Some(task_id) => state.events.delete_task_from_event(event_id, task_id).await?,
        None => {
            tracing::warn!(%event_id, %task_id, "Task id matches no task");
            state.events.get_event(event_id).await?;
            Ack::ok()
        }
    };
    Ok(success(ack))
}

pub async fn list_all_tasks(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Response, AppError> {
    let tasks = state.events.list_all_tasks().await?;
    Ok(success(TaskList { tasks }))
}
