use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    date, missing, optional_id, patch, patch_id, required_text, Attendee, Children, Identified,
    User,
};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

/// Task as stored inside its event. `assigned_to` is a bare reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

impl Identified for Task {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Task {
    /// Shallow merge: only the fields present in `changes` are touched.
    pub fn apply(&mut self, changes: TaskChanges) -> Result<(), AppError> {
        if let Some(name) = changes.name {
            self.name = required_text("Task", "name", name)?;
        }
        if let Some(deadline) = changes.deadline {
            self.deadline = deadline.ok_or_else(|| missing("Task", "deadline"))?;
        }
        if let Some(status) = changes.status {
            self.status = status.ok_or_else(|| missing("Task", "status"))?;
        }
        if let Some(assigned_to) = changes.assigned_to {
            self.assigned_to = assigned_to;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "date::option::deserialize")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "optional_id")]
    pub assigned_to: Option<Uuid>,
}

impl NewTask {
    pub fn into_task(self) -> Result<Task, AppError> {
        Ok(Task {
            id: Uuid::new_v4(),
            name: required_text("Task", "name", self.name)?,
            deadline: self.deadline.ok_or_else(|| missing("Task", "deadline"))?,
            status: self.status.unwrap_or_default(),
            assigned_to: self.assigned_to,
        })
    }
}

/// Partial task update. `Some(None)` is an explicit `null`: it clears the
/// assignee and is rejected on the required fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    #[serde(default, deserialize_with = "patch")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "date::patch::deserialize")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "patch")]
    pub status: Option<Option<TaskStatus>>,
    #[serde(default, deserialize_with = "patch_id")]
    pub assigned_to: Option<Option<Uuid>>,
}

impl TaskChanges {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(Some(status)),
            ..Self::default()
        }
    }
}

/// The populated form of `assignedTo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub name: String,
    pub deadline: DateTime<Utc>,
    pub status: TaskStatus,
    pub assigned_to: Option<Assignee>,
}

impl TaskView {
    /// Resolves the assignee against users first, then against the
    /// attendees of the owning event. Dangling references render as null.
    pub fn joined(
        task: &Task,
        users: &HashMap<Uuid, User>,
        attendees: &Children<Attendee>,
    ) -> Self {
        let assigned_to = task.assigned_to.and_then(|id| {
            users
                .get(&id)
                .map(|user| Assignee {
                    id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                })
                .or_else(|| {
                    attendees.get(id).map(|attendee| Assignee {
                        id,
                        name: attendee.name.clone(),
                        email: attendee.email.clone(),
                    })
                })
        });

        Self {
            id: task.id,
            name: task.name.clone(),
            deadline: task.deadline,
            status: task.status,
            assigned_to,
        }
    }
}

/// A task listed outside its event, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTaskView {
    pub event_id: Uuid,
    pub event_name: String,
    #[serde(flatten)]
    pub task: TaskView,
}
