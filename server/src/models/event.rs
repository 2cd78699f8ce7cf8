use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    date, missing, patch, required_raw, required_text, Attendee, Children, NewAttendee, NewTask,
    Task, TaskChanges, TaskView, User,
};
use crate::utils::error::AppError;

/// Event aggregate root. Attendees and tasks have no life outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub image: String,
    pub attendees: Children<Attendee>,
    pub tasks: Children<Task>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the store on every successful save.
    pub revision: i64,
}

impl Event {
    pub fn create(created_by: Uuid, input: NewEvent) -> Result<Self, AppError> {
        let attendees = input
            .attendees
            .into_iter()
            .map(NewAttendee::into_attendee)
            .collect::<Result<Children<_>, _>>()?;
        let tasks = input
            .tasks
            .into_iter()
            .map(NewTask::into_task)
            .collect::<Result<Children<_>, _>>()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: required_text("Event", "name", input.name)?,
            description: required_text("Event", "description", input.description)?,
            location: required_text("Event", "location", input.location)?,
            date: input.date.ok_or_else(|| missing("Event", "date"))?,
            image: required_raw("Event", "image", input.image)?,
            attendees,
            tasks,
            created_by,
            created_at: now,
            updated_at: now,
            revision: 0,
        })
    }

    /// Applies a partial update. An explicit `null` on a required field is
    /// a validation error; `attendees` and `tasks` replace the whole list.
    pub fn apply(&mut self, changes: EventChanges) -> Result<(), AppError> {
        if let Some(name) = changes.name {
            self.name = required_text("Event", "name", name)?;
        }
        if let Some(description) = changes.description {
            self.description = required_text("Event", "description", description)?;
        }
        if let Some(location) = changes.location {
            self.location = required_text("Event", "location", location)?;
        }
        if let Some(date) = changes.date {
            self.date = date.ok_or_else(|| missing("Event", "date"))?;
        }
        if let Some(image) = changes.image {
            self.image = required_raw("Event", "image", image)?;
        }
        if let Some(attendees) = changes.attendees {
            self.attendees = attendees
                .unwrap_or_default()
                .into_iter()
                .map(NewAttendee::into_attendee)
                .collect::<Result<Children<_>, _>>()?;
        }
        if let Some(tasks) = changes.tasks {
            self.tasks = tasks
                .unwrap_or_default()
                .into_iter()
                .map(NewTask::into_task)
                .collect::<Result<Children<_>, _>>()?;
        }
        Ok(())
    }

    pub fn add_attendee(&mut self, input: NewAttendee) -> Result<Uuid, AppError> {
        let attendee = input.into_attendee()?;
        let id = attendee.id;
        self.attendees.push(attendee);
        Ok(id)
    }

    pub fn remove_attendee(&mut self, attendee_id: Uuid) -> Option<Attendee> {
        self.attendees.remove(attendee_id)
    }

    pub fn add_task(&mut self, input: NewTask) -> Result<Uuid, AppError> {
        let task = input.into_task()?;
        let id = task.id;
        self.tasks.push(task);
        Ok(id)
    }

    pub fn update_task(&mut self, task_id: Uuid, changes: TaskChanges) -> Result<(), AppError> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(AppError::task_not_found)?;
        task.apply(changes)
    }

    pub fn remove_task(&mut self, task_id: Uuid) -> Option<Task> {
        self.tasks.remove(task_id)
    }

    /// Ids of every user a task points at, for the assignee join.
    pub fn assignee_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.tasks.iter().filter_map(|task| task.assigned_to)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEvent {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "date::option::deserialize")]
    pub date: Option<DateTime<Utc>>,
    pub image: Option<String>,
    #[serde(default)]
    pub attendees: Vec<NewAttendee>,
    #[serde(default)]
    pub tasks: Vec<NewTask>,
}

/// Partial event update. Outer `None` leaves a field alone, `Some(None)`
/// is an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventChanges {
    #[serde(default, deserialize_with = "patch")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "date::patch::deserialize")]
    pub date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "patch")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch")]
    pub attendees: Option<Option<Vec<NewAttendee>>>,
    #[serde(default, deserialize_with = "patch")]
    pub tasks: Option<Option<Vec<NewTask>>>,
}

/// Event as returned to clients, with task assignees populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    pub image: String,
    pub attendees: Vec<Attendee>,
    pub tasks: Vec<TaskView>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventView {
    pub fn joined(event: Event, users: &HashMap<Uuid, User>) -> Self {
        let tasks = event
            .tasks
            .iter()
            .map(|task| TaskView::joined(task, users, &event.attendees))
            .collect();

        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            location: event.location,
            date: event.date,
            image: event.image,
            attendees: event.attendees.into_iter().collect(),
            tasks,
            created_by: event.created_by,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }

    pub fn task(&self, task_id: Uuid) -> Option<&TaskView> {
        self.tasks.iter().find(|task| task.id == task_id)
    }
}
