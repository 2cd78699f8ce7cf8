use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{
    Attendee, Event, EventChanges, EventTaskView, EventView, NewAttendee, NewEvent, NewTask,
    TaskChanges, TaskView, User,
};
use crate::store::{EventStore, StoreError};
use crate::utils::error::AppError;
use crate::utils::response::Ack;

pub const DEFAULT_WRITE_ATTEMPTS: u32 = 3;

/// Event CRUD plus the attendee and task mutators.
///
/// Child mutations load the whole aggregate, change it, and save it back
/// guarded by the aggregate's revision. A stale save is retried from a
/// fresh load up to `write_attempts` times.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    write_attempts: u32,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::with_write_attempts(store, DEFAULT_WRITE_ATTEMPTS)
    }

    pub fn with_write_attempts(store: Arc<dyn EventStore>, write_attempts: u32) -> Self {
        Self {
            store,
            write_attempts: write_attempts.max(1),
        }
    }

    pub async fn create_event(
        &self,
        created_by: Uuid,
        input: NewEvent,
    ) -> Result<EventView, AppError> {
        debug!(%created_by, "Creating new event");
        let result: Result<Event, AppError> = async {
            let event = Event::create(created_by, input)?;
            self.store.insert(&event).await?;
            Ok(event)
        }
        .await;

        let event = result.inspect_err(|e| error!(error = %e, "Error creating event"))?;
        info!(event_id = %event.id, "Created new event");
        self.join(event).await
    }

    pub async fn get_event(&self, id: Uuid) -> Result<EventView, AppError> {
        debug!(event_id = %id, "Getting event");
        let view = self
            .fetch_view(id)
            .await
            .inspect_err(|e| error!(event_id = %id, error = %e, "Error getting event"))?;
        info!(event_id = %id, "Retrieved event");
        Ok(view)
    }

    pub async fn list_events(&self) -> Result<Vec<EventView>, AppError> {
        debug!("Listing all events");
        let result: Result<Vec<EventView>, AppError> = async {
            let events = self.store.list().await?;
            self.join_all(events).await
        }
        .await;

        let views = result.inspect_err(|e| error!(error = %e, "Error listing events"))?;
        info!(count = views.len(), "Retrieved events");
        Ok(views)
    }

    pub async fn update_event(
        &self,
        id: Uuid,
        changes: EventChanges,
    ) -> Result<EventView, AppError> {
        debug!(event_id = %id, ?changes, "Updating event");
        let result: Result<EventView, AppError> = async {
            self.mutate(id, |event| event.apply(changes.clone())).await?;
            self.fetch_view(id).await
        }
        .await;

        let view = result.inspect_err(|e| {
            error!(event_id = %id, error = %e, "Error updating event")
        })?;
        info!(event_id = %id, "Updated event");
        Ok(view)
    }

    /// Deleting the aggregate takes its attendees and tasks with it.
    pub async fn delete_event(&self, id: Uuid) -> Result<Ack, AppError> {
        debug!(event_id = %id, "Deleting event");
        let result: Result<Ack, AppError> = async {
            if self.store.delete(id).await? {
                Ok(Ack::ok())
            } else {
                warn!(event_id = %id, "Event not found");
                Err(AppError::event_not_found())
            }
        }
        .await;

        let ack = result.inspect_err(|e| {
            error!(event_id = %id, error = %e, "Error deleting event")
        })?;
        info!(event_id = %id, "Deleted event");
        Ok(ack)
    }

    pub async fn add_attendee_to_event(
        &self,
        event_id: Uuid,
        input: NewAttendee,
    ) -> Result<EventView, AppError> {
        debug!(%event_id, ?input, "Adding attendee to event");
        let result: Result<EventView, AppError> = async {
            self.mutate(event_id, |event| event.add_attendee(input.clone()))
                .await?;
            self.fetch_view(event_id).await
        }
        .await;

        let view = result.inspect_err(|e| error!(%event_id, error = %e, "Error adding attendee"))?;
        info!(%event_id, "Added attendee to event");
        Ok(view)
    }

    /// Removing an attendee the event doesn't have leaves it unchanged and
    /// still succeeds.
    pub async fn remove_attendee_from_event(
        &self,
        event_id: Uuid,
        attendee_id: Uuid,
    ) -> Result<EventView, AppError> {
        debug!(%event_id, %attendee_id, "Removing attendee from event");
        let result: Result<EventView, AppError> = async {
            let removed = self
                .mutate(event_id, |event| Ok(event.remove_attendee(attendee_id)))
                .await?;
            if removed.is_none() {
                warn!(%event_id, %attendee_id, "Attendee not present on event");
            }
            self.fetch_view(event_id).await
        }
        .await;

        let view = result.inspect_err(|e| {
            error!(%event_id, error = %e, "Error removing attendee")
        })?;
        info!(%event_id, %attendee_id, "Removed attendee from event");
        Ok(view)
    }

    /// Returns the whole event; the new task is the last one in `tasks`.
    pub async fn add_task_to_event(
        &self,
        event_id: Uuid,
        input: NewTask,
    ) -> Result<EventView, AppError> {
        debug!(%event_id, ?input, "Adding task to event");
        let result: Result<EventView, AppError> = async {
            self.mutate(event_id, |event| event.add_task(input.clone()))
                .await?;
            self.fetch_view(event_id).await
        }
        .await;

        let view = result.inspect_err(|e| error!(%event_id, error = %e, "Error adding task"))?;
        info!(%event_id, "Added task to event");
        Ok(view)
    }

    pub async fn update_task_in_event(
        &self,
        event_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> Result<TaskView, AppError> {
        debug!(%event_id, %task_id, ?changes, "Updating task in event");
        let result: Result<TaskView, AppError> = async {
            self.mutate(event_id, |event| event.update_task(task_id, changes.clone()))
                .await?;
            let view = self.fetch_view(event_id).await?;
            // A concurrent writer may have dropped the task after our save.
            view.task(task_id).cloned().ok_or_else(AppError::task_not_found)
        }
        .await;

        let task = result.inspect_err(|e| {
            error!(%event_id, %task_id, error = %e, "Error updating task")
        })?;
        info!(%event_id, %task_id, "Updated task in event");
        Ok(task)
    }

    /// Succeeds whether or not the task existed, as long as the event does.
    pub async fn delete_task_from_event(
        &self,
        event_id: Uuid,
        task_id: Uuid,
    ) -> Result<Ack, AppError> {
        debug!(%event_id, %task_id, "Deleting task from event");
        let result = self
            .mutate(event_id, |event| Ok(event.remove_task(task_id)))
            .await;

        let removed = result.inspect_err(|e| {
            error!(%event_id, %task_id, error = %e, "Error deleting task")
        })?;
        if removed.is_none() {
            warn!(%event_id, %task_id, "Task not present on event");
        }
        info!(%event_id, %task_id, "Deleted task from event");
        Ok(Ack::ok())
    }

    pub async fn list_event_attendees(&self, event_id: Uuid) -> Result<Vec<Attendee>, AppError> {
        Ok(self.get_event(event_id).await?.attendees)
    }

    pub async fn list_event_tasks(&self, event_id: Uuid) -> Result<Vec<TaskView>, AppError> {
        Ok(self.get_event(event_id).await?.tasks)
    }

    /// Attendees across all events, one per email address (compared
    /// case-insensitively). The first occurrence wins.
    pub async fn list_all_attendees(&self) -> Result<Vec<Attendee>, AppError> {
        debug!("Listing attendees across events");
        let events = self
            .store
            .list()
            .await
            .inspect_err(|e| error!(error = %e, "Error listing attendees"))?;

        let mut seen = HashSet::new();
        let attendees: Vec<Attendee> = events
            .into_iter()
            .flat_map(|event| event.attendees.into_iter())
            .filter(|attendee| seen.insert(attendee.email.trim().to_lowercase()))
            .collect();

        info!(count = attendees.len(), "Retrieved attendees");
        Ok(attendees)
    }

    pub async fn list_all_tasks(&self) -> Result<Vec<EventTaskView>, AppError> {
        debug!("Listing tasks across events");
        let views = self.list_events().await?;

        let tasks: Vec<EventTaskView> = views
            .into_iter()
            .flat_map(|view| {
                let (event_id, event_name) = (view.id, view.name);
                view.tasks.into_iter().map(move |task| EventTaskView {
                    event_id,
                    event_name: event_name.clone(),
                    task,
                })
            })
            .collect();

        info!(count = tasks.len(), "Retrieved tasks");
        Ok(tasks)
    }

    /// Load, change, save. `change` may run more than once if another
    /// writer saves the same event in between; it must not have side
    /// effects outside the event.
    async fn mutate<F, R>(&self, event_id: Uuid, mut change: F) -> Result<R, AppError>
    where
        F: FnMut(&mut Event) -> Result<R, AppError> + Send,
        R: Send,
    {
        let mut attempt = 1;
        loop {
            let mut event = self.load(event_id).await?;
            let outcome = change(&mut event)?;
            event.updated_at = Utc::now();

            match self.store.save(&event).await {
                Ok(revision) => {
                    debug!(%event_id, revision, "Saved event");
                    return Ok(outcome);
                }
                Err(StoreError::Conflict { expected, .. }) if attempt < self.write_attempts => {
                    warn!(%event_id, expected, attempt, "Concurrent write detected, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn load(&self, id: Uuid) -> Result<Event, AppError> {
        match self.store.find(id).await? {
            Some(event) => Ok(event),
            None => {
                warn!(event_id = %id, "Event not found");
                Err(AppError::event_not_found())
            }
        }
    }

    async fn fetch_view(&self, id: Uuid) -> Result<EventView, AppError> {
        let event = self.load(id).await?;
        self.join(event).await
    }

    async fn join(&self, event: Event) -> Result<EventView, AppError> {
        let ids: Vec<Uuid> = event.assignee_ids().collect();
        let users = self.store.find_users(&ids).await?;
        Ok(EventView::joined(event, &users))
    }

    async fn join_all(&self, events: Vec<Event>) -> Result<Vec<EventView>, AppError> {
        let ids: Vec<Uuid> = events
            .iter()
            .flat_map(|event| event.assignee_ids())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let users: HashMap<Uuid, User> = self.store.find_users(&ids).await?;

        Ok(events
            .into_iter()
            .map(|event| EventView::joined(event, &users))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::store::MemoryEventStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn service() -> (EventService, Arc<MemoryEventStore>) {
        let store = Arc::new(MemoryEventStore::new());
        (EventService::new(store.clone()), store)
    }

    fn new_event() -> NewEvent {
        NewEvent {
            name: Some("Company Anniversary".into()),
            description: Some("Annual company celebration".into()),
            location: Some("Central Hall".into()),
            date: Some(Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap()),
            image: Some("https://images.example.com/anniversary.jpg".into()),
            ..NewEvent::default()
        }
    }

    fn new_task(name: &str) -> NewTask {
        NewTask {
            name: Some(name.into()),
            deadline: Some(Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()),
            ..NewTask::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let (service, _) = service();
        let owner = Uuid::new_v4();
        let input = new_event();

        let created = service.create_event(owner, input.clone()).await.unwrap();
        let fetched = service.get_event(created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(Some(fetched.name), input.name);
        assert_eq!(Some(fetched.description), input.description);
        assert_eq!(Some(fetched.location), input.location);
        assert_eq!(Some(fetched.date), input.date);
        assert_eq!(Some(fetched.image), input.image);
        assert_eq!(fetched.created_by, owner);
    }

    #[tokio::test]
    async fn test_create_without_name_is_validation_error() {
        let (service, _) = service();
        let input = NewEvent {
            name: None,
            ..new_event()
        };
        let err = service.create_event(Uuid::new_v4(), input).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(service.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_event_is_not_found() {
        let (service, _) = service();
        let err = service.get_event(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.public_message(), "Event not found");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        assert_eq!(service.delete_event(event.id).await.unwrap(), Ack::ok());
        assert!(matches!(
            service.get_event(event.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.delete_event(event.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_update_event_merges_and_revalidates() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        let updated = service
            .update_event(
                event.id,
                EventChanges {
                    location: Some(Some("Rooftop Terrace".into())),
                    ..EventChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.location, "Rooftop Terrace");
        assert_eq!(updated.name, event.name);

        let err = service
            .update_event(
                event.id,
                EventChanges {
                    image: Some(Some(String::new())),
                    ..EventChanges::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(
            service.get_event(event.id).await.unwrap().location,
            "Rooftop Terrace"
        );
    }

    #[tokio::test]
    async fn test_update_event_rejects_null_required_field() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        let changes: EventChanges = serde_json::from_str(r#"{"name": null}"#).unwrap();
        let err = service.update_event(event.id, changes).await.unwrap_err();
        assert_eq!(
            err.public_message(),
            "Event validation failed: name is required"
        );
        assert_eq!(service.get_event(event.id).await.unwrap().name, event.name);
    }

    #[tokio::test]
    async fn test_update_event_replaces_attendees() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        let changes: EventChanges = serde_json::from_str(
            r#"{"attendees": [{"name": "Jane Smith", "email": "jane@example.com"}]}"#,
        )
        .unwrap();
        let updated = service.update_event(event.id, changes).await.unwrap();
        assert_eq!(updated.attendees.len(), 1);
        assert_eq!(updated.attendees[0].email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_event_is_not_found() {
        let (service, _) = service();
        let err = service
            .update_event(Uuid::new_v4(), EventChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_attendee_grows_list_by_one() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        let updated = service
            .add_attendee_to_event(event.id, NewAttendee::new("John Doe", "john@example.com"))
            .await
            .unwrap();

        assert_eq!(updated.attendees.len(), event.attendees.len() + 1);
        assert!(updated
            .attendees
            .iter()
            .any(|a| a.name == "John Doe" && a.email == "john@example.com"));
    }

    #[tokio::test]
    async fn test_add_attendee_to_missing_event() {
        let (service, _) = service();
        let err = service
            .add_attendee_to_event(Uuid::new_v4(), NewAttendee::new("John Doe", "john@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_absent_attendee_is_noop() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();
        let event = service
            .add_attendee_to_event(event.id, NewAttendee::new("John Doe", "john@example.com"))
            .await
            .unwrap();

        let after = service
            .remove_attendee_from_event(event.id, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(after.attendees, event.attendees);
    }

    #[tokio::test]
    async fn test_remove_first_of_two_attendees() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();
        service
            .add_attendee_to_event(event.id, NewAttendee::new("John Doe", "john@example.com"))
            .await
            .unwrap();
        let with_both = service
            .add_attendee_to_event(event.id, NewAttendee::new("Jane Smith", "jane@example.com"))
            .await
            .unwrap();
        let (a1, a2) = (with_both.attendees[0].clone(), with_both.attendees[1].clone());

        service
            .remove_attendee_from_event(event.id, a1.id)
            .await
            .unwrap();

        assert_eq!(service.get_event(event.id).await.unwrap().attendees, vec![a2]);
    }

    #[tokio::test]
    async fn test_task_lifecycle_pending_to_completed() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        let with_task = service
            .add_task_to_event(event.id, new_task("Book venue"))
            .await
            .unwrap();
        let t1 = with_task.tasks.last().unwrap().clone();
        assert_eq!(t1.status, TaskStatus::Pending);

        let updated = service
            .update_task_in_event(event.id, t1.id, TaskChanges::status(TaskStatus::Completed))
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.name, t1.name);
        assert_eq!(updated.deadline, t1.deadline);
        assert_eq!(updated.assigned_to, t1.assigned_to);

        let tasks = service.get_event(event.id).await.unwrap().tasks;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_missing_task_is_not_found() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();
        let err = service
            .update_task_in_event(event.id, Uuid::new_v4(), TaskChanges::default())
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Task not found");
    }

    #[tokio::test]
    async fn test_update_task_rejects_null_required_field() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();
        let with_task = service
            .add_task_to_event(event.id, new_task("Book venue"))
            .await
            .unwrap();
        let task = with_task.tasks[0].clone();

        for body in [r#"{"deadline": null}"#, r#"{"name": null}"#, r#"{"status": null}"#] {
            let changes: TaskChanges = serde_json::from_str(body).unwrap();
            let err = service
                .update_task_in_event(event.id, task.id, changes)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)), "{body}");
        }

        let stored = service.get_event(event.id).await.unwrap().tasks;
        assert_eq!(stored, vec![task]);
    }

    #[tokio::test]
    async fn test_delete_task_acknowledges_even_when_absent() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();
        let with_task = service
            .add_task_to_event(event.id, new_task("Order catering"))
            .await
            .unwrap();
        let task_id = with_task.tasks[0].id;

        assert_eq!(
            service.delete_task_from_event(event.id, task_id).await.unwrap(),
            Ack::ok()
        );
        assert_eq!(
            service.delete_task_from_event(event.id, task_id).await.unwrap(),
            Ack::ok()
        );
        assert!(service.get_event(event.id).await.unwrap().tasks.is_empty());

        let err = service
            .delete_task_from_event(Uuid::new_v4(), task_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_assignee_is_populated_from_users() {
        let (service, store) = service();
        let user = User::new("John Doe", "john@example.com");
        store.insert_user(user.clone()).await;

        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();
        let mut task = new_task("Prepare presentation");
        task.assigned_to = Some(user.id);
        let view = service.add_task_to_event(event.id, task).await.unwrap();

        let assignee = view.tasks[0].assigned_to.clone().unwrap();
        assert_eq!(assignee.id, user.id);
        assert_eq!(assignee.name, "John Doe");
    }

    #[tokio::test]
    async fn test_all_attendees_dedupes_by_email() {
        let (service, _) = service();
        let first = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();
        let second = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        service
            .add_attendee_to_event(first.id, NewAttendee::new("John Doe", "john@example.com"))
            .await
            .unwrap();
        service
            .add_attendee_to_event(second.id, NewAttendee::new("Johnny", "John@Example.com"))
            .await
            .unwrap();
        service
            .add_attendee_to_event(second.id, NewAttendee::new("Jane Smith", "jane@example.com"))
            .await
            .unwrap();

        let names: Vec<String> = service
            .list_all_attendees()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["John Doe", "Jane Smith"]);
    }

    #[tokio::test]
    async fn test_all_tasks_carry_event_name() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();
        service
            .add_task_to_event(event.id, new_task("Book venue"))
            .await
            .unwrap();

        let tasks = service.list_all_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].event_id, event.id);
        assert_eq!(tasks[0].event_name, "Company Anniversary");
    }

    /// Lets the first `conflicts` saves fail as if another writer got there
    /// first.
    struct ContendedStore {
        inner: MemoryEventStore,
        conflicts: AtomicU32,
    }

    #[async_trait]
    impl EventStore for ContendedStore {
        async fn insert(&self, event: &Event) -> Result<(), StoreError> {
            self.inner.insert(event).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
            self.inner.find(id).await
        }

        async fn list(&self) -> Result<Vec<Event>, StoreError> {
            self.inner.list().await
        }

        async fn save(&self, event: &Event) -> Result<i64, StoreError> {
            let left = self.conflicts.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Conflict {
                    id: event.id,
                    expected: event.revision,
                });
            }
            self.inner.save(event).await
        }

        async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
            self.inner.delete(id).await
        }

        async fn find_users(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>, StoreError> {
            self.inner.find_users(ids).await
        }
    }

    #[tokio::test]
    async fn test_conflicting_save_is_retried() {
        let store = Arc::new(ContendedStore {
            inner: MemoryEventStore::new(),
            conflicts: AtomicU32::new(2),
        });
        let service = EventService::with_write_attempts(store, 3);
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        let updated = service
            .add_attendee_to_event(event.id, NewAttendee::new("John Doe", "john@example.com"))
            .await
            .unwrap();
        assert_eq!(updated.attendees.len(), 1);
    }

    #[tokio::test]
    async fn test_conflict_surfaces_after_retry_limit() {
        let store = Arc::new(ContendedStore {
            inner: MemoryEventStore::new(),
            conflicts: AtomicU32::new(5),
        });
        let service = EventService::with_write_attempts(store, 2);
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        let err = service
            .add_attendee_to_event(event.id, NewAttendee::new("John Doe", "john@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(service.get_event(event.id).await.unwrap().attendees.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_attendee_adds_are_not_lost() {
        let (service, _) = service();
        let event = service.create_event(Uuid::new_v4(), new_event()).await.unwrap();

        let event_id = event.id;
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .add_attendee_to_event(
                            event_id,
                            NewAttendee::new(format!("Guest {i}"), format!("guest{i}@example.com")),
                        )
                        .await
                })
            })
            .collect();

        let mut added = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                added += 1;
            }
        }

        // Every add either landed or reported a conflict; none vanished.
        let attendees = service.get_event(event_id).await.unwrap().attendees;
        assert_eq!(attendees.len(), added);
    }
}
