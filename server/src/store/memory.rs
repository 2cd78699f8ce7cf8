use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, StoreError};
use crate::models::{Event, User};

/// In-process store for tests and for running without Postgres.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<IndexMap<Uuid, Event>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        self.events.write().await.insert(event.id, event.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.events.read().await.values().cloned().collect())
    }

    async fn save(&self, event: &Event) -> Result<i64, StoreError> {
        let mut events = self.events.write().await;
        let stored = events.get_mut(&event.id).ok_or(StoreError::NotFound)?;
        if stored.revision != event.revision {
            return Err(StoreError::Conflict {
                id: event.id,
                expected: event.revision,
            });
        }

        let revision = event.revision + 1;
        *stored = Event {
            revision,
            ..event.clone()
        };
        Ok(revision)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.events.write().await.shift_remove(&id).is_some())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>, StoreError> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|user| (*id, user.clone())))
            .collect())
    }
}
