//! Persistence for event aggregates.
//!
//! Every write replaces the whole aggregate. Lost updates are caught with
//! the per-event `revision`: [`EventStore::save`] only succeeds when the
//! stored revision still matches the one the caller loaded.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event not found")]
    NotFound,

    #[error("event {id} changed since revision {expected}")]
    Conflict { id: Uuid, expected: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: &Event) -> Result<(), StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    /// All events in insertion order.
    async fn list(&self) -> Result<Vec<Event>, StoreError>;

    /// Writes `event` back if nobody saved it since it was loaded at
    /// `event.revision`. Returns the new revision.
    ///
    /// Fails with [`StoreError::Conflict`] on a stale revision and with
    /// [`StoreError::NotFound`] if the event was deleted in the meantime.
    async fn save(&self, event: &Event) -> Result<i64, StoreError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Looks up user profiles; unknown ids are simply absent from the map.
    async fn find_users(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>, StoreError>;
}
