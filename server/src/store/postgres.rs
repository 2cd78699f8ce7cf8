use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{EventStore, StoreError};
use crate::models::{Attendee, Children, Event, Task, User};

/// One row per aggregate; attendees and tasks live in JSONB columns.
#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    description: String,
    location: String,
    date: DateTime<Utc>,
    image: String,
    attendees: Json<Children<Attendee>>,
    tasks: Json<Children<Task>>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: i64,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            name: row.name,
            description: row.description,
            location: row.location,
            date: row.date,
            image: row.image,
            attendees: row.attendees.0,
            tasks: row.tasks.0,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            revision: row.revision,
        }
    }
}

const EVENT_COLUMNS: &str = "id, name, description, location, date, image, attendees, tasks, \
                             created_by, created_at, updated_at, revision";

#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and brings the schema up to date.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!("Successfully connected to database");

        sqlx::migrate!().run(&pool).await?;

        tracing::info!("Migrations run successfully");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events
                (id, name, description, location, date, image, attendees, tasks,
                 created_by, created_at, updated_at, revision)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date)
        .bind(&event.image)
        .bind(Json(&event.attendees))
        .bind(Json(&event.tasks))
        .bind(event.created_by)
        .bind(event.created_at)
        .bind(event.updated_at)
        .bind(event.revision)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Event::from))
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn save(&self, event: &Event) -> Result<i64, StoreError> {
        let revision = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE events
            SET name = $3, description = $4, location = $5, date = $6, image = $7,
                attendees = $8, tasks = $9, updated_at = $10, revision = revision + 1
            WHERE id = $1 AND revision = $2
            RETURNING revision
            "#,
        )
        .bind(event.id)
        .bind(event.revision)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date)
        .bind(&event.image)
        .bind(Json(&event.attendees))
        .bind(Json(&event.tasks))
        .bind(event.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(revision) = revision {
            return Ok(revision);
        }

        // Nothing matched: either someone saved first or the row is gone.
        let exists = sqlx::query_scalar::<_, i64>("SELECT revision FROM events WHERE id = $1")
            .bind(event.id)
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Err(StoreError::Conflict {
                id: event.id,
                expected: event.revision,
            }),
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, User>, StoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }
}
