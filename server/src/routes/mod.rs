use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::JwtVerifier;
use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{attendees, events, health_check, tasks};
use crate::services::EventService;
use crate::store::EventStore;

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, config: &Config) -> Self {
        Self {
            events: EventService::with_write_attempts(store, config.write_attempts),
            jwt: Arc::new(JwtVerifier::new(&config.jwt_secret)),
        }
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/:id/attendees",
            get(attendees::list_event_attendees).post(attendees::add_attendee),
        )
        .route(
            "/events/:id/attendees/:attendee_id",
            delete(attendees::remove_attendee),
        )
        .route(
            "/events/:id/tasks",
            get(tasks::list_event_tasks).post(tasks::create_task),
        )
        .route(
            "/events/:id/tasks/:task_id",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/attendees", get(attendees::list_all_attendees))
        .route("/attendees/:id", post(attendees::add_attendee_legacy))
        .route("/tasks", get(tasks::list_all_tasks))
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config))
        .layer(create_cors_layer(&config.cors_allowed_origins))
}
