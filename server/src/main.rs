use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use event_planner_server::config::Config;
use event_planner_server::routes::{create_routes, AppState};
use event_planner_server::store::{EventStore, MemoryEventStore, PgEventStore};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("event_planner_server=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let store: Arc<dyn EventStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgEventStore::connect(url, config.db_max_connections)
                .await
                .expect("Failed to connect to database"),
        ),
        None => {
            tracing::warn!("DATABASE_URL not set, events are kept in memory only");
            Arc::new(MemoryEventStore::new())
        }
    };

    let app = create_routes(AppState::new(store, &config), &config);

    let addr = config.addr();
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
