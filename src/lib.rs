pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod routes;
pub mod views;

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{load_session, CurrentUser, SessionGateway};
pub use db::{MemoryUserStore, PgUserStore, User, UserStore};

const MEMORY_STORE_URL: &str = "memory://";

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub users: Arc<dyn UserStore>,
    pub gateway: Arc<SessionGateway>,
}

impl AppState {
    /// Opens the configured user store (running migrations for Postgres)
    /// and wires the session gateway to it.
    pub async fn new(config: Settings) -> Result<Self> {
        let users: Arc<dyn UserStore> = if config.database.url == MEMORY_STORE_URL {
            info!("Using in-memory user store");
            Arc::new(MemoryUserStore::new())
        } else {
            let store = PgUserStore::new_with_options(
                &config.database.url,
                config.database.max_connections,
                Duration::from_secs(5),
            )
            .await?;
            store.migrate().await?;
            info!("Connected to Postgres user store");
            Arc::new(store)
        };

        Ok(Self::with_store(config, users))
    }

    pub fn with_store(config: Settings, users: Arc<dyn UserStore>) -> Self {
        let gateway = SessionGateway::new(users.clone(), &config.auth);
        Self {
            config: Arc::new(config),
            users,
            gateway: Arc::new(gateway),
        }
    }
}
