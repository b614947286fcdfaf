//! Bundle of every repository over one shared pool
//!
//! Services keep a `Store` in their state instead of wiring repositories one by one.

use crate::client::DbClient;
use crate::error::DbError;
use crate::repositories::{
    CartRepository, PersonRepository, SessionRepository, SqlCartRepository, SqlPersonRepository,
    SqlSessionRepository, SqlTimeSlotRepository, TimeSlotRepository,
};
use std::sync::Arc;
use tracing::{debug, info};
use tutorlink_config::AppConfig;

#[derive(Debug, Clone)]
pub struct Store {
    pub persons: SqlPersonRepository,
    pub time_slots: SqlTimeSlotRepository,
    pub carts: SqlCartRepository,
    pub sessions: SqlSessionRepository,
    db_client: DbClient,
}

impl Store {
    pub fn new(db_client: DbClient) -> Self {
        Self {
            persons: SqlPersonRepository::new(db_client.clone()),
            time_slots: SqlTimeSlotRepository::new(db_client.clone()),
            carts: SqlCartRepository::new(db_client.clone()),
            sessions: SqlSessionRepository::new(db_client.clone()),
            db_client,
        }
    }

    /// Connects using the `[database]` section and creates missing tables.
    pub async fn connect(config: &Arc<AppConfig>) -> Result<Self, DbError> {
        let store = Self::new(DbClient::new(config).await?);
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory SQLite database with the schema in place.
    pub async fn in_memory() -> Result<Self, DbError> {
        let store = Self::new(DbClient::from_url("sqlite::memory:").await?);
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Creating tables on {}", self.db_client);
        self.persons.init_schema().await?;
        self.time_slots.init_schema().await?;
        self.carts.init_schema().await?;
        self.sessions.init_schema().await?;
        info!("Database schema ready");
        Ok(())
    }

    pub fn db_client(&self) -> &DbClient {
        &self.db_client
    }
}
