// --- File: crates/services/tutorlink_backend/src/app_state.rs ---
use crate::error::StartupError;
use crate::service_factory::TutorlinkServiceFactory;
use std::sync::Arc;
use tracing::info;
use tutorlink_auth::SessionManager;
use tutorlink_config::AppConfig;
use tutorlink_db::Store;

/// Everything the routers share: configuration, the store, the session
/// manager and the external services.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub sessions: Arc<SessionManager>,
    pub services: TutorlinkServiceFactory,
}

/// Builder for AppState. Tests use it to swap in an in-memory store and fakes.
pub struct AppStateBuilder {
    config: Arc<AppConfig>,
    store: Store,
    services: Option<TutorlinkServiceFactory>,
}

impl AppStateBuilder {
    pub fn new(config: Arc<AppConfig>, store: Store) -> Self {
        Self {
            config,
            store,
            services: None,
        }
    }

    pub fn with_services(mut self, services: TutorlinkServiceFactory) -> Self {
        self.services = Some(services);
        self
    }

    /// Builds the state. Services default to what the configuration enables.
    pub fn build(self) -> Result<AppState, StartupError> {
        let sessions = SessionManager::new(&self.config.session, self.store.sessions.clone())?;
        let services = match self.services {
            Some(services) => services,
            None => TutorlinkServiceFactory::from_config(&self.config)?,
        };

        Ok(AppState {
            config: self.config,
            store: self.store,
            sessions: Arc::new(sessions),
            services,
        })
    }
}

impl AppState {
    pub fn builder(config: Arc<AppConfig>, store: Store) -> AppStateBuilder {
        AppStateBuilder::new(config, store)
    }

    /// Connects the database and builds every configured service.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, StartupError> {
        let store = Store::connect(&config).await?;
        info!("Connected to {}", store.db_client());
        Self::builder(config, store).build()
    }
}
