//! Tutorlink service assembly.
//!
//! [`AppState`] gathers configuration, the store and external services;
//! [`build_router`] turns it into the application served by `main`.

pub mod app;
pub mod app_state;
pub mod error;
pub mod seed;
pub mod service_factory;

pub use app::build_router;
pub use app_state::{AppState, AppStateBuilder};
pub use error::StartupError;
pub use service_factory::TutorlinkServiceFactory;
