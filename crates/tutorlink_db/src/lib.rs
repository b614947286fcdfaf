//! Persistence for Tutorlink
//!
//! People, time slots, carts and login sessions stored through an `sqlx::Any`
//! pool. SQLite is the default backend; enable the `postgres` feature to run
//! against PostgreSQL. Tables are created idempotently by [`Store::init_schema`].
//!
//! # Example
//!
//! ```rust,no_run
//! use tutorlink_config::AppConfig;
//! use tutorlink_db::{PersonRepository, Store};
//! use std::sync::Arc;
//!
//! async fn teachers() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(AppConfig::default());
//!     let store = Store::connect(&config).await?;
//!     for teacher in store.persons.list_teachers().await? {
//!         println!("{}", teacher.email);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;
pub mod store;

pub use client::{DbClient, DbTransaction, Dialect};
pub use error::DbError;
pub use repositories::{
    Cart, CartRepository, Checkout, NewTimeSlot, Person, PersonRepository, Role, Session,
    SessionRepository, SqlCartRepository, SqlPersonRepository, SqlSessionRepository,
    SqlTimeSlotRepository, TimeSlot, TimeSlotQuery, TimeSlotRepository,
};
pub use store::Store;
