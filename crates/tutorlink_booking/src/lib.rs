// --- File: crates/tutorlink_booking/src/lib.rs ---
//! Students, teachers and their time slots.
//!
//! Teachers offer slots, students search them, collect them in a cart or
//! claim them directly. Paying for a cart lives in `tutorlink-stripe`.

#[cfg(feature = "openapi")]
pub mod doc;
pub mod error;
pub mod handlers;
#[cfg(test)]
mod handlers_test;
pub mod logic;
pub mod routes;

pub use error::BookingError;
pub use handlers::BookingState;
pub use routes::routes;
