//! Repository traits and their SQL implementations, one pair per entity.

pub mod cart;
pub mod cart_sql;
pub mod person;
pub mod person_sql;
pub mod session;
pub mod session_sql;
pub mod time_slot;
pub mod time_slot_sql;

pub use cart::{Cart, CartRepository, Checkout};
pub use cart_sql::SqlCartRepository;
pub use person::{Person, PersonRepository, Role};
pub use person_sql::SqlPersonRepository;
pub use session::{Session, SessionRepository};
pub use session_sql::SqlSessionRepository;
pub use time_slot::{NewTimeSlot, TimeSlot, TimeSlotQuery, TimeSlotRepository};
pub use time_slot_sql::SqlTimeSlotRepository;

use crate::error::DbError;
use sqlx::any::AnyRow;
use sqlx::{Row, ValueRef};

/// Reads a nullable text column. `sqlx::Any` refuses to decode NULL into
/// `Option<String>`, so NULL is checked on the raw value first.
pub(crate) fn nullable_text(row: &AnyRow, column: &str) -> Result<Option<String>, DbError> {
    if row.try_get_raw(column)?.is_null() {
        return Ok(None);
    }
    Ok(Some(row.try_get(column)?))
}
