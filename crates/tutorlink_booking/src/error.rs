// --- File: crates/tutorlink_booking/src/error.rs ---
use thiserror::Error;
use tutorlink_common::{HttpStatusCode, TutorlinkError};
use tutorlink_db::DbError;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' is invalid: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// The caller has no person record yet
    #[error("{0} is not registered")]
    NotRegistered(String),

    #[error("Only teachers can offer time slots")]
    NotTeacher,

    #[error("Time slot {0} belongs to another teacher")]
    NotOwner(i64),

    #[error("Time slot {0} does not exist")]
    SlotNotFound(i64),

    #[error("Time slot {0} is already claimed")]
    AlreadyClaimed(i64),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::MissingField(_) | BookingError::InvalidField { .. } => 400,
            BookingError::NotTeacher | BookingError::NotOwner(_) => 403,
            BookingError::NotRegistered(_) | BookingError::SlotNotFound(_) => 404,
            BookingError::AlreadyClaimed(_) => 409,
            BookingError::Db(e) => e.status_code(),
        }
    }
}

impl From<BookingError> for TutorlinkError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::MissingField(_) | BookingError::InvalidField { .. } => {
                TutorlinkError::ValidationError(err.to_string())
            }
            BookingError::NotTeacher | BookingError::NotOwner(_) => {
                TutorlinkError::ForbiddenError(err.to_string())
            }
            BookingError::NotRegistered(email) => {
                TutorlinkError::NotFoundError(format!("person {}", email))
            }
            BookingError::SlotNotFound(id) => {
                TutorlinkError::NotFoundError(format!("time slot {}", id))
            }
            BookingError::AlreadyClaimed(_) => TutorlinkError::ConflictError(err.to_string()),
            BookingError::Db(e) => e.into(),
        }
    }
}
