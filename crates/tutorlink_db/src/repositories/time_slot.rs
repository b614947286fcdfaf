//! Tutoring time slots offered by teachers.

use crate::error::DbError;
use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeSlot {
    pub id: i64,
    pub teacher_email: String,
    /// Start of the session, UTC unix seconds.
    #[cfg_attr(feature = "openapi", schema(example = 1767261600))]
    pub start_time: i64,
    pub subject: Option<String>,
    /// Email of the student holding the slot, if any.
    pub claimed_by: Option<String>,
}

impl TimeSlot {
    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTimeSlot {
    pub teacher_email: String,
    pub start_time: i64,
    pub subject: Option<String>,
}

/// Search filters. Unset fields do not constrain the result.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlotQuery {
    pub teacher_email: Option<String>,
    pub subject: Option<String>,
    pub min_start_time: Option<i64>,
    pub max_start_time: Option<i64>,
    pub must_be_unclaimed: bool,
}

impl Default for TimeSlotQuery {
    fn default() -> Self {
        Self {
            teacher_email: None,
            subject: None,
            min_start_time: None,
            max_start_time: None,
            must_be_unclaimed: true,
        }
    }
}

pub trait TimeSlotRepository {
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    fn add_time_slot(
        &self,
        slot: NewTimeSlot,
    ) -> impl Future<Output = Result<TimeSlot, DbError>> + Send;

    fn find_by_id(&self, id: i64) -> impl Future<Output = Result<Option<TimeSlot>, DbError>> + Send;

    /// Changes start time and/or subject of an unclaimed slot owned by `teacher_email`.
    /// Fails with `Conflict` when the slot was claimed or changed owner meanwhile.
    fn update_time_slot(
        &self,
        id: i64,
        teacher_email: &str,
        start_time: Option<i64>,
        subject: Option<String>,
    ) -> impl Future<Output = Result<TimeSlot, DbError>> + Send;

    /// Matching slots ordered by start time.
    fn search(
        &self,
        query: &TimeSlotQuery,
    ) -> impl Future<Output = Result<Vec<TimeSlot>, DbError>> + Send;

    /// Assigns an unclaimed slot to `student_email`. Fails with `NotFound` or
    /// `Conflict` (already claimed); never overwrites an existing claim.
    fn claim(
        &self,
        id: i64,
        student_email: &str,
    ) -> impl Future<Output = Result<TimeSlot, DbError>> + Send;
}
