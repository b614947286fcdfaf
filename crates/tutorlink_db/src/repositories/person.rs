//! People: students and teachers, keyed by email.

use crate::error::DbError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DbError> {
        match value {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(DbError::DecodeError(format!("unknown role '{}'", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Person {
    #[cfg_attr(feature = "openapi", schema(example = "ada@example.com"))]
    pub email: String,
    pub role: Role,
    pub name: String,
    /// Subjects taught. Always empty for students.
    pub subjects: Vec<String>,
    pub bio: String,
}

impl Person {
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

pub trait PersonRepository {
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Registers a new student. Fails with `Conflict` if the email is taken.
    fn add_student(
        &self,
        email: &str,
        name: &str,
    ) -> impl Future<Output = Result<Person, DbError>> + Send;

    /// Registers a new teacher directly. Fails with `Conflict` if the email is taken.
    fn add_teacher(
        &self,
        email: &str,
        name: &str,
        subjects: &[String],
        bio: &str,
    ) -> impl Future<Output = Result<Person, DbError>> + Send;

    /// Promotes an existing person to teacher. Fails with `NotFound` if unregistered.
    fn make_teacher(
        &self,
        email: &str,
        subjects: &[String],
        bio: &str,
    ) -> impl Future<Output = Result<Person, DbError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Person>, DbError>> + Send;

    fn list_teachers(&self) -> impl Future<Output = Result<Vec<Person>, DbError>> + Send;
}
