//! Server-side login sessions.

use crate::error::DbError;
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub email: String,
    /// Display name reported by the identity provider at login.
    pub name: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
}

pub trait SessionRepository {
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Starts a session for `email` with a fresh random token.
    fn create(
        &self,
        email: &str,
        name: Option<&str>,
        now: i64,
    ) -> impl Future<Output = Result<Session, DbError>> + Send;

    /// The session behind `token` if it was created at or after `not_before`.
    fn find_valid(
        &self,
        token: &str,
        not_before: i64,
    ) -> impl Future<Output = Result<Option<Session>, DbError>> + Send;

    /// Returns whether a session was removed.
    fn revoke(&self, token: &str) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Deletes sessions created before `not_before`. Returns how many.
    fn purge_expired(&self, not_before: i64) -> impl Future<Output = Result<u64, DbError>> + Send;
}
