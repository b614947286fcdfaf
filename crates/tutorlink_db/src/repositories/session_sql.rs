//! SQL implementation of the session repository

use crate::error::DbError;
use crate::repositories::nullable_text;
use crate::repositories::session::{Session, SessionRepository};
use crate::DbClient;
use sqlx::Row;
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SqlSessionRepository {
    db_client: DbClient,
}

impl SqlSessionRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl SessionRepository for SqlSessionRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing session schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                name TEXT,
                created_at BIGINT NOT NULL
            )
        "#,
            )
            .await?;

        info!("Session schema initialized successfully");
        Ok(())
    }

    async fn create(
        &self,
        email: &str,
        name: Option<&str>,
        now: i64,
    ) -> Result<Session, DbError> {
        let token = Uuid::new_v4().to_string();
        debug!("Creating session for {}", email);

        let query = match name {
            Some(name) => sqlx::query(
                "INSERT INTO sessions (token, email, name, created_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(token.clone())
            .bind(email.to_string())
            .bind(name.to_string()),
            None => sqlx::query("INSERT INTO sessions (token, email, created_at) VALUES ($1, $2, $3)")
                .bind(token.clone())
                .bind(email.to_string()),
        };

        query
            .bind(now)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to create session for {}: {}", email, e);
                DbError::QueryError(e.to_string())
            })?;

        info!("Session started for {}", email);
        Ok(Session {
            token,
            email: email.to_string(),
            name: name.map(str::to_string),
            created_at: now,
        })
    }

    async fn find_valid(&self, token: &str, not_before: i64) -> Result<Option<Session>, DbError> {
        let row = sqlx::query(
            "SELECT token, email, name, created_at FROM sessions \
             WHERE token = $1 AND created_at >= $2",
        )
        .bind(token)
        .bind(not_before)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to look up session: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        row.map(|row| {
            Ok(Session {
                token: row.try_get("token")?,
                email: row.try_get("email")?,
                name: nullable_text(&row, "name")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn revoke(&self, token: &str) -> Result<bool, DbError> {
        let removed = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to revoke session: {}", e);
                DbError::QueryError(e.to_string())
            })?
            .rows_affected();

        if removed > 0 {
            info!("Session revoked");
        }
        Ok(removed > 0)
    }

    async fn purge_expired(&self, not_before: i64) -> Result<u64, DbError> {
        let removed = sqlx::query("DELETE FROM sessions WHERE created_at < $1")
            .bind(not_before)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to purge sessions: {}", e);
                DbError::QueryError(e.to_string())
            })?
            .rows_affected();

        debug!("Purged {} expired sessions", removed);
        Ok(removed)
    }
}
