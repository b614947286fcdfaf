//! SQL implementation of the time slot repository

use crate::error::DbError;
use crate::repositories::nullable_text;
use crate::repositories::time_slot::{NewTimeSlot, TimeSlot, TimeSlotQuery, TimeSlotRepository};
use crate::DbClient;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info, warn};

const SLOT_COLUMNS: &str = "id, teacher_email, start_time, subject, claimed_by";

/// Value bound into a dynamically assembled statement.
enum Param {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone)]
pub struct SqlTimeSlotRepository {
    db_client: DbClient,
}

impl SqlTimeSlotRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

pub(crate) fn slot_from_row(row: &AnyRow) -> Result<TimeSlot, DbError> {
    Ok(TimeSlot {
        id: row.try_get("id")?,
        teacher_email: row.try_get("teacher_email")?,
        start_time: row.try_get("start_time")?,
        subject: nullable_text(row, "subject")?,
        claimed_by: nullable_text(row, "claimed_by")?,
    })
}

fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>,
    params: Vec<Param>,
) -> sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>> {
    for param in params {
        query = match param {
            Param::Text(value) => query.bind(value),
            Param::Int(value) => query.bind(value),
        };
    }
    query
}

impl TimeSlotRepository for SqlTimeSlotRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing time slot schema");

        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS time_slots (
                id {},
                teacher_email TEXT NOT NULL,
                start_time BIGINT NOT NULL,
                subject TEXT,
                claimed_by TEXT
            )
        "#,
            self.db_client.dialect().serial_primary_key()
        );
        self.db_client.execute(&query).await?;
        self.db_client
            .execute("CREATE INDEX IF NOT EXISTS idx_time_slots_start ON time_slots (start_time)")
            .await?;

        info!("Time slot schema initialized successfully");
        Ok(())
    }

    async fn add_time_slot(&self, slot: NewTimeSlot) -> Result<TimeSlot, DbError> {
        debug!(
            "Adding time slot for {} at {}",
            slot.teacher_email, slot.start_time
        );

        let mut params = vec![
            Param::Text(slot.teacher_email.clone()),
            Param::Int(slot.start_time),
        ];
        let query = match &slot.subject {
            Some(subject) => {
                params.push(Param::Text(subject.clone()));
                "INSERT INTO time_slots (teacher_email, start_time, subject) VALUES ($1, $2, $3) RETURNING id"
            }
            None => "INSERT INTO time_slots (teacher_email, start_time) VALUES ($1, $2) RETURNING id",
        };

        let row = bind_all(sqlx::query(query), params)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert time slot: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        let id: i64 = row.try_get("id")?;
        info!("Time slot {} created for {}", id, slot.teacher_email);
        Ok(TimeSlot {
            id,
            teacher_email: slot.teacher_email,
            start_time: slot.start_time,
            subject: slot.subject,
            claimed_by: None,
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<TimeSlot>, DbError> {
        debug!("Finding time slot {}", id);

        let query = format!("SELECT {} FROM time_slots WHERE id = $1", SLOT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find time slot {}: {}", id, e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(slot_from_row).transpose()
    }

    async fn update_time_slot(
        &self,
        id: i64,
        teacher_email: &str,
        start_time: Option<i64>,
        subject: Option<String>,
    ) -> Result<TimeSlot, DbError> {
        debug!("Updating time slot {} for {}", id, teacher_email);

        let mut assignments = Vec::new();
        let mut params = Vec::new();
        if let Some(start_time) = start_time {
            params.push(Param::Int(start_time));
            assignments.push(format!("start_time = ${}", params.len()));
        }
        if let Some(subject) = subject {
            params.push(Param::Text(subject));
            assignments.push(format!("subject = ${}", params.len()));
        }

        if !assignments.is_empty() {
            params.push(Param::Int(id));
            let id_pos = params.len();
            params.push(Param::Text(teacher_email.to_string()));
            let owner_pos = params.len();
            let query = format!(
                "UPDATE time_slots SET {} WHERE id = ${} AND teacher_email = ${} AND claimed_by IS NULL",
                assignments.join(", "),
                id_pos,
                owner_pos
            );

            let updated = bind_all(sqlx::query(&query), params)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| {
                    error!("Failed to update time slot {}: {}", id, e);
                    DbError::QueryError(e.to_string())
                })?
                .rows_affected();

            if updated == 0 {
                warn!("Time slot {} not updatable by {}", id, teacher_email);
                return Err(DbError::Conflict(format!(
                    "time slot {} can no longer be changed",
                    id
                )));
            }
            info!("Time slot {} updated", id);
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("time slot {}", id)))
    }

    async fn search(&self, filter: &TimeSlotQuery) -> Result<Vec<TimeSlot>, DbError> {
        debug!("Searching time slots: {:?}", filter);

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        if let Some(teacher_email) = &filter.teacher_email {
            params.push(Param::Text(teacher_email.clone()));
            conditions.push(format!("teacher_email = ${}", params.len()));
        }
        if let Some(subject) = &filter.subject {
            params.push(Param::Text(subject.clone()));
            conditions.push(format!("subject = ${}", params.len()));
        }
        if let Some(min) = filter.min_start_time {
            params.push(Param::Int(min));
            conditions.push(format!("start_time >= ${}", params.len()));
        }
        if let Some(max) = filter.max_start_time {
            params.push(Param::Int(max));
            conditions.push(format!("start_time <= ${}", params.len()));
        }
        if filter.must_be_unclaimed {
            conditions.push("claimed_by IS NULL".to_string());
        }

        let mut query = format!("SELECT {} FROM time_slots", SLOT_COLUMNS);
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY start_time, id");

        let rows = bind_all(sqlx::query(&query), params)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to search time slots: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(slot_from_row).collect()
    }

    async fn claim(&self, id: i64, student_email: &str) -> Result<TimeSlot, DbError> {
        debug!("Claiming time slot {} for {}", id, student_email);

        let claimed = sqlx::query(
            "UPDATE time_slots SET claimed_by = $1 WHERE id = $2 AND claimed_by IS NULL",
        )
        .bind(student_email)
        .bind(id)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to claim time slot {}: {}", id, e);
            DbError::QueryError(e.to_string())
        })?
        .rows_affected();

        let slot = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("time slot {}", id)))?;

        if claimed == 0 {
            return Err(DbError::Conflict(format!(
                "time slot {} is already claimed",
                id
            )));
        }

        info!("Time slot {} claimed by {}", id, student_email);
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqlTimeSlotRepository {
        let db = DbClient::from_url("sqlite::memory:").await.unwrap();
        let repo = SqlTimeSlotRepository::new(db);
        repo.init_schema().await.unwrap();
        repo
    }

    fn slot(teacher: &str, start: i64, subject: Option<&str>) -> NewTimeSlot {
        NewTimeSlot {
            teacher_email: teacher.to_string(),
            start_time: start,
            subject: subject.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn null_columns_read_back_as_none() {
        let repo = repo().await;
        let added = repo.add_time_slot(slot("t@x.com", 100, None)).await.unwrap();

        let loaded = repo.find_by_id(added.id).await.unwrap().unwrap();
        assert_eq!(loaded.subject, None);
        assert_eq!(loaded.claimed_by, None);

        let claimed = repo.claim(added.id, "s@x.com").await.unwrap();
        assert_eq!(claimed.claimed_by.as_deref(), Some("s@x.com"));
        assert_eq!(claimed.subject, None);
    }

    #[tokio::test]
    async fn unfiltered_search_honours_unclaimed_flag() {
        let repo = repo().await;
        let a = repo.add_time_slot(slot("t1@x.com", 300, Some("Math"))).await.unwrap();
        let b = repo.add_time_slot(slot("t2@x.com", 100, None)).await.unwrap();
        repo.claim(a.id, "s@x.com").await.unwrap();

        let unclaimed = repo.search(&TimeSlotQuery::default()).await.unwrap();
        assert_eq!(unclaimed, vec![b.clone()]);

        let everything = repo
            .search(&TimeSlotQuery {
                must_be_unclaimed: false,
                ..TimeSlotQuery::default()
            })
            .await
            .unwrap();
        let ids: Vec<i64> = everything.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert_eq!(everything[1].claimed_by.as_deref(), Some("s@x.com"));
    }

    #[tokio::test]
    async fn search_combines_filters() {
        let repo = repo().await;
        repo.add_time_slot(slot("t1@x.com", 100, Some("Math"))).await.unwrap();
        let hit = repo.add_time_slot(slot("t1@x.com", 200, Some("Math"))).await.unwrap();
        repo.add_time_slot(slot("t1@x.com", 300, Some("English"))).await.unwrap();
        repo.add_time_slot(slot("t2@x.com", 200, Some("Math"))).await.unwrap();

        let found = repo
            .search(&TimeSlotQuery {
                teacher_email: Some("t1@x.com".into()),
                subject: Some("Math".into()),
                min_start_time: Some(150),
                max_start_time: Some(300),
                must_be_unclaimed: true,
            })
            .await
            .unwrap();
        assert_eq!(found, vec![hit]);
    }

    #[tokio::test]
    async fn slot_is_claimed_exactly_once() {
        let repo = repo().await;
        let s = repo.add_time_slot(slot("t@x.com", 100, None)).await.unwrap();

        let claimed = repo.claim(s.id, "first@x.com").await.unwrap();
        assert_eq!(claimed.claimed_by.as_deref(), Some("first@x.com"));

        let second = repo.claim(s.id, "second@x.com").await;
        assert!(matches!(second, Err(DbError::Conflict(_))));
        let stored = repo.find_by_id(s.id).await.unwrap().unwrap();
        assert_eq!(stored.claimed_by.as_deref(), Some("first@x.com"));

        assert!(matches!(
            repo.claim(9999, "first@x.com").await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_requires_owner_and_unclaimed_slot() {
        let repo = repo().await;
        let s = repo.add_time_slot(slot("t@x.com", 100, Some("Math"))).await.unwrap();

        let moved = repo
            .update_time_slot(s.id, "t@x.com", Some(500), Some("Physics".into()))
            .await
            .unwrap();
        assert_eq!(moved.start_time, 500);
        assert_eq!(moved.subject.as_deref(), Some("Physics"));

        let foreign = repo
            .update_time_slot(s.id, "other@x.com", Some(600), None)
            .await;
        assert!(matches!(foreign, Err(DbError::Conflict(_))));

        repo.claim(s.id, "s@x.com").await.unwrap();
        let after_claim = repo.update_time_slot(s.id, "t@x.com", Some(700), None).await;
        assert!(matches!(after_claim, Err(DbError::Conflict(_))));
    }
}
