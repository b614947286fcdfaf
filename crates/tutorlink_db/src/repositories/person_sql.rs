//! SQL implementation of the person repository

use crate::error::DbError;
use crate::repositories::person::{Person, PersonRepository, Role};
use crate::DbClient;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SqlPersonRepository {
    db_client: DbClient,
}

impl SqlPersonRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn insert(
        &self,
        email: &str,
        role: Role,
        name: &str,
        subjects: &[String],
        bio: &str,
    ) -> Result<Person, DbError> {
        let subjects_json = encode_subjects(subjects)?;
        let query = r#"
            INSERT INTO persons (email, role, name, subjects, bio)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
        "#;

        let inserted = sqlx::query(query)
            .bind(email)
            .bind(role.as_str())
            .bind(name)
            .bind(subjects_json)
            .bind(bio)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert person {}: {}", email, e);
                DbError::QueryError(e.to_string())
            })?
            .rows_affected();

        if inserted == 0 {
            return Err(DbError::Conflict(format!("{} is already registered", email)));
        }

        info!("Registered {} as {}", email, role);
        Ok(Person {
            email: email.to_string(),
            role,
            name: name.to_string(),
            subjects: subjects.to_vec(),
            bio: bio.to_string(),
        })
    }
}

fn encode_subjects(subjects: &[String]) -> Result<String, DbError> {
    serde_json::to_string(subjects).map_err(|e| DbError::DecodeError(e.to_string()))
}

fn person_from_row(row: &AnyRow) -> Result<Person, DbError> {
    let role: String = row.try_get("role")?;
    let subjects: String = row.try_get("subjects")?;
    Ok(Person {
        email: row.try_get("email")?,
        role: Role::parse(&role)?,
        name: row.try_get("name")?,
        subjects: serde_json::from_str(&subjects)
            .map_err(|e| DbError::DecodeError(format!("subjects: {}", e)))?,
        bio: row.try_get("bio")?,
    })
}

impl PersonRepository for SqlPersonRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing persons schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS persons (
                email TEXT PRIMARY KEY,
                role TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                subjects TEXT NOT NULL DEFAULT '[]',
                bio TEXT NOT NULL DEFAULT ''
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Persons schema initialized successfully");
        Ok(())
    }

    async fn add_student(&self, email: &str, name: &str) -> Result<Person, DbError> {
        debug!("Adding student: {}", email);
        self.insert(email, Role::Student, name, &[], "").await
    }

    async fn add_teacher(
        &self,
        email: &str,
        name: &str,
        subjects: &[String],
        bio: &str,
    ) -> Result<Person, DbError> {
        debug!("Adding teacher: {}", email);
        self.insert(email, Role::Teacher, name, subjects, bio).await
    }

    async fn make_teacher(
        &self,
        email: &str,
        subjects: &[String],
        bio: &str,
    ) -> Result<Person, DbError> {
        debug!("Promoting {} to teacher", email);

        let query = r#"
            UPDATE persons
            SET role = $1, subjects = $2, bio = $3
            WHERE email = $4
        "#;

        let updated = sqlx::query(query)
            .bind(Role::Teacher.as_str())
            .bind(encode_subjects(subjects)?)
            .bind(bio)
            .bind(email)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to promote {}: {}", email, e);
                DbError::QueryError(e.to_string())
            })?
            .rows_affected();

        if updated == 0 {
            return Err(DbError::NotFound(format!("person {}", email)));
        }

        info!("{} is now a teacher", email);
        self.find_by_email(email)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("person {}", email)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Person>, DbError> {
        debug!("Finding person: {}", email);

        let query = r#"
            SELECT email, role, name, subjects, bio
            FROM persons
            WHERE email = $1
        "#;

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to find person {}: {}", email, e);
                DbError::QueryError(e.to_string())
            })?;

        row.as_ref().map(person_from_row).transpose()
    }

    async fn list_teachers(&self) -> Result<Vec<Person>, DbError> {
        debug!("Listing teachers");

        let query = r#"
            SELECT email, role, name, subjects, bio
            FROM persons
            WHERE role = $1
            ORDER BY name, email
        "#;

        let rows = sqlx::query(query)
            .bind(Role::Teacher.as_str())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list teachers: {}", e);
                DbError::QueryError(e.to_string())
            })?;

        rows.iter().map(person_from_row).collect()
    }
}
