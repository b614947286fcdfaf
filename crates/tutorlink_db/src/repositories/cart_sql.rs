//! SQL implementation of the cart repository

use crate::error::DbError;
use crate::repositories::cart::{Cart, CartRepository, Checkout};
use crate::repositories::nullable_text;
use crate::DbClient;
use sqlx::Row;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct SqlCartRepository {
    db_client: DbClient,
}

impl SqlCartRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn query_error(context: &str, e: sqlx::Error) -> DbError {
    error!("{}: {}", context, e);
    DbError::QueryError(e.to_string())
}

impl CartRepository for SqlCartRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing cart schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS carts (
                student_email TEXT PRIMARY KEY,
                intent_id TEXT
            )
        "#,
            )
            .await?;

        let items = format!(
            r#"
            CREATE TABLE IF NOT EXISTS cart_items (
                id {},
                student_email TEXT NOT NULL,
                time_slot_id BIGINT NOT NULL,
                UNIQUE (student_email, time_slot_id)
            )
        "#,
            self.db_client.dialect().serial_primary_key()
        );
        self.db_client.execute(&items).await?;

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS settled_intents (
                intent_id TEXT PRIMARY KEY,
                student_email TEXT NOT NULL
            )
        "#,
            )
            .await?;

        let settled = format!(
            r#"
            CREATE TABLE IF NOT EXISTS settled_slots (
                id {},
                intent_id TEXT NOT NULL,
                time_slot_id BIGINT NOT NULL,
                claimed BIGINT NOT NULL
            )
        "#,
            self.db_client.dialect().serial_primary_key()
        );
        self.db_client.execute(&settled).await?;

        info!("Cart schema initialized successfully");
        Ok(())
    }

    async fn get_cart(&self, student_email: &str) -> Result<Cart, DbError> {
        debug!("Loading cart of {}", student_email);

        let header = sqlx::query("SELECT intent_id FROM carts WHERE student_email = $1")
            .bind(student_email)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| query_error("Failed to load cart", e))?;

        let Some(header) = header else {
            return Ok(Cart::empty(student_email));
        };

        let rows = sqlx::query(
            "SELECT time_slot_id FROM cart_items WHERE student_email = $1 ORDER BY id",
        )
        .bind(student_email)
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| query_error("Failed to load cart items", e))?;

        Ok(Cart {
            student_email: student_email.to_string(),
            time_slot_ids: rows
                .iter()
                .map(|row| row.try_get("time_slot_id"))
                .collect::<Result<_, _>>()?,
            intent_id: nullable_text(&header, "intent_id")?,
        })
    }

    async fn append(&self, student_email: &str, time_slot_id: i64) -> Result<Cart, DbError> {
        debug!("Adding slot {} to cart of {}", time_slot_id, student_email);

        let mut tx = self.db_client.begin().await?;

        sqlx::query("INSERT INTO carts (student_email) VALUES ($1) ON CONFLICT (student_email) DO NOTHING")
            .bind(student_email)
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to create cart", e))?;

        let header = sqlx::query("SELECT intent_id FROM carts WHERE student_email = $1")
            .bind(student_email)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to read cart", e))?;
        let pending = nullable_text(&header, "intent_id")?;
        if let Some(intent_id) = pending {
            warn!(
                "Cart of {} is awaiting payment {}; not adding slot {}",
                student_email, intent_id, time_slot_id
            );
            return Err(DbError::Conflict(
                "cart is awaiting payment; cancel the payment to change it".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO cart_items (student_email, time_slot_id)
            VALUES ($1, $2)
            ON CONFLICT (student_email, time_slot_id) DO NOTHING
        "#,
        )
        .bind(student_email)
        .bind(time_slot_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| query_error("Failed to add cart item", e))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!("Slot {} is in the cart of {}", time_slot_id, student_email);
        self.get_cart(student_email).await
    }

    async fn set_intent(&self, student_email: &str, intent_id: &str) -> Result<(), DbError> {
        debug!("Recording intent {} for {}", intent_id, student_email);

        let updated = sqlx::query(
            "UPDATE carts SET intent_id = $1 WHERE student_email = $2 AND intent_id IS NULL",
        )
        .bind(intent_id)
        .bind(student_email)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| query_error("Failed to record intent", e))?
        .rows_affected();

        if updated == 0 {
            return Err(DbError::Conflict(format!(
                "a payment is already pending for {}",
                student_email
            )));
        }

        info!("Intent {} recorded for {}", intent_id, student_email);
        Ok(())
    }

    async fn clear_intent(&self, student_email: &str, intent_id: &str) -> Result<bool, DbError> {
        debug!("Clearing intent {} for {}", intent_id, student_email);

        let updated = sqlx::query(
            "UPDATE carts SET intent_id = NULL WHERE student_email = $1 AND intent_id = $2",
        )
        .bind(student_email)
        .bind(intent_id)
        .execute(self.db_client.pool())
        .await
        .map_err(|e| query_error("Failed to clear intent", e))?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn find_by_intent(&self, intent_id: &str) -> Result<Option<String>, DbError> {
        debug!("Finding cart for intent {}", intent_id);

        let row = sqlx::query("SELECT student_email FROM carts WHERE intent_id = $1")
            .bind(intent_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| query_error("Failed to find cart by intent", e))?;

        row.map(|r| r.try_get("student_email"))
            .transpose()
            .map_err(DbError::from)
    }

    async fn checkout(&self, student_email: &str, intent_id: &str) -> Result<Checkout, DbError> {
        debug!("Checking out cart of {} with {}", student_email, intent_id);

        let mut tx = self.db_client.begin().await?;

        let detached = sqlx::query(
            "UPDATE carts SET intent_id = NULL WHERE student_email = $1 AND intent_id = $2",
        )
        .bind(student_email)
        .bind(intent_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| query_error("Failed to detach intent", e))?
        .rows_affected();

        if detached == 0 {
            warn!("Cart of {} does not carry intent {}", student_email, intent_id);
            return Err(DbError::Conflict(format!(
                "payment {} does not belong to the current cart",
                intent_id
            )));
        }

        let slot_ids: Vec<i64> = sqlx::query(
            "SELECT time_slot_id FROM cart_items WHERE student_email = $1 ORDER BY id",
        )
        .bind(student_email)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| query_error("Failed to load cart items", e))?
        .iter()
        .map(|row| row.try_get("time_slot_id"))
        .collect::<Result<_, _>>()?;

        let mut checkout = Checkout::default();
        for slot_id in slot_ids {
            let claimed = sqlx::query(
                "UPDATE time_slots SET claimed_by = $1 WHERE id = $2 AND claimed_by IS NULL",
            )
            .bind(student_email)
            .bind(slot_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to claim slot", e))?
            .rows_affected();

            if claimed > 0 {
                checkout.claimed.push(slot_id);
            } else {
                warn!("Slot {} was taken before {} paid", slot_id, student_email);
                checkout.unavailable.push(slot_id);
            }

            sqlx::query(
                "INSERT INTO settled_slots (intent_id, time_slot_id, claimed) VALUES ($1, $2, $3)",
            )
            .bind(intent_id)
            .bind(slot_id)
            .bind(i64::from(claimed > 0))
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to record settled slot", e))?;
        }

        sqlx::query("INSERT INTO settled_intents (intent_id, student_email) VALUES ($1, $2)")
            .bind(intent_id)
            .bind(student_email)
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to record settled intent", e))?;

        sqlx::query("DELETE FROM cart_items WHERE student_email = $1")
            .bind(student_email)
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("Failed to empty cart", e))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!(
            "Checkout for {}: claimed {:?}, unavailable {:?}",
            student_email, checkout.claimed, checkout.unavailable
        );
        Ok(checkout)
    }

    async fn find_checkout(
        &self,
        student_email: &str,
        intent_id: &str,
    ) -> Result<Option<Checkout>, DbError> {
        let settled = sqlx::query(
            "SELECT intent_id FROM settled_intents WHERE intent_id = $1 AND student_email = $2",
        )
        .bind(intent_id)
        .bind(student_email)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| query_error("Failed to look up settled intent", e))?;

        if settled.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query(
            "SELECT time_slot_id, claimed FROM settled_slots WHERE intent_id = $1 ORDER BY id",
        )
        .bind(intent_id)
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| query_error("Failed to load settled slots", e))?;

        let mut checkout = Checkout::default();
        for row in rows {
            let slot_id: i64 = row.try_get("time_slot_id")?;
            let claimed: i64 = row.try_get("claimed")?;
            if claimed != 0 {
                checkout.claimed.push(slot_id);
            } else {
                checkout.unavailable.push(slot_id);
            }
        }
        Ok(Some(checkout))
    }
}
