//! Student carts and the checkout that turns them into claims.

use crate::error::DbError;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A student's pending selection. `time_slot_ids` keeps insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Cart {
    pub student_email: String,
    pub time_slot_ids: Vec<i64>,
    /// Payment intent awaiting reconciliation. The cart is frozen while set.
    pub intent_id: Option<String>,
}

impl Cart {
    pub fn empty(student_email: &str) -> Self {
        Self {
            student_email: student_email.to_string(),
            time_slot_ids: Vec::new(),
            intent_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.time_slot_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.time_slot_ids.len()
    }
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Checkout {
    /// Slots now held by the student.
    pub claimed: Vec<i64>,
    /// Slots another student claimed before the payment was reconciled.
    pub unavailable: Vec<i64>,
}

pub trait CartRepository {
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// The student's cart; an empty cart if none was ever created.
    fn get_cart(&self, student_email: &str) -> impl Future<Output = Result<Cart, DbError>> + Send;

    /// Appends a slot. Re-adding an id is a no-op. Fails with `Conflict`
    /// while a payment intent is outstanding.
    fn append(
        &self,
        student_email: &str,
        time_slot_id: i64,
    ) -> impl Future<Output = Result<Cart, DbError>> + Send;

    /// Records `intent_id` on the cart unless one is already recorded (`Conflict`).
    fn set_intent(
        &self,
        student_email: &str,
        intent_id: &str,
    ) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Forgets the recorded intent if it is still `intent_id`. Returns whether it was.
    fn clear_intent(
        &self,
        student_email: &str,
        intent_id: &str,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Owner of the cart carrying `intent_id`.
    fn find_by_intent(
        &self,
        intent_id: &str,
    ) -> impl Future<Output = Result<Option<String>, DbError>> + Send;

    /// In one transaction: detaches `intent_id` from the cart, claims every
    /// still-free slot in it for the student, records the outcome against
    /// the intent and empties the cart. Fails with `Conflict` when the cart
    /// does not carry `intent_id`.
    fn checkout(
        &self,
        student_email: &str,
        intent_id: &str,
    ) -> impl Future<Output = Result<Checkout, DbError>> + Send;

    /// The recorded outcome of an earlier checkout of `intent_id` by the student.
    fn find_checkout(
        &self,
        student_email: &str,
        intent_id: &str,
    ) -> impl Future<Output = Result<Option<Checkout>, DbError>> + Send;
}
