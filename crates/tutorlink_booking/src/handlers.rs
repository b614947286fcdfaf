// --- File: crates/tutorlink_booking/src/handlers.rs ---
//! Booking endpoints. Every route accepts GET with a query string and POST
//! with an urlencoded body; `Form` reads whichever the method implies.

use crate::logic::{
    add_to_cart, claim_time, get_person, list_teachers, make_teacher, register, search_times,
    update_time, view_cart, MakeTeacherRequest, RegisterRequest, SearchTimesRequest,
    TimeSlotIdRequest, UpdateTimeRequest,
};
use axum::{extract::State, Form, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tutorlink_auth::CurrentUser;
use tutorlink_common::ApiResult;
use tutorlink_db::{Cart, Person, Store, TimeSlot};

pub struct BookingState {
    pub store: Store,
}

#[axum::debug_handler]
pub async fn register_handler(
    State(state): State<Arc<BookingState>>,
    user: CurrentUser,
    Form(request): Form<RegisterRequest>,
) -> ApiResult<Value> {
    register(&state.store, &user.email, user.name.as_deref(), request).await?;
    Ok(Json(json!({})))
}

#[axum::debug_handler]
pub async fn person_handler(
    State(state): State<Arc<BookingState>>,
    user: CurrentUser,
) -> ApiResult<Person> {
    Ok(Json(get_person(&state.store, &user.email).await?))
}

#[axum::debug_handler]
pub async fn teachers_handler(State(state): State<Arc<BookingState>>) -> ApiResult<Vec<Person>> {
    Ok(Json(list_teachers(&state.store).await?))
}

#[axum::debug_handler]
pub async fn search_times_handler(
    State(state): State<Arc<BookingState>>,
    Form(request): Form<SearchTimesRequest>,
) -> ApiResult<Vec<TimeSlot>> {
    Ok(Json(search_times(&state.store, request).await?))
}

#[axum::debug_handler]
pub async fn update_time_handler(
    State(state): State<Arc<BookingState>>,
    user: CurrentUser,
    Form(request): Form<UpdateTimeRequest>,
) -> ApiResult<TimeSlot> {
    Ok(Json(update_time(&state.store, &user.email, request).await?))
}

#[axum::debug_handler]
pub async fn add_to_cart_handler(
    State(state): State<Arc<BookingState>>,
    user: CurrentUser,
    Form(request): Form<TimeSlotIdRequest>,
) -> ApiResult<Cart> {
    Ok(Json(add_to_cart(&state.store, &user.email, request).await?))
}

#[axum::debug_handler]
pub async fn cart_handler(
    State(state): State<Arc<BookingState>>,
    user: CurrentUser,
) -> ApiResult<Cart> {
    Ok(Json(view_cart(&state.store, &user.email).await?))
}

#[axum::debug_handler]
pub async fn make_teacher_handler(
    State(state): State<Arc<BookingState>>,
    user: CurrentUser,
    Form(request): Form<MakeTeacherRequest>,
) -> ApiResult<Value> {
    make_teacher(&state.store, &user.email, request).await?;
    Ok(Json(json!({})))
}

#[axum::debug_handler]
pub async fn claim_time_handler(
    State(state): State<Arc<BookingState>>,
    user: CurrentUser,
    Form(request): Form<TimeSlotIdRequest>,
) -> ApiResult<Value> {
    claim_time(&state.store, &user.email, request).await?;
    Ok(Json(json!({})))
}
