// --- File: crates/tutorlink_booking/src/doc.rs ---
#![allow(dead_code)]
use utoipa::OpenApi;

use crate::logic::{
    MakeTeacherRequest, RegisterRequest, SearchTimesRequest, TimeSlotIdRequest,
    UpdateTimeRequest,
};
use tutorlink_common::{ErrorBody, ErrorDetail};
use tutorlink_db::{Cart, Person, Role, TimeSlot};

// Paths are relative to /api. Each accepts GET (query) and POST (urlencoded body).

#[utoipa::path(
    method(get, post),
    path = "/register",
    params(RegisterRequest),
    responses(
        (status = 200, description = "Caller registered as a student", body = Object),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 409, description = "Already registered", body = ErrorBody)
    ),
    tag = "Booking"
)]
fn doc_register() {}

#[utoipa::path(
    method(get, post),
    path = "/person",
    responses(
        (status = 200, description = "The caller's person record", body = Person),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 404, description = "Not registered", body = ErrorBody)
    ),
    tag = "Booking"
)]
fn doc_person() {}

#[utoipa::path(
    method(get, post),
    path = "/teachers",
    responses((status = 200, description = "All teachers", body = [Person])),
    tag = "Booking"
)]
fn doc_teachers() {}

#[utoipa::path(
    method(get, post),
    path = "/search-times",
    params(SearchTimesRequest),
    responses(
        (status = 200, description = "Matching slots ordered by start time", body = [TimeSlot]),
        (status = 400, description = "Malformed filter", body = ErrorBody)
    ),
    tag = "Booking"
)]
fn doc_search_times() {}

#[utoipa::path(
    method(get, post),
    path = "/update-time",
    params(UpdateTimeRequest),
    responses(
        (status = 200, description = "The created or updated slot", body = TimeSlot),
        (status = 400, description = "start_time missing or malformed", body = ErrorBody),
        (status = 403, description = "Caller is not a teacher or not the owner", body = ErrorBody),
        (status = 404, description = "Unknown slot", body = ErrorBody),
        (status = 409, description = "Slot already claimed", body = ErrorBody)
    ),
    tag = "Booking"
)]
fn doc_update_time() {}

#[utoipa::path(
    method(get, post),
    path = "/add-to-cart",
    params(TimeSlotIdRequest),
    responses(
        (status = 200, description = "The caller's cart", body = Cart),
        (status = 400, description = "id missing", body = ErrorBody),
        (status = 404, description = "Unknown slot", body = ErrorBody),
        (status = 409, description = "Slot claimed or payment outstanding", body = ErrorBody)
    ),
    tag = "Booking"
)]
fn doc_add_to_cart() {}

#[utoipa::path(
    method(get, post),
    path = "/cart",
    responses((status = 200, description = "The caller's cart", body = Cart)),
    tag = "Booking"
)]
fn doc_cart() {}

#[utoipa::path(
    method(get, post),
    path = "/make-teacher",
    params(MakeTeacherRequest),
    responses(
        (status = 200, description = "Caller promoted to teacher", body = Object),
        (status = 404, description = "Not registered", body = ErrorBody)
    ),
    tag = "Booking"
)]
fn doc_make_teacher() {}

#[utoipa::path(
    method(get, post),
    path = "/claim-time",
    params(TimeSlotIdRequest),
    responses(
        (status = 200, description = "Slot claimed for the caller", body = Object),
        (status = 404, description = "Unknown slot", body = ErrorBody),
        (status = 409, description = "Already claimed", body = ErrorBody)
    ),
    tag = "Booking"
)]
fn doc_claim_time() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_register,
        doc_person,
        doc_teachers,
        doc_search_times,
        doc_update_time,
        doc_add_to_cart,
        doc_cart,
        doc_make_teacher,
        doc_claim_time
    ),
    components(schemas(Person, Role, TimeSlot, Cart, ErrorBody, ErrorDetail)),
    tags((name = "Booking", description = "People, time slots and carts"))
)]
pub struct BookingApiDoc;
