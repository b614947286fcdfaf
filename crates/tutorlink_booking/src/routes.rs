// --- File: crates/tutorlink_booking/src/routes.rs ---
use crate::handlers::{
    add_to_cart_handler, cart_handler, claim_time_handler, make_teacher_handler, person_handler,
    register_handler, search_times_handler, teachers_handler, update_time_handler, BookingState,
};
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tutorlink_auth::{require_session, SessionManager};
use tutorlink_db::Store;

/// Booking routes, relative to `/api`. Browsing is public; everything that
/// acts on behalf of a person sits behind the session guard.
pub fn routes(store: Store, sessions: Arc<SessionManager>) -> Router {
    let state = Arc::new(BookingState { store });

    let public = Router::new()
        .route("/teachers", get(teachers_handler).post(teachers_handler))
        .route(
            "/search-times",
            get(search_times_handler).post(search_times_handler),
        );

    let protected = Router::new()
        .route("/register", get(register_handler).post(register_handler))
        .route("/person", get(person_handler).post(person_handler))
        .route(
            "/update-time",
            get(update_time_handler).post(update_time_handler),
        )
        .route(
            "/add-to-cart",
            get(add_to_cart_handler).post(add_to_cart_handler),
        )
        .route("/cart", get(cart_handler).post(cart_handler))
        .route(
            "/make-teacher",
            get(make_teacher_handler).post(make_teacher_handler),
        )
        .route(
            "/claim-time",
            get(claim_time_handler).post(claim_time_handler),
        )
        .route_layer(middleware::from_fn_with_state(sessions, require_session));

    public.merge(protected).with_state(state)
}
