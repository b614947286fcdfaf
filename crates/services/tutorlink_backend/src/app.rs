// --- File: crates/services/tutorlink_backend/src/app.rs ---
//! The assembled HTTP application.
//!
//! Login pages live at the root; booking, payment and health endpoints are
//! nested under `/api`.
use crate::app_state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use tutorlink_auth::AuthState;
use tutorlink_db::Store;
use tutorlink_stripe::PaymentState;

#[axum::debug_handler]
async fn health_handler(State(store): State<Store>) -> (StatusCode, Json<Value>) {
    if store.db_client().is_healthy().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "up" })))
    } else {
        warn!("Health check: database is not answering");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        )
    }
}

pub fn build_router(state: &AppState) -> Router {
    let auth_state = Arc::new(AuthState::new(
        state.sessions.clone(),
        state.services.identity_providers(),
    ));
    let payment_state = Arc::new(PaymentState {
        config: state.config.clone(),
        store: state.store.clone(),
        payments: state.services.payment_service(),
        notifier: state.services.notification_service(),
    });

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Tutorlink API!" }))
        .route("/health", get(health_handler))
        .with_state(state.store.clone())
        .merge(tutorlink_booking::routes(
            state.store.clone(),
            state.sessions.clone(),
        ))
        .merge(tutorlink_stripe::routes(payment_state, state.sessions.clone()));

    #[allow(unused_mut)] // only mutated with the openapi feature
    let mut app = tutorlink_auth::routes(auth_state).nest("/api", api_router);

    // Swagger UI and the JSON document when the openapi feature is enabled
    #[cfg(feature = "openapi")]
    {
        use tutorlink_booking::doc::BookingApiDoc;
        use tutorlink_stripe::doc::StripeApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Tutorlink API",
                version = "0.1.0",
                description = "Tutoring marketplace: teachers, time slots, carts and checkout"
            ),
            tags((name = "Tutorlink", description = "Core service endpoints")),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        openapi_doc.merge(StripeApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");

        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_factory::TutorlinkServiceFactory;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use tutorlink_config::{AppConfig, SessionConfig};

    async fn app() -> Router {
        let config = Arc::new(AppConfig {
            session: SessionConfig {
                secret: "router-test-secret-router-test-secret".to_string(),
                ..SessionConfig::default()
            },
            ..AppConfig::default()
        });
        let store = Store::in_memory().await.unwrap();
        let state = AppState::builder(config, store)
            .with_services(TutorlinkServiceFactory::empty())
            .build()
            .unwrap();
        build_router(&state)
    }

    #[tokio::test]
    async fn health_reports_database() {
        let response = app()
            .await
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["database"], "up");
    }

    #[tokio::test]
    async fn cors_preflight_is_answered() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/teachers")
                    .header("Origin", "https://frontend.example")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }

    #[tokio::test]
    async fn payments_answer_unavailable_when_disabled() {
        let response = app()
            .await
            .oneshot(
                Request::post("/api/stripe/webhook")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
