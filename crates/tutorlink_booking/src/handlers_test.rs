#[cfg(test)]
mod tests {
    use crate::routes::routes;
    use axum::body::Body;
    use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;
    use tutorlink_auth::SessionManager;
    use tutorlink_config::SessionConfig;
    use tutorlink_db::{PersonRepository, Store};

    struct Harness {
        app: Router,
        store: Store,
        sessions: Arc<SessionManager>,
    }

    impl Harness {
        async fn new() -> Self {
            let store = Store::in_memory().await.unwrap();
            let config = SessionConfig {
                secret: "booking-test-secret-booking-test-secret".to_string(),
                ..SessionConfig::default()
            };
            let sessions =
                Arc::new(SessionManager::new(&config, store.sessions.clone()).unwrap());
            let app = routes(store.clone(), sessions.clone());
            Self {
                app,
                store,
                sessions,
            }
        }

        async fn token(&self, email: &str) -> String {
            let (session, _) = self.sessions.start(email, None).await.unwrap();
            session.token
        }

        async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            let mut builder = Request::builder().uri(uri);
            if let Some(token) = token {
                builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
            }
            self.send(builder.body(Body::empty()).unwrap()).await
        }

        async fn post(&self, uri: &str, form: &str, token: &str) -> (StatusCode, Value) {
            let request = Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(AUTHORIZATION, format!("Bearer {}", token))
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap();
            self.send(request).await
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }
    }

    #[tokio::test]
    async fn protected_routes_need_a_session() {
        let h = Harness::new().await;
        for uri in [
            "/register",
            "/person",
            "/update-time",
            "/add-to-cart?id=1",
            "/cart",
            "/make-teacher",
            "/claim-time?id=1",
        ] {
            let (status, body) = h.get(uri, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["error"]["code"], 401);
        }

        let browser = Request::builder()
            .uri("/cart")
            .header(ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(browser).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[tokio::test]
    async fn register_then_fetch_person() {
        let h = Harness::new().await;
        let token = h.token("sam@example.com").await;

        let (status, _) = h.get("/person", Some(&token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = h.get("/register?name=Sam", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({}));

        let (status, _) = h.post("/register", "", &token).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, person) = h.get("/person", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(person["email"], "sam@example.com");
        assert_eq!(person["name"], "Sam");
        assert_eq!(person["role"], "student");
    }

    #[tokio::test]
    async fn teacher_offers_and_student_claims() {
        let h = Harness::new().await;
        let teacher = h.token("tina@example.com").await;
        let student = h.token("sam@example.com").await;

        let (status, _) = h.post("/update-time", "start_time=100", &teacher).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        h.get("/register?name=Tina", Some(&teacher)).await;
        let (status, _) = h
            .post("/make-teacher", "subjects=Math%2CPhysics&bio=Hi", &teacher)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, slot) = h
            .post("/update-time", "start_time=100&subject=Math", &teacher)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(slot["teacher_email"], "tina@example.com");
        let id = slot["id"].as_i64().unwrap();

        let (_, teachers) = h.get("/teachers", None).await;
        assert_eq!(teachers[0]["subjects"], serde_json::json!(["Math", "Physics"]));

        let (status, found) = h.get("/search-times?subject=Math", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (status, _) = h
            .post("/claim-time", &format!("id={}", id), &student)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = h
            .post("/claim-time", &format!("id={}", id), &student)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], 409);

        let (_, open) = h.get("/search-times", None).await;
        assert!(open.as_array().unwrap().is_empty());
        let (_, all) = h.get("/search-times?must_be_unclaimed=false", None).await;
        assert_eq!(all[0]["claimed_by"], "sam@example.com");

        let (status, _) = h
            .post("/update-time", &format!("id={}&start_time=200", id), &teacher)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn add_to_cart_validates_and_deduplicates() {
        let h = Harness::new().await;
        h.store
            .persons
            .add_teacher("tina@example.com", "Tina", &[], "")
            .await
            .unwrap();
        let teacher = h.token("tina@example.com").await;
        let student = h.token("sam@example.com").await;
        h.post("/update-time", "start_time=100", &teacher).await;

        let (status, body) = h.get("/add-to-cart", Some(&student)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);

        let (status, _) = h.get("/add-to-cart?id=abc", Some(&student)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = h.get("/add-to-cart?id=42", Some(&student)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        h.post("/add-to-cart", "id=1", &student).await;
        let (status, cart) = h.post("/add-to-cart", "id=1", &student).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["time_slot_ids"], serde_json::json!([1]));

        let (_, cart) = h.get("/cart", Some(&student)).await;
        assert_eq!(cart["student_email"], "sam@example.com");
        assert_eq!(cart["intent_id"], Value::Null);
    }

    #[tokio::test]
    async fn search_rejects_malformed_filters() {
        let h = Harness::new().await;
        let (status, body) = h.get("/search-times?min_start_time=soon", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("min_start_time"));
    }
}
