#[cfg(test)]
mod tests {
    use crate::error::AuthError;
    use crate::handlers::{AuthState, DynIdentityService};
    use crate::middleware::{require_session, CurrentUser};
    use crate::routes::routes;
    use crate::session::SessionManager;
    use axum::body::Body;
    use axum::http::header::{ACCEPT, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, Response, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Router};
    use cookie::Cookie;
    use std::sync::Arc;
    use tower::ServiceExt;
    use tutorlink_common::services::{
        AuthorizationRequest, BoxFuture, IdentityClaims, IdentityService,
    };
    use tutorlink_config::SessionConfig;
    use tutorlink_db::Store;

    const STATE: &str = "fixed-state";

    struct FakeIdentity;

    impl IdentityService for FakeIdentity {
        type Error = AuthError;

        fn provider_name(&self) -> &str {
            "cognito"
        }

        fn authorization_request(&self) -> AuthorizationRequest {
            AuthorizationRequest {
                url: format!("https://idp.example.com/authorize?state={}", STATE),
                csrf_state: STATE.to_string(),
            }
        }

        fn exchange_code(&self, code: &str) -> BoxFuture<'_, IdentityClaims, Self::Error> {
            let code = code.to_string();
            Box::pin(async move {
                if code == "good-code" {
                    Ok(IdentityClaims {
                        email: "ada@example.com".to_string(),
                        name: Some("Ada".to_string()),
                    })
                } else {
                    Err(AuthError::ExchangeError("invalid_grant".to_string()))
                }
            })
        }
    }

    async fn sessions() -> Arc<SessionManager> {
        let store = Store::in_memory().await.unwrap();
        let config = SessionConfig {
            secret: "handler-test-secret-handler-test-secret".to_string(),
            ..SessionConfig::default()
        };
        Arc::new(SessionManager::new(&config, store.sessions).unwrap())
    }

    async fn app() -> (Router, Arc<SessionManager>) {
        let sessions = sessions().await;
        let providers: Vec<DynIdentityService> = vec![Arc::new(FakeIdentity)];
        let state = Arc::new(AuthState::new(sessions.clone(), providers));

        let protected = Router::new()
            .route(
                "/api/whoami",
                get(|user: CurrentUser| async move { user.email }),
            )
            .route(
                "/api/whoami/name",
                get(|user: CurrentUser| async move { user.name.unwrap_or_default() }),
            )
            .route_layer(middleware::from_fn_with_state(
                sessions.clone(),
                require_session,
            ));

        (routes(state).merge(protected), sessions)
    }

    fn get_request(uri: &str, cookies: &[String]) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if !cookies.is_empty() {
            builder = builder.header(COOKIE, cookies.join("; "));
        }
        builder.body(Body::empty()).unwrap()
    }

    /// `name=value` pairs for every non-empty cookie the response sets.
    fn set_cookies(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| Cookie::parse(v.to_str().unwrap().to_string()).ok())
            .filter(|c| !c.value().is_empty())
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect()
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn log_in(app: &Router) -> Vec<String> {
        let login = app.clone().oneshot(get_request("/login", &[])).await.unwrap();
        let csrf = set_cookies(&login);
        let callback = app
            .clone()
            .oneshot(get_request(
                &format!("/callback?code=good-code&state={}", STATE),
                &csrf,
            ))
            .await
            .unwrap();
        assert_eq!(callback.status(), StatusCode::OK);
        set_cookies(&callback)
    }

    #[tokio::test]
    async fn login_redirects_to_provider_with_state_cookie() {
        let (app, _) = app().await;
        let response = app.oneshot(get_request("/login", &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION],
            "https://idp.example.com/authorize?state=fixed-state"
        );
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("tutorlink_oauth_state="));
    }

    #[tokio::test]
    async fn callback_starts_session_and_renders_index() {
        let (app, _) = app().await;
        let session_cookies = log_in(&app).await;
        assert!(session_cookies
            .iter()
            .any(|c| c.starts_with("tutorlink_session=")));

        let index = app
            .clone()
            .oneshot(get_request("/", &session_cookies))
            .await
            .unwrap();
        let html = body_text(index).await;
        assert!(html.contains("ada@example.com"));
        assert!(html.contains("/logout"));

        let login = app
            .clone()
            .oneshot(get_request("/login", &session_cookies))
            .await
            .unwrap();
        assert_eq!(body_text(login).await, "You are logged in!");

        let whoami = app
            .oneshot(get_request("/api/whoami", &session_cookies))
            .await
            .unwrap();
        assert_eq!(whoami.status(), StatusCode::OK);
        assert_eq!(body_text(whoami).await, "ada@example.com");
    }

    #[tokio::test]
    async fn provider_display_name_reaches_protected_routes() {
        let (app, _) = app().await;
        let session_cookies = log_in(&app).await;

        let name = app
            .oneshot(get_request("/api/whoami/name", &session_cookies))
            .await
            .unwrap();
        assert_eq!(name.status(), StatusCode::OK);
        assert_eq!(body_text(name).await, "Ada");
    }

    #[tokio::test]
    async fn state_mismatch_never_creates_a_session() {
        let (app, _) = app().await;
        let login = app.clone().oneshot(get_request("/login", &[])).await.unwrap();
        let csrf = set_cookies(&login);

        let forged = app
            .clone()
            .oneshot(get_request("/callback?code=good-code&state=attacker", &csrf))
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
        assert!(!set_cookies(&forged)
            .iter()
            .any(|c| c.starts_with("tutorlink_session=")));
        assert!(body_text(forged).await.contains("Login failed"));

        let no_cookie = app
            .oneshot(get_request(
                &format!("/callback?code=good-code&state={}", STATE),
                &[],
            ))
            .await
            .unwrap();
        assert_eq!(no_cookie.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn failed_exchange_renders_failure_page() {
        let (app, _) = app().await;
        let login = app.clone().oneshot(get_request("/login", &[])).await.unwrap();
        let csrf = set_cookies(&login);

        let response = app
            .oneshot(get_request(
                &format!("/login/cognito/authorized?code=bad&state={}", STATE),
                &csrf,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("Try again"));
    }

    #[tokio::test]
    async fn logout_revokes_session() {
        let (app, sessions) = app().await;
        let session_cookies = log_in(&app).await;

        let logout = app
            .clone()
            .oneshot(get_request("/logout", &session_cookies))
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::FOUND);
        assert_eq!(logout.headers()[LOCATION], "/");

        let request = get_request("/", &session_cookies);
        assert_eq!(sessions.resolve(request.headers()).await.unwrap(), None);
        let index = app.oneshot(request).await.unwrap();
        assert!(body_text(index).await.contains(r#"href="/login""#));
    }

    #[tokio::test]
    async fn unknown_provider_is_not_found() {
        let (app, _) = app().await;
        let response = app
            .oneshot(get_request("/login/github", &[]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn guard_rejects_anonymous_callers() {
        let (app, _) = app().await;

        let api = app
            .clone()
            .oneshot(get_request("/api/whoami", &[]))
            .await
            .unwrap();
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_str(&body_text(api).await).unwrap();
        assert_eq!(body["error"]["code"], 401);

        let browser = Request::builder()
            .uri("/api/whoami")
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .body(Body::empty())
            .unwrap();
        let redirected = app.oneshot(browser).await.unwrap();
        assert_eq!(redirected.status(), StatusCode::FOUND);
        assert_eq!(redirected.headers()[LOCATION], "/login");
    }
}
