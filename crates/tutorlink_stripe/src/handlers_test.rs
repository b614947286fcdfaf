#[cfg(test)]
mod tests {
    use crate::error::StripeError;
    use crate::handlers::{DynPaymentService, PaymentState};
    use crate::routes::routes;
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use hmac::{Hmac, Mac};
    use serde_json::{json, Value};
    use sha2::Sha256;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;
    use tutorlink_auth::SessionManager;
    use tutorlink_common::services::{
        BoxFuture, EmailMessage, NotificationResult, NotificationService, PaymentIntentRequest,
        PaymentIntentResult, PaymentService,
    };
    use tutorlink_config::{
        default_price_tiers, default_unit_amount, AppConfig, SessionConfig, StripeConfig,
    };
    use tutorlink_db::{CartRepository, NewTimeSlot, Store, TimeSlotRepository};
    use tutorlink_notify::{DynNotifier, NotifyError};

    const WEBHOOK_SECRET: &str = "whsec_handler_test";

    /// In-memory stand-in for Stripe's PaymentIntents.
    #[derive(Default)]
    struct FakeStripe {
        intents: Mutex<HashMap<String, PaymentIntentResult>>,
        decline: Mutex<bool>,
    }

    impl FakeStripe {
        fn pay(&self, id: &str, amount_received: i64) {
            let mut intents = self.intents.lock().unwrap();
            let intent = intents.get_mut(id).unwrap();
            intent.amount_received = amount_received;
            intent.status = "succeeded".to_string();
        }

        fn get(&self, id: &str) -> Option<PaymentIntentResult> {
            self.intents.lock().unwrap().get(id).cloned()
        }

        fn missing(id: &str) -> StripeError {
            StripeError::ApiError {
                status_code: 404,
                message: format!("No such payment_intent: '{}'", id),
            }
        }
    }

    impl PaymentService for FakeStripe {
        type Error = StripeError;

        fn create_payment_intent(
            &self,
            request: PaymentIntentRequest,
        ) -> BoxFuture<'_, PaymentIntentResult, Self::Error> {
            Box::pin(async move {
                if *self.decline.lock().unwrap() {
                    return Err(StripeError::ApiError {
                        status_code: 402,
                        message: "Your card was declined.".to_string(),
                    });
                }
                let mut intents = self.intents.lock().unwrap();
                let id = format!("pi_fake_{}", intents.len() + 1);
                let intent = PaymentIntentResult {
                    id: id.clone(),
                    status: "requires_payment_method".to_string(),
                    amount: request.amount,
                    amount_received: 0,
                    currency: request.currency,
                    client_secret: Some(format!("{}_secret", id)),
                };
                intents.insert(id, intent.clone());
                Ok(intent)
            })
        }

        fn retrieve_payment_intent(
            &self,
            payment_intent_id: &str,
        ) -> BoxFuture<'_, PaymentIntentResult, Self::Error> {
            let id = payment_intent_id.to_string();
            Box::pin(async move { self.get(&id).ok_or_else(|| Self::missing(&id)) })
        }

        fn cancel_payment_intent(
            &self,
            payment_intent_id: &str,
        ) -> BoxFuture<'_, PaymentIntentResult, Self::Error> {
            let id = payment_intent_id.to_string();
            Box::pin(async move {
                let mut intents = self.intents.lock().unwrap();
                let intent = intents.get_mut(&id).ok_or_else(|| Self::missing(&id))?;
                intent.status = "canceled".to_string();
                Ok(intent.clone())
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    impl NotificationService for RecordingNotifier {
        type Error = NotifyError;

        fn send_email(&self, message: EmailMessage) -> BoxFuture<'_, NotificationResult, Self::Error> {
            Box::pin(async move {
                if self.fail {
                    return Err(NotifyError::DeliveryError("relay unreachable".to_string()));
                }
                self.sent.lock().unwrap().push(message);
                Ok(NotificationResult {
                    id: None,
                    status: "recorded".to_string(),
                })
            })
        }
    }

    struct Harness {
        app: Router,
        store: Store,
        sessions: Arc<SessionManager>,
        stripe: Arc<FakeStripe>,
        notifier: Arc<RecordingNotifier>,
    }

    fn app_config(use_stripe: bool) -> AppConfig {
        AppConfig {
            use_stripe,
            stripe: Some(StripeConfig {
                secret_key: "sk_test".to_string(),
                publishable_key: "pk_test_123".to_string(),
                currency: "usd".to_string(),
                api_base: None,
                webhook_secret: Some(WEBHOOK_SECRET.to_string()),
                price_tiers: default_price_tiers(),
                default_unit_amount: default_unit_amount(),
            }),
            ..AppConfig::default()
        }
    }

    impl Harness {
        async fn new() -> Self {
            Self::build(true, RecordingNotifier::default()).await
        }

        async fn build(use_stripe: bool, notifier: RecordingNotifier) -> Self {
            let store = Store::in_memory().await.unwrap();
            let session_config = SessionConfig {
                secret: "stripe-test-secret-stripe-test-secret".to_string(),
                ..SessionConfig::default()
            };
            let sessions =
                Arc::new(SessionManager::new(&session_config, store.sessions.clone()).unwrap());
            let stripe = Arc::new(FakeStripe::default());
            let notifier = Arc::new(notifier);

            let payments: DynPaymentService = stripe.clone();
            let dyn_notifier: DynNotifier = notifier.clone();
            let state = Arc::new(PaymentState {
                config: Arc::new(app_config(use_stripe)),
                store: store.clone(),
                payments: Some(payments),
                notifier: dyn_notifier,
            });

            Self {
                app: routes(state, sessions.clone()),
                store,
                sessions,
                stripe,
                notifier,
            }
        }

        /// Logs `email` in with `slots` unclaimed slots in their cart.
        async fn student_with_cart(&self, email: &str, slots: usize) -> String {
            for i in 0..slots {
                let slot = self
                    .store
                    .time_slots
                    .add_time_slot(NewTimeSlot {
                        teacher_email: "tina@example.com".to_string(),
                        start_time: 1_767_261_600 + 3600 * i as i64,
                        subject: Some("Math".to_string()),
                    })
                    .await
                    .unwrap();
                self.store.carts.append(email, slot.id).await.unwrap();
            }
            let (session, _) = self.sessions.start(email, None).await.unwrap();
            session.token
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

        async fn webhook(&self, payload: &str, signature: &str) -> StatusCode {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/stripe/webhook")
                .header("Stripe-Signature", signature)
                .body(Body::from(payload.to_string()))
                .unwrap();
            self.send(request).await.0
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        async fn create_intent(&self, token: &str) -> String {
            let (status, body) = self.post("/create-payment-intent", "", token).await;
            assert_eq!(status, StatusCode::OK, "{}", body);
            body["intentId"].as_str().unwrap().to_string()
        }
    }

    fn signature(payload: &str) -> String {
        let t = chrono::Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
        mac.update(format!("{}.{}", t, payload).as_bytes());
        format!("t={},v1={}", t, hex::encode(mac.finalize().into_bytes()))
    }

    #[tokio::test]
    async fn intent_is_priced_per_tier_and_freezes_cart() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 2).await;

        let (status, body) = h.post("/create-payment-intent", "", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["publishableKey"], "pk_test_123");
        let intent_id = body["intentId"].as_str().unwrap();
        assert_eq!(body["clientSecret"], format!("{}_secret", intent_id));
        assert_eq!(h.stripe.get(intent_id).unwrap().amount, 4600);

        let (status, _) = h.post("/create-payment-intent", "", &token).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let frozen = h.store.carts.append("sam@example.com", 1).await;
        assert!(frozen.is_err());
    }

    #[tokio::test]
    async fn empty_cart_cannot_be_paid() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 0).await;
        let (status, body) = h.post("/create-payment-intent", "", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn declined_intent_uses_flat_error_shape() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 1).await;
        *h.stripe.decline.lock().unwrap() = true;

        let (status, body) = h.post("/create-payment-intent", "", &token).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("declined"));

        let cart = h.store.carts.get_cart("sam@example.com").await.unwrap();
        assert_eq!(cart.intent_id, None);
    }

    #[tokio::test]
    async fn paid_intent_claims_cart_and_sends_confirmation() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 2).await;
        let intent_id = h.create_intent(&token).await;

        let (status, _) = h.post("/handle-payment", "", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        h.stripe.pay(&intent_id, 4600);
        let (status, body) = h
            .post("/handle-payment", &format!("intentId={}", intent_id), &token)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "claimed", "claimed": [1, 2], "unavailable": []})
        );

        let slot = h.store.time_slots.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(slot.claimed_by.as_deref(), Some("sam@example.com"));
        let cart = h.store.carts.get_cart("sam@example.com").await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.intent_id, None);

        let sent = h.notifier.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "sam@example.com");
        assert_eq!(sent[0].subject, "Order Confirmation");
        assert!(sent[0].body.contains("46.00 USD"));

        let (status, again) = h
            .post("/handle-payment", &format!("intentId={}", intent_id), &token)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(again, body);
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn handle_payment_after_webhook_reports_recorded_claims() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 2).await;
        let intent_id = h.create_intent(&token).await;
        h.store.time_slots.claim(2, "bo@example.com").await.unwrap();
        h.stripe.pay(&intent_id, 4600);

        let payload = json!({
            "id": "evt_2",
            "object": "event",
            "created": 1,
            "livemode": false,
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": intent_id, "object": "payment_intent" } }
        })
        .to_string();
        assert_eq!(h.webhook(&payload, &signature(&payload)).await, StatusCode::OK);

        let (status, body) = h
            .post("/handle-payment", &format!("intentId={}", intent_id), &token)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "claimed", "claimed": [1], "unavailable": [2]})
        );
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);

        let bo = h.student_with_cart("bo@example.com", 0).await;
        let (status, _) = h
            .post("/handle-payment", &format!("intentId={}", intent_id), &bo)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn underpayment_leaves_cart_untouched() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 1).await;
        let intent_id = h.create_intent(&token).await;
        h.stripe.pay(&intent_id, 2000);

        let (status, body) = h
            .post("/handle-payment", &format!("intentId={}", intent_id), &token)
            .await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["error"]["code"], 402);

        let cart = h.store.carts.get_cart("sam@example.com").await.unwrap();
        assert_eq!(cart.time_slot_ids, vec![1]);
        assert_eq!(cart.intent_id.as_deref(), Some(intent_id.as_str()));
        assert!(h.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_intent_is_a_mismatch() {
        let h = Harness::new().await;
        let sam = h.student_with_cart("sam@example.com", 1).await;
        let bo = h.student_with_cart("bo@example.com", 1).await;
        h.create_intent(&sam).await;
        let bo_intent = h.create_intent(&bo).await;
        h.stripe.pay(&bo_intent, 2500);

        let (status, _) = h
            .post("/handle-payment", &format!("intentId={}", bo_intent), &sam)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let slot = h.store.time_slots.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(slot.claimed_by, None);
    }

    #[tokio::test]
    async fn slots_taken_meanwhile_are_reported_unavailable() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 2).await;
        let intent_id = h.create_intent(&token).await;
        h.store.time_slots.claim(2, "bo@example.com").await.unwrap();
        h.stripe.pay(&intent_id, 4600);

        let (status, body) = h
            .post("/handle-payment", &format!("intentId={}", intent_id), &token)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["claimed"], json!([1]));
        assert_eq!(body["unavailable"], json!([2]));
    }

    #[tokio::test]
    async fn failed_confirmation_email_is_not_surfaced() {
        let h = Harness::build(
            true,
            RecordingNotifier {
                fail: true,
                ..RecordingNotifier::default()
            },
        )
        .await;
        let token = h.student_with_cart("sam@example.com", 1).await;
        let intent_id = h.create_intent(&token).await;
        h.stripe.pay(&intent_id, 2500);

        let (status, body) = h
            .post("/handle-payment", &format!("intentId={}", intent_id), &token)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "claimed");
    }

    #[tokio::test]
    async fn cancel_releases_cart() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 1).await;
        let intent_id = h.create_intent(&token).await;

        let (status, body) = h.post("/cancel-payment-intent", "", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "canceled");
        assert_eq!(body["intentId"], intent_id.as_str());
        assert_eq!(h.stripe.get(&intent_id).unwrap().status, "canceled");

        h.store.carts.append("sam@example.com", 1).await.unwrap();
        let (status, _) = h.post("/cancel-payment-intent", "", &token).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn signed_webhook_reconciles_payment() {
        let h = Harness::new().await;
        let token = h.student_with_cart("sam@example.com", 1).await;
        let intent_id = h.create_intent(&token).await;
        h.stripe.pay(&intent_id, 2500);

        let payload = json!({
            "id": "evt_1",
            "object": "event",
            "created": 1,
            "livemode": false,
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": intent_id, "object": "payment_intent" } }
        })
        .to_string();

        let forged = format!("t={},v1={}", chrono::Utc::now().timestamp(), "0".repeat(64));
        assert_eq!(h.webhook(&payload, &forged).await, StatusCode::BAD_REQUEST);
        let slot = h.store.time_slots.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(slot.claimed_by, None);

        assert_eq!(h.webhook(&payload, &signature(&payload)).await, StatusCode::OK);
        let slot = h.store.time_slots.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(slot.claimed_by.as_deref(), Some("sam@example.com"));

        // Redelivery finds nothing left to do.
        assert_eq!(h.webhook(&payload, &signature(&payload)).await, StatusCode::OK);
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn payments_disabled_is_unavailable() {
        let h = Harness::build(false, RecordingNotifier::default()).await;
        let token = h.student_with_cart("sam@example.com", 1).await;
        let (status, body) = h.post("/create-payment-intent", "", &token).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], 503);
        assert_eq!(
            h.webhook("{}", &signature("{}")).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn checkout_requires_session() {
        let h = Harness::new().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/handle-payment")
            .body(Body::empty())
            .unwrap();
        let (status, _) = h.send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
