use crate::error::StripeError;
use reqwest::RequestBuilder;
use serde::Deserialize;
use tracing::{debug, info, warn};
use tutorlink_common::services::{
    BoxFuture, PaymentIntentRequest, PaymentIntentResult, PaymentService,
};
use tutorlink_common::HTTP_CLIENT;
use tutorlink_config::StripeConfig;

const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Error envelope of every non-2xx Stripe response.
#[derive(Deserialize, Debug)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize, Debug)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// PaymentIntents over Stripe's form-encoded REST API.
pub struct StripePaymentService {
    secret_key: String,
    api_base: String,
}

impl StripePaymentService {
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        if config.secret_key.trim().is_empty() {
            return Err(StripeError::ConfigError);
        }
        let api_base = config
            .api_base
            .as_deref()
            .unwrap_or(STRIPE_API_BASE)
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            secret_key: config.secret_key.clone(),
            api_base,
        })
    }

    fn intent_url(&self, payment_intent_id: &str) -> Result<String, StripeError> {
        // The id ends up in the URL path, so only Stripe's own id alphabet is allowed.
        let well_formed = !payment_intent_id.is_empty()
            && payment_intent_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !well_formed {
            return Err(StripeError::InvalidIntentId(payment_intent_id.to_string()));
        }
        Ok(format!(
            "{}/v1/payment_intents/{}",
            self.api_base, payment_intent_id
        ))
    }

    async fn send(&self, request: RequestBuilder) -> Result<PaymentIntentResult, StripeError> {
        let response = request
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;
        debug!("[Stripe] API response status: {}", status);

        if status.is_success() {
            return Ok(serde_json::from_str(&body_text)?);
        }

        let message = serde_json::from_str::<StripeErrorBody>(&body_text)
            .ok()
            .and_then(|body| body.error.message)
            .unwrap_or(body_text);
        warn!("[Stripe] API request failed with {}: {}", status, message);
        Err(StripeError::ApiError {
            status_code: status.as_u16(),
            message,
        })
    }
}

impl PaymentService for StripePaymentService {
    type Error = StripeError;

    fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error> {
        Box::pin(async move {
            let mut form_body: Vec<(String, String)> = vec![
                ("amount".to_string(), request.amount.to_string()),
                ("currency".to_string(), request.currency.to_lowercase()),
            ];
            if let Some(description) = request.description {
                form_body.push(("description".to_string(), description));
            }
            for (key, value) in request.metadata {
                form_body.push((format!("metadata[{}]", key), value));
            }

            let url = format!("{}/v1/payment_intents", self.api_base);
            info!(
                "[Stripe] Creating PaymentIntent for {} {}",
                request.amount, request.currency
            );
            let intent = self.send(HTTP_CLIENT.post(&url).form(&form_body)).await?;
            info!("[Stripe] PaymentIntent {} created", intent.id);
            Ok(intent)
        })
    }

    fn retrieve_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error> {
        let url = self.intent_url(payment_intent_id);
        Box::pin(async move {
            let url = url?;
            debug!("[Stripe] Retrieving {}", url);
            self.send(HTTP_CLIENT.get(&url)).await
        })
    }

    fn cancel_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> BoxFuture<'_, PaymentIntentResult, Self::Error> {
        let url = self.intent_url(payment_intent_id);
        Box::pin(async move {
            let url = format!("{}/cancel", url?);
            let intent = self.send(HTTP_CLIENT.post(&url)).await?;
            info!("[Stripe] PaymentIntent {} is {}", intent.id, intent.status);
            Ok(intent)
        })
    }
}
