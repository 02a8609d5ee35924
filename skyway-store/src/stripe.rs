//! Reqwest-backed Stripe adapter for payment intents and refunds.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use skyway_core::payment::{
    NewPaymentIntent, PaymentError, PaymentGateway, PaymentIntent, PaymentReference, Refund,
};

use crate::app_config::StripeConfig;

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, PaymentError> {
        let response = request
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(PaymentError::NotFound(resource.to_string()));
        }
        if !status.is_success() {
            let message = serde_json::from_slice::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            return Err(PaymentError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| PaymentError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, PaymentError> {
        let mut form = vec![
            ("amount".to_string(), intent.amount.to_string()),
            ("currency".to_string(), intent.currency),
            ("payment_method_types[]".to_string(), "card".to_string()),
            ("receipt_email".to_string(), intent.receipt_email),
        ];
        form.extend(
            intent
                .metadata
                .into_iter()
                .map(|(k, v)| (format!("metadata[{}]", k), v)),
        );

        let created: PaymentIntent = self
            .execute(self.client.post(self.url("/v1/payment_intents")).form(&form), "payment_intent")
            .await?;
        tracing::info!(intent_id = %created.id, amount = created.amount, "Payment intent created");
        Ok(created)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        // Ids are interpolated into the path; anything but [A-Za-z0-9_] cannot name an intent.
        if intent_id.is_empty() || !intent_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            tracing::warn!(intent_id = %intent_id, "Malformed payment intent id rejected");
            return Err(PaymentError::NotFound(intent_id.to_string()));
        }
        let path = format!("/v1/payment_intents/{}", intent_id);
        self.execute(self.client.get(self.url(&path)), intent_id).await
    }

    async fn refund(&self, reference: &PaymentReference, amount: i64) -> Result<Refund, PaymentError> {
        let target = match reference {
            PaymentReference::Intent(_) => "payment_intent",
            PaymentReference::Charge(_) => "charge",
        };
        let form = [(target, reference.id().to_string()), ("amount", amount.to_string())];

        let refund: Refund = self
            .execute(self.client.post(self.url("/v1/refunds")).form(&form), reference.id())
            .await?;
        tracing::info!(refund_id = %refund.id, reference = %reference.id(), amount, "Refund issued");
        Ok(refund)
    }
}
