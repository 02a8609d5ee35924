use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use skyway_core::{to_minor_units, IdentityStore, NewPaymentIntent, PaymentGateway, PaymentIntent};
use tracing::info;
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};

pub const DEFAULT_CURRENCY: &str = "usd";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentIntentRequest {
    pub amount: Option<Decimal>,
    pub user_id: Option<String>,
}

/// Opens card payment intents on behalf of a customer. The client completes
/// the payment out-of-band with the returned secret.
pub struct PaymentOrchestrator {
    identity: Arc<dyn IdentityStore>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentOrchestrator {
    pub fn new(identity: Arc<dyn IdentityStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            identity,
            gateway,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_lowercase();
        self
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub async fn create_payment_intent(&self, request: PaymentIntentRequest) -> BookingResult<PaymentIntent> {
        let amount = request
            .amount
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| BookingError::Validation("Amount must be greater than zero".to_string()))?;
        let user_id = request
            .user_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| BookingError::Validation("Invalid userId format".to_string()))?;

        let user = self
            .identity
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("User not found".to_string()))?;

        let mut metadata = BTreeMap::new();
        metadata.insert("name".to_string(), user.full_name());
        metadata.insert("phoneNumber".to_string(), user.phone_number.expose().clone());

        let intent = self
            .gateway
            .create_intent(NewPaymentIntent {
                amount: to_minor_units(amount)?,
                currency: self.currency.clone(),
                receipt_email: user.email.expose().clone(),
                metadata,
            })
            .await?;

        if intent.client_secret.is_none() {
            return Err(BookingError::Gateway(format!(
                "Payment intent {} was created without a client secret",
                intent.id
            )));
        }

        info!("Payment intent {} created for user {} ({} {})", intent.id, user.id, intent.amount, intent.currency);
        Ok(intent)
    }
}
