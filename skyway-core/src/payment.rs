use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Intent states as reported by the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Minor units (cents).
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub client_secret: Option<String>,
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    /// Minor units (cents).
    pub amount: i64,
    pub currency: String,
    pub receipt_email: String,
    pub metadata: BTreeMap<String, String>,
}

/// What a refund is issued against. Intents are preferred; charges cover
/// bookings paid through the older charge flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentReference {
    Intent(String),
    Charge(String),
}

impl PaymentReference {
    pub fn id(&self) -> &str {
        match self {
            PaymentReference::Intent(id) | PaymentReference::Charge(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Refund {
    pub id: String,
    pub amount: i64,
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment intent not found: {0}")]
    NotFound(String),
    #[error("Payment provider transport error: {0}")]
    Transport(String),
    #[error("Payment provider rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("Payment provider response could not be decoded: {0}")]
    Decode(String),
    #[error("Amount cannot be represented in minor units: {0}")]
    InvalidAmount(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, PaymentError>;

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError>;

    /// Refund `amount` minor units against the given reference.
    async fn refund(&self, reference: &PaymentReference, amount: i64) -> Result<Refund, PaymentError>;
}

/// Convert a decimal currency amount to the provider's integer minor units:
/// `round(amount * 100)`, ties rounded away from zero, in exact decimal
/// arithmetic.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))?;
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| PaymentError::InvalidAmount(amount.to_string()))
}
