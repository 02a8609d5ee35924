mod common;

use std::sync::Arc;

use common::{FakeGateway, FakeIdentity};
use rust_decimal_macros::dec;
use skyway_booking::{BookingError, PaymentIntentRequest, PaymentOrchestrator};
use skyway_core::PaymentStatus;
use uuid::Uuid;

fn orchestrator() -> (PaymentOrchestrator, Arc<FakeGateway>, Uuid) {
    let (identity, user_id) = FakeIdentity::with_user("ada@example.com");
    let gateway = FakeGateway::new(PaymentStatus::Succeeded);
    let payments = PaymentOrchestrator::new(identity, gateway.clone()).with_currency("USD");
    (payments, gateway, user_id)
}

#[tokio::test]
async fn test_payment_intent_carries_customer_details() {
    let (payments, gateway, user_id) = orchestrator();

    let intent = payments
        .create_payment_intent(PaymentIntentRequest {
            amount: Some(dec!(19.995)),
            user_id: Some(user_id.to_string()),
        })
        .await
        .unwrap();
    assert_eq!(intent.client_secret.as_deref(), Some("pi_new_secret"));

    let created = gateway.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    let sent = &created[0];
    assert_eq!(sent.amount, 2000);
    assert_eq!(sent.currency, "usd");
    assert_eq!(sent.receipt_email, "ada@example.com");
    assert_eq!(sent.metadata.get("name").map(String::as_str), Some("Ada Lovelace"));
    assert_eq!(sent.metadata.get("phoneNumber").map(String::as_str), Some("+15550100"));
    assert_eq!(sent.metadata.len(), 2);
}

#[tokio::test]
async fn test_unknown_owner_is_not_found() {
    let (payments, gateway, _) = orchestrator();

    let err = payments
        .create_payment_intent(PaymentIntentRequest {
            amount: Some(dec!(250.00)),
            user_id: Some(Uuid::new_v4().to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(ref m) if m == "User not found"));
    assert!(gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_positive_or_missing_amount_is_rejected() {
    let (payments, gateway, user_id) = orchestrator();

    for amount in [Some(dec!(0)), Some(dec!(-5.00)), None] {
        let err = payments
            .create_payment_intent(PaymentIntentRequest { amount, user_id: Some(user_id.to_string()) })
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    let err = payments
        .create_payment_intent(PaymentIntentRequest { amount: Some(dec!(10)), user_id: Some("42".into()) })
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(ref m) if m == "Invalid userId format"));
    assert!(gateway.created.lock().unwrap().is_empty());
}
