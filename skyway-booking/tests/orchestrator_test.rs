mod common;

use common::{harness, FakeGateway, FakeLedger, FakeNotifier};
use rust_decimal_macros::dec;
use skyway_booking::{
    Booking, BookingError, BookingFilter, BookingStatus, CreateBookingRequest, Gender, PaymentDetails,
    PaymentMethod,
};
use skyway_core::{PaymentReference, PaymentStatus};
use uuid::Uuid;

fn create_request(user_id: Uuid, flight_id: &str, passengers: usize, seats: &[&str]) -> CreateBookingRequest {
    let passengers: Vec<_> = (0..passengers)
        .map(|i| serde_json::json!({"name": format!("Passenger {}", i + 1), "age": 30 + i}))
        .collect();
    serde_json::from_value(serde_json::json!({
        "userId": user_id.to_string(),
        "flightId": flight_id,
        "passengers": passengers,
        "seatPreferences": seats,
        "paymentIntentId": "pi_123",
        "amount": 250.00,
        "originLocationCode": "JFK",
        "destinationLocationCode": "LHR",
        "departureDate": "2025-03-01"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_create_booking_confirms_after_payment() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());

    let outcome = h
        .orchestrator
        .create_booking(create_request(h.user_id, "1", 2, &["12B"]))
        .await
        .unwrap();

    let booking = &outcome.booking;
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.tickets_count, 2);
    assert_eq!(booking.passengers.len(), 2);
    assert!(booking.passengers.iter().all(|p| p.gender == Gender::Other));
    assert_eq!(booking.airline_name, "FI");
    assert_eq!(booking.departure.to_string(), "2025-03-01 08:00:00");
    assert_eq!(booking.arrival.to_string(), "2025-03-01 19:05:00");
    assert_eq!(booking.total_price, dec!(250));
    assert_eq!(booking.payment_details.method, PaymentMethod::Stripe);
    assert_eq!(booking.payment_details.payment_intent_id.as_deref(), Some("pi_123"));
    assert!(outcome.notification_sent);

    // Exactly one ledger write, inventory re-queried with the passenger count
    assert_eq!(h.ledger.bookings.lock().unwrap().len(), 1);
    let queries = h.inventory.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].adults, 2);
    assert_eq!(queries[0].max, 30);

    let sent = h.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Booking Confirmation");
    assert_eq!(sent[0].to.expose(), "ada@example.com");
}

#[tokio::test]
async fn test_unpaid_intent_creates_no_booking() {
    for status in [PaymentStatus::RequiresPaymentMethod, PaymentStatus::Processing, PaymentStatus::Canceled] {
        let h = harness(FakeGateway::new(status.clone()), FakeLedger::default(), FakeNotifier::default());

        let err = h
            .orchestrator
            .create_booking(create_request(h.user_id, "1", 1, &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::PaymentNotCompleted(s) if s == status));
        assert!(h.ledger.bookings.lock().unwrap().is_empty());
        assert!(h.notifier.sent.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_unknown_owner_and_offer_are_not_found() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());

    let err = h
        .orchestrator
        .create_booking(create_request(Uuid::new_v4(), "1", 1, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(m) if m == "User not found"));

    let err = h
        .orchestrator
        .create_booking(create_request(h.user_id, "99", 1, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
    assert!(h.ledger.bookings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_capacity_is_checked_against_passenger_count() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());

    let err = h
        .orchestrator
        .create_booking(create_request(h.user_id, "2", 2, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::Capacity { requested: 2, available: 1 }));
    assert!(h.ledger.bookings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_seat_is_listed() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());

    let err = h
        .orchestrator
        .create_booking(create_request(h.user_id, "1", 2, &["12A", "14C"]))
        .await
        .unwrap_err();

    match err {
        BookingError::SeatUnavailable(seats) => assert_eq!(seats, vec!["12A"]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        BookingError::SeatUnavailable(vec!["12A".into()]).to_string(),
        "Seats not available: 12A"
    );
    assert!(h.ledger.bookings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_notification_failure_is_degraded_success() {
    let notifier = FakeNotifier { fail: true, ..Default::default() };
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), notifier);

    let outcome = h
        .orchestrator
        .create_booking(create_request(h.user_id, "1", 1, &[]))
        .await
        .unwrap();

    assert!(!outcome.notification_sent);
    assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
    assert_eq!(h.ledger.bookings.lock().unwrap().len(), 1);
}

async fn confirmed_booking(h: &common::Harness) -> Booking {
    h.orchestrator
        .create_booking(create_request(h.user_id, "1", 1, &[]))
        .await
        .unwrap()
        .booking
}

#[tokio::test]
async fn test_cancel_refunds_then_marks_cancelled() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());
    let booking = confirmed_booking(&h).await;

    let outcome = h.orchestrator.cancel_booking(&booking.id.to_string()).await.unwrap();

    assert_eq!(outcome.booking.status, BookingStatus::Cancelled);
    assert_eq!(outcome.refund.amount, 25000);
    assert!(outcome.notification_sent);
    assert_eq!(
        h.gateway.refunds.lock().unwrap().as_slice(),
        &[(PaymentReference::Intent("pi_123".into()), 25000)]
    );

    // Re-fetching keeps reporting Cancelled
    let stored = h.orchestrator.get_booking(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
    assert_eq!(stored.tickets_count, 1);

    let sent = h.notifier.sent.lock().unwrap();
    assert_eq!(sent.last().unwrap().subject, "Booking Cancellation Confirmation");
}

#[tokio::test]
async fn test_second_cancel_is_rejected_without_refund() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());
    let booking = confirmed_booking(&h).await;

    h.orchestrator.cancel_booking(&booking.id.to_string()).await.unwrap();
    let err = h.orchestrator.cancel_booking(&booking.id.to_string()).await.unwrap_err();

    assert!(matches!(err, BookingError::Conflict(_)));
    assert_eq!(h.gateway.refunds.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_without_payment_reference() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());
    let mut booking = confirmed_booking(&h).await;
    booking.payment_details = PaymentDetails { method: PaymentMethod::Paypal, payment_intent_id: None, charge_id: None };
    h.ledger.bookings.lock().unwrap()[0] = booking.clone();

    let err = h.orchestrator.cancel_booking(&booking.id.to_string()).await.unwrap_err();

    assert!(matches!(err, BookingError::RefundNotPossible));
    assert!(h.gateway.refunds.lock().unwrap().is_empty());
    let stored = h.orchestrator.get_booking(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_cancel_falls_back_to_charge_and_rounds_half_away() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());
    let mut booking = confirmed_booking(&h).await;
    booking.payment_details.payment_intent_id = None;
    booking.payment_details.charge_id = Some("ch_9".into());
    booking.total_price = dec!(19.995);
    h.ledger.bookings.lock().unwrap()[0] = booking.clone();

    h.orchestrator.cancel_booking(&booking.id.to_string()).await.unwrap();

    assert_eq!(
        h.gateway.refunds.lock().unwrap().as_slice(),
        &[(PaymentReference::Charge("ch_9".into()), 2000)]
    );
}

#[tokio::test]
async fn test_failed_refund_leaves_booking_confirmed() {
    let h = harness(FakeGateway::failing_refunds(), FakeLedger::default(), FakeNotifier::default());
    let booking = confirmed_booking(&h).await;

    let err = h.orchestrator.cancel_booking(&booking.id.to_string()).await.unwrap_err();

    assert!(matches!(err, BookingError::Gateway(_)));
    let stored = h.orchestrator.get_booking(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_persist_failure_after_refund_surfaces_persistence_error() {
    let ledger = FakeLedger { fail_save: true, ..Default::default() };
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), ledger, FakeNotifier::default());
    let booking = confirmed_booking(&h).await;

    let err = h.orchestrator.cancel_booking(&booking.id.to_string()).await.unwrap_err();

    assert!(matches!(err, BookingError::Persistence(_)));
    assert_eq!(h.gateway.refunds.lock().unwrap().len(), 1);
    // Only the confirmation went out
    assert_eq!(h.notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_unknown_booking() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());

    let err = h.orchestrator.cancel_booking(&Uuid::new_v4().to_string()).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));

    let err = h.orchestrator.cancel_booking("garbage").await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
}

#[tokio::test]
async fn test_list_bookings_filters() {
    let h = harness(FakeGateway::new(PaymentStatus::Succeeded), FakeLedger::default(), FakeNotifier::default());
    let first = confirmed_booking(&h).await;
    confirmed_booking(&h).await;
    h.orchestrator.cancel_booking(&first.id.to_string()).await.unwrap();

    let all = h.orchestrator.list_bookings(&BookingFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let cancelled = h
        .orchestrator
        .list_bookings(&BookingFilter { status: Some(BookingStatus::Cancelled), owner: None })
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, first.id);

    let other_owner = h
        .orchestrator
        .list_bookings(&BookingFilter { owner: Some(Uuid::new_v4()), status: None })
        .await
        .unwrap();
    assert!(other_owner.is_empty());
}
