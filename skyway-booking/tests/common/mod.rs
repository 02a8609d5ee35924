#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use skyway_booking::{Booking, BookingFilter, BookingLedger, BookingOrchestrator, BookingStatus, LedgerError};
use skyway_core::{
    FlightOffer, IdentityError, IdentityStore, InventoryClient, InventoryError, NewPaymentIntent, NewUser,
    Notifier, NotifyError, OfferQuery, PaymentError, PaymentGateway, PaymentIntent, PaymentReference,
    PaymentStatus, Refund, User,
};
use skyway_shared::Notification;
use uuid::Uuid;

#[derive(Default)]
pub struct FakeIdentity {
    pub users: Mutex<HashMap<Uuid, User>>,
}

impl FakeIdentity {
    pub fn with_user(email: &str) -> (Arc<Self>, Uuid) {
        let store = Arc::new(Self::default());
        let id = Uuid::new_v4();
        let mut user = NewUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone_number: "+15550100".into(),
            email: email.into(),
            password_hash: "hash".into(),
            country: Some("UK".into()),
            activation_token: "tok".into(),
        }
        .into_user(id);
        user.is_active = true;
        store.users.lock().unwrap().insert(id, user);
        (store, id)
    }
}

#[async_trait]
impl IdentityStore for FakeIdentity {
    async fn insert_user(&self, user: NewUser) -> Result<User, IdentityError> {
        let user = user.into_user(Uuid::new_v4());
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        Ok(self.users.lock().unwrap().values().find(|u| u.email.expose() == email).cloned())
    }

    async fn activate(&self, id: Uuid) -> Result<(), IdentityError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
        user.is_active = true;
        user.activation_token = None;
        Ok(())
    }
}

pub struct FakeInventory {
    pub offers: Vec<FlightOffer>,
    pub queries: Mutex<Vec<OfferQuery>>,
}

impl FakeInventory {
    pub fn new(offers: Vec<FlightOffer>) -> Arc<Self> {
        Arc::new(Self { offers, queries: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl InventoryClient for FakeInventory {
    async fn search_offers(&self, query: &OfferQuery) -> Result<Vec<FlightOffer>, InventoryError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.offers.clone())
    }
}

pub struct FakeGateway {
    pub status: PaymentStatus,
    pub fail_refund: bool,
    pub refunds: Mutex<Vec<(PaymentReference, i64)>>,
    pub created: Mutex<Vec<NewPaymentIntent>>,
}

impl FakeGateway {
    pub fn new(status: PaymentStatus) -> Arc<Self> {
        Arc::new(Self {
            status,
            fail_refund: false,
            refunds: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_refunds() -> Arc<Self> {
        Arc::new(Self {
            status: PaymentStatus::Succeeded,
            fail_refund: true,
            refunds: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, PaymentError> {
        let created = PaymentIntent {
            id: "pi_new".into(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            status: PaymentStatus::RequiresPaymentMethod,
            client_secret: Some("pi_new_secret".into()),
            receipt_email: Some(intent.receipt_email.clone()),
            metadata: intent.metadata.clone(),
        };
        self.created.lock().unwrap().push(intent);
        Ok(created)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        Ok(PaymentIntent {
            id: intent_id.to_string(),
            amount: 25000,
            currency: "usd".into(),
            status: self.status.clone(),
            client_secret: None,
            receipt_email: None,
            metadata: Default::default(),
        })
    }

    async fn refund(&self, reference: &PaymentReference, amount: i64) -> Result<Refund, PaymentError> {
        if self.fail_refund {
            return Err(PaymentError::Provider { status: 402, message: "card_declined".into() });
        }
        self.refunds.lock().unwrap().push((reference.clone(), amount));
        Ok(Refund { id: "re_1".into(), amount, status: "succeeded".into() })
    }
}

#[derive(Default)]
pub struct FakeLedger {
    pub bookings: Mutex<Vec<Booking>>,
    pub fail_save: bool,
}

#[async_trait]
impl BookingLedger for FakeLedger {
    async fn insert(&self, booking: &Booking) -> Result<(), LedgerError> {
        self.bookings.lock().unwrap().push(booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, LedgerError> {
        Ok(self.bookings.lock().unwrap().iter().find(|b| b.id == id).cloned())
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, LedgerError> {
        Ok(self.bookings.lock().unwrap().iter().filter(|b| filter.matches(b)).cloned().collect())
    }

    async fn save_status(&self, booking: &Booking, expected: BookingStatus) -> Result<(), LedgerError> {
        if self.fail_save {
            return Err(LedgerError::Storage("connection reset".into()));
        }
        let mut bookings = self.bookings.lock().unwrap();
        let stored = bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or(LedgerError::NotFound(booking.id))?;
        if stored.status != expected {
            return Err(LedgerError::StatusConflict { id: booking.id, expected });
        }
        stored.status = booking.status;
        stored.updated_at = booking.updated_at;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub fail: bool,
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("relay refused".into()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub fn offer(id: &str, seats: u32, available: &[&str]) -> FlightOffer {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "numberOfBookableSeats": seats,
        "itineraries": [{
            "segments": [
                {
                    "departure": {"iataCode": "JFK", "at": "2025-03-01T08:00:00"},
                    "arrival": {"iataCode": "KEF", "at": "2025-03-01T13:00:00"},
                    "carrierCode": "FI",
                    "availableSeats": available
                },
                {
                    "departure": {"iataCode": "KEF", "at": "2025-03-01T15:00:00"},
                    "arrival": {"iataCode": "LHR", "at": "2025-03-01T19:05:00"},
                    "carrierCode": "FI"
                }
            ]
        }],
        "price": {"currency": "USD", "total": "250.00"},
        "validatingAirlineCodes": ["FI"]
    }))
    .unwrap()
}

pub struct Harness {
    pub orchestrator: BookingOrchestrator,
    pub identity: Arc<FakeIdentity>,
    pub inventory: Arc<FakeInventory>,
    pub gateway: Arc<FakeGateway>,
    pub ledger: Arc<FakeLedger>,
    pub notifier: Arc<FakeNotifier>,
    pub user_id: Uuid,
}

pub fn harness(gateway: Arc<FakeGateway>, ledger: FakeLedger, notifier: FakeNotifier) -> Harness {
    let (identity, user_id) = FakeIdentity::with_user("ada@example.com");
    let inventory = FakeInventory::new(vec![offer("1", 9, &["12B", "14C"]), offer("2", 1, &[])]);
    let ledger = Arc::new(ledger);
    let notifier = Arc::new(notifier);
    let orchestrator = BookingOrchestrator::new(
        identity.clone(),
        inventory.clone(),
        gateway.clone(),
        ledger.clone(),
        notifier.clone(),
    );
    Harness { orchestrator, identity, inventory, gateway, ledger, notifier, user_id }
}
