//! In-process stores with the same contracts as the Postgres repositories.

use std::collections::HashMap;

use async_trait::async_trait;
use skyway_booking::ledger::{BookingLedger, LedgerError};
use skyway_booking::models::{Booking, BookingFilter, BookingStatus};
use skyway_core::identity::{IdentityError, IdentityStore, NewUser, User};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, IdentityError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.expose() == &user.email) {
            return Err(IdentityError::DuplicateEmail);
        }
        let user = user.into_user(Uuid::new_v4());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.expose() == email)
            .cloned())
    }

    async fn activate(&self, id: Uuid) -> Result<(), IdentityError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
        user.is_active = true;
        user.activation_token = None;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBookingLedger {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingLedger for InMemoryBookingLedger {
    async fn insert(&self, booking: &Booking) -> Result<(), LedgerError> {
        self.bookings.write().await.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, LedgerError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, LedgerError> {
        let mut found: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn save_status(&self, booking: &Booking, expected: BookingStatus) -> Result<(), LedgerError> {
        let mut bookings = self.bookings.write().await;
        let stored = bookings
            .get_mut(&booking.id)
            .ok_or(LedgerError::NotFound(booking.id))?;
        if stored.status != expected {
            return Err(LedgerError::StatusConflict { id: booking.id, expected });
        }
        stored.status = booking.status;
        stored.updated_at = booking.updated_at;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use skyway_booking::models::{FlightSnapshot, Passenger, PaymentDetails};

    fn booking(user_id: Uuid) -> Booking {
        let at = chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Booking::confirmed(
            user_id,
            FlightSnapshot {
                flight: "1".into(),
                airline_name: "BA".into(),
                departure: at,
                arrival: at,
            },
            vec![Passenger {
                name: "Ada".into(),
                age: 36,
                gender: Default::default(),
                seat_preference: None,
            }],
            PaymentDetails::stripe_intent("pi_1"),
            dec!(250),
        )
    }

    #[tokio::test]
    async fn test_save_status_compares_expected_status() {
        let ledger = InMemoryBookingLedger::new();
        let mut b = booking(Uuid::new_v4());
        ledger.insert(&b).await.unwrap();

        let previous = b.cancel().unwrap();
        ledger.save_status(&b, previous).await.unwrap();

        let err = ledger.save_status(&b, BookingStatus::Confirmed).await.unwrap_err();
        assert!(matches!(err, LedgerError::StatusConflict { .. }));
        assert_eq!(ledger.get(b.id).await.unwrap().unwrap().status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let store = InMemoryIdentityStore::new();
        let new_user = || NewUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            phone_number: "+15550100".into(),
            email: "ada@example.com".into(),
            password_hash: "hash".into(),
            country: None,
            activation_token: "tok".into(),
        };

        store.insert_user(new_user()).await.unwrap();
        let err = store.insert_user(new_user()).await.unwrap_err();
        assert!(matches!(err, IdentityError::DuplicateEmail));
    }
}
