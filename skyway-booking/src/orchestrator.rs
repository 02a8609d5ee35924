use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use skyway_core::{
    to_minor_units, IdentityStore, InventoryClient, Notifier, OfferQuery, PaymentGateway,
    PaymentStatus, Refund,
};
use skyway_shared::Notification;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::documents;
use crate::error::{BookingError, BookingResult};
use crate::ledger::BookingLedger;
use crate::models::{
    Booking, BookingFilter, FlightSnapshot, Gender, Passenger, PaymentDetails, SeatPreference,
};

const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Request / Outcome Types
// ============================================================================

/// Raw create-booking payload. Every field is optional so missing values come
/// back as a validation error instead of a decoder rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBookingRequest {
    pub user_id: Option<String>,
    pub flight_id: Option<String>,
    pub passengers: Option<Vec<PassengerInput>>,
    pub seat_preferences: Option<Vec<String>>,
    pub payment_intent_id: Option<String>,
    pub amount: Option<Decimal>,
    pub origin_location_code: Option<String>,
    pub destination_location_code: Option<String>,
    pub departure_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassengerInput {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub seat_preference: Option<String>,
}

/// A create request that passed validation.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub owner_id: Uuid,
    pub flight_id: String,
    pub passengers: Vec<Passenger>,
    pub seat_codes: Vec<String>,
    pub payment_intent_id: String,
    pub amount: Decimal,
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub booking: Booking,
    pub notification_sent: bool,
}

#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    pub booking: Booking,
    pub refund: Refund,
    pub notification_sent: bool,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl CreateBookingRequest {
    pub fn validate(self) -> BookingResult<BookingDraft> {
        let mut missing = Vec::new();
        if present(&self.user_id).is_none() {
            missing.push("userId");
        }
        if present(&self.flight_id).is_none() {
            missing.push("flightId");
        }
        if self.passengers.is_none() {
            missing.push("passengers");
        }
        if present(&self.payment_intent_id).is_none() {
            missing.push("paymentIntentId");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if present(&self.origin_location_code).is_none() {
            missing.push("originLocationCode");
        }
        if present(&self.destination_location_code).is_none() {
            missing.push("destinationLocationCode");
        }
        if present(&self.departure_date).is_none() {
            missing.push("departureDate");
        }
        if !missing.is_empty() {
            return Err(BookingError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let owner_id = present(&self.user_id)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| BookingError::Validation("Invalid userId format".to_string()))?;

        let amount = self.amount.unwrap_or_default();
        if amount <= Decimal::ZERO {
            return Err(BookingError::Validation("Amount must be greater than zero".to_string()));
        }

        let departure_date = present(&self.departure_date)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| {
                BookingError::Validation("departureDate must be formatted YYYY-MM-DD".to_string())
            })?;

        let inputs = self.passengers.unwrap_or_default();
        if inputs.is_empty() {
            return Err(BookingError::Validation("At least one passenger is required".to_string()));
        }
        let passengers = inputs
            .into_iter()
            .enumerate()
            .map(|(i, p)| p.normalize(i))
            .collect::<BookingResult<Vec<_>>>()?;

        let seat_codes = self
            .seat_preferences
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(BookingDraft {
            owner_id,
            flight_id: present(&self.flight_id).unwrap_or_default().to_string(),
            passengers,
            seat_codes,
            payment_intent_id: present(&self.payment_intent_id).unwrap_or_default().to_string(),
            amount,
            origin: present(&self.origin_location_code).unwrap_or_default().to_string(),
            destination: present(&self.destination_location_code).unwrap_or_default().to_string(),
            departure_date,
        })
    }
}

impl PassengerInput {
    /// Unset or blank gender becomes `Other`; blank seat preference becomes none.
    fn normalize(self, index: usize) -> BookingResult<Passenger> {
        let name = present(&self.name)
            .ok_or_else(|| BookingError::Validation(format!("Passenger {} is missing a name", index + 1)))?
            .to_string();
        let age = self
            .age
            .ok_or_else(|| BookingError::Validation(format!("Passenger {} is missing an age", index + 1)))?;

        let gender = match present(&self.gender) {
            Some(g) => g.parse::<Gender>().map_err(BookingError::Validation)?,
            None => Gender::default(),
        };
        let seat_preference = present(&self.seat_preference)
            .map(|s| s.parse::<SeatPreference>().map_err(BookingError::Validation))
            .transpose()?;

        Ok(Passenger { name, age, gender, seat_preference })
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Sequences a booking across inventory, payment, ledger and notifier.
///
/// The payment check is the only gate to `Confirmed`: nothing is written to
/// the ledger until the intent reports `succeeded`. Cancellation refunds first
/// and only then persists `Cancelled`; a crash between the two leaves a refund
/// with a still-confirmed booking and there is no automatic reconciliation.
pub struct BookingOrchestrator {
    identity: Arc<dyn IdentityStore>,
    inventory: Arc<dyn InventoryClient>,
    payments: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn BookingLedger>,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
}

impl BookingOrchestrator {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        inventory: Arc<dyn InventoryClient>,
        payments: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn BookingLedger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            identity,
            inventory,
            payments,
            ledger,
            notifier,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub async fn create_booking(&self, request: CreateBookingRequest) -> BookingResult<BookingOutcome> {
        // 1. Validate
        let draft = request.validate()?;

        // 2. Resolve owner
        let owner = self
            .identity
            .find_by_id(draft.owner_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("User not found".to_string()))?;

        // 3. Re-query inventory; it is the authority on the offer
        let passenger_count = draft.passengers.len() as u32;
        let query = OfferQuery::new(&draft.origin, &draft.destination, draft.departure_date, passenger_count);
        let offers = self.inventory.search_offers(&query).await?;
        let offer = offers
            .into_iter()
            .find(|o| o.id == draft.flight_id)
            .ok_or_else(|| BookingError::NotFound("Flight not found in inventory".to_string()))?;

        // 4. Capacity
        if offer.number_of_bookable_seats < passenger_count {
            return Err(BookingError::Capacity {
                requested: passenger_count,
                available: offer.number_of_bookable_seats,
            });
        }

        // 5. Requested seats
        let unavailable = offer.unavailable_seats(&draft.seat_codes);
        if !unavailable.is_empty() {
            return Err(BookingError::SeatUnavailable(unavailable));
        }

        // 6. Payment gate
        let intent = self.payments.retrieve_intent(&draft.payment_intent_id).await?;
        if intent.status != PaymentStatus::Succeeded {
            warn!(
                "Payment intent {} not completed for user {} (status {:?})",
                intent.id, owner.id, intent.status
            );
            return Err(BookingError::PaymentNotCompleted(intent.status));
        }

        // 7. Persist
        let snapshot = FlightSnapshot {
            airline_name: offer
                .carrier()
                .ok_or_else(|| BookingError::Gateway(format!("Offer {} has no validating carrier", offer.id)))?
                .to_string(),
            departure: offer
                .departure_at()
                .ok_or_else(|| BookingError::Gateway(format!("Offer {} has no departure", offer.id)))?,
            arrival: offer
                .arrival_at()
                .ok_or_else(|| BookingError::Gateway(format!("Offer {} has no arrival", offer.id)))?,
            flight: offer.id,
        };
        let booking = Booking::confirmed(
            owner.id,
            snapshot,
            draft.passengers,
            PaymentDetails::stripe_intent(draft.payment_intent_id),
            draft.amount,
        );
        self.ledger.insert(&booking).await?;
        info!(
            "Booking confirmed: {} (user {}, flight {}, tickets {})",
            booking.id, booking.user_id, booking.flight, booking.tickets_count
        );

        // 8. Notify
        let notice = documents::confirmation_notice(owner.email.expose(), &booking);
        let notification_sent = self.dispatch(&notice, booking.id).await;

        Ok(BookingOutcome { booking, notification_sent })
    }

    pub async fn cancel_booking(&self, booking_id: &str) -> BookingResult<CancellationOutcome> {
        let not_found = || BookingError::NotFound("Booking not found".to_string());

        // 1. Resolve booking and owner
        let id = Uuid::parse_str(booking_id.trim()).map_err(|_| not_found())?;
        let booking = self.ledger.get(id).await?.ok_or_else(not_found)?;
        let owner = self
            .identity
            .find_by_id(booking.user_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking owner not found".to_string()))?;

        // 2. Transition check happens before any money moves
        let mut cancelled = booking.clone();
        let previous = cancelled.cancel()?;

        // 3. Refund target
        let reference = booking
            .payment_details
            .refund_reference()
            .ok_or(BookingError::RefundNotPossible)?;

        // 4. Refund the full recorded total
        let amount = to_minor_units(booking.total_price)?;
        let refund = self.payments.refund(&reference, amount).await?;
        info!("Refund {} issued for booking {} ({} minor units)", refund.id, booking.id, amount);

        // 5. Persist only after the refund went through
        if let Err(e) = self.ledger.save_status(&cancelled, previous).await {
            error!(
                "Refund {} issued but booking {} could not be marked cancelled: {}",
                refund.id, booking.id, e
            );
            return Err(e.into());
        }
        info!("Booking cancelled: {}", cancelled.id);

        // 6. Notify
        let notice = documents::cancellation_notice(owner.email.expose(), &cancelled);
        let notification_sent = self.dispatch(&notice, cancelled.id).await;

        Ok(CancellationOutcome {
            booking: cancelled,
            refund,
            notification_sent,
        })
    }

    pub async fn list_bookings(&self, filter: &BookingFilter) -> BookingResult<Vec<Booking>> {
        Ok(self.ledger.list(filter).await?)
    }

    pub async fn get_booking(&self, id: Uuid) -> BookingResult<Booking> {
        self.ledger
            .get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))
    }

    /// Send a notice; failures and timeouts are logged, never propagated.
    async fn dispatch(&self, notice: &Notification, booking_id: Uuid) -> bool {
        match tokio::time::timeout(self.notify_timeout, self.notifier.send(notice)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Notification '{}' for booking {} failed: {}", notice.subject, booking_id, e);
                false
            }
            Err(_) => {
                warn!("Notification '{}' for booking {} timed out", notice.subject, booking_id);
                false
            }
        }
    }
}
