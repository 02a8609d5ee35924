use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, FlightSnapshot, Passenger, PaymentDetails};

/// Allowed status transitions.
///
/// Bookings are written `Confirmed` once the payment has been verified, so the
/// only move left is `Confirmed → Cancelled`, driven by a successful refund.
impl BookingStatus {
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!((self, next), (BookingStatus::Confirmed, BookingStatus::Cancelled))
    }

    pub fn is_terminal(self) -> bool {
        self == BookingStatus::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
}

impl Booking {
    /// Build the record for a booking whose payment has already succeeded.
    pub fn confirmed(
        user_id: Uuid,
        snapshot: FlightSnapshot,
        passengers: Vec<Passenger>,
        payment_details: PaymentDetails,
        total_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        let tickets_count = passengers.len() as u32;
        Self {
            id: Uuid::new_v4(),
            user_id,
            flight: snapshot.flight,
            airline_name: snapshot.airline_name,
            departure: snapshot.departure,
            arrival: snapshot.arrival,
            passengers,
            payment_details,
            total_price,
            tickets_count,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition: Confirmed → Cancelled. Returns the status it left.
    pub fn cancel(&mut self) -> Result<BookingStatus, TransitionError> {
        self.transition(BookingStatus::Cancelled)
    }

    fn transition(&mut self, next: BookingStatus) -> Result<BookingStatus, TransitionError> {
        let from = self.status;

        if from == BookingStatus::Cancelled && next == BookingStatus::Cancelled {
            return Err(TransitionError::AlreadyCancelled);
        }
        if !from.can_transition_to(next) {
            return Err(TransitionError::InvalidTransition { from, to: next });
        }

        self.status = next;
        self.updated_at = Utc::now();
        Ok(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn booking() -> Booking {
        let at = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        Booking::confirmed(
            Uuid::new_v4(),
            FlightSnapshot {
                flight: "1".to_string(),
                airline_name: "FI".to_string(),
                departure: at,
                arrival: at,
            },
            vec![
                Passenger { name: "Ada".into(), age: 36, gender: Gender::Female, seat_preference: None },
                Passenger { name: "Bo".into(), age: 7, gender: Gender::Other, seat_preference: None },
            ],
            PaymentDetails::stripe_intent("pi_1"),
            dec!(250.00),
        )
    }

    #[test]
    fn test_booking_lifecycle() {
        let mut b = booking();
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert_eq!(b.tickets_count, 2);

        // Confirmed → Cancelled
        assert_eq!(b.cancel().unwrap(), BookingStatus::Confirmed);
        assert_eq!(b.status, BookingStatus::Cancelled);
        assert!(b.status.is_terminal());

        // Second cancel is rejected
        assert_eq!(b.cancel(), Err(TransitionError::AlreadyCancelled));
        assert_eq!(b.tickets_count, 2);
    }

    #[test]
    fn test_pending_cannot_be_cancelled() {
        let mut b = booking();
        b.status = BookingStatus::Pending;
        assert_eq!(
            b.cancel(),
            Err(TransitionError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Cancelled,
            })
        );
        assert_eq!(b.status, BookingStatus::Pending);
    }

    #[test]
    fn test_transition_table() {
        use BookingStatus::*;
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Pending));
    }
}
