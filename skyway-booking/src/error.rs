use skyway_core::{IdentityError, InventoryError, PaymentError, PaymentStatus};

use crate::ledger::LedgerError;
use crate::lifecycle::TransitionError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not enough seats available: requested {requested}, available {available}")]
    Capacity { requested: u32, available: u32 },

    #[error("Seats not available: {}", .0.join(", "))]
    SeatUnavailable(Vec<String>),

    #[error("Payment not completed (status: {0:?})")]
    PaymentNotCompleted(PaymentStatus),

    #[error("No payment information available for refund")]
    RefundNotPossible,

    #[error("External service failed: {0}")]
    Gateway(String),

    #[error("Storage failed: {0}")]
    Persistence(String),
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => BookingError::NotFound("Booking not found".to_string()),
            LedgerError::StatusConflict { .. } => BookingError::Conflict(err.to_string()),
            LedgerError::Storage(msg) => BookingError::Persistence(msg),
        }
    }
}

impl From<IdentityError> for BookingError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(_) => BookingError::NotFound("User not found".to_string()),
            IdentityError::DuplicateEmail => BookingError::Conflict(err.to_string()),
            IdentityError::Storage(msg) => BookingError::Persistence(msg),
        }
    }
}

impl From<InventoryError> for BookingError {
    fn from(err: InventoryError) -> Self {
        BookingError::Gateway(err.to_string())
    }
}

impl From<PaymentError> for BookingError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(id) => BookingError::NotFound(format!("Payment intent not found: {}", id)),
            PaymentError::InvalidAmount(amount) => BookingError::Validation(format!("Invalid amount: {}", amount)),
            other => BookingError::Gateway(other.to_string()),
        }
    }
}

impl From<TransitionError> for BookingError {
    fn from(err: TransitionError) -> Self {
        BookingError::Conflict(err.to_string())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
