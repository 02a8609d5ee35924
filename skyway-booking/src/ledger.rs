use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Booking, BookingFilter, BookingStatus};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Booking not found: {0}")]
    NotFound(Uuid),

    /// The stored status no longer matches the one the caller read.
    #[error("Booking {id} is no longer {expected}")]
    StatusConflict { id: Uuid, expected: BookingStatus },

    #[error("Booking storage failed: {0}")]
    Storage(String),
}

/// Persisted booking records. Each call is a single-record operation.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), LedgerError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, LedgerError>;

    /// Newest first.
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, LedgerError>;

    /// Write `booking.status` only if the stored status is still `expected`.
    async fn save_status(&self, booking: &Booking, expected: BookingStatus) -> Result<(), LedgerError>;
}
