pub mod documents;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod orchestrator;
pub mod payments;

pub use error::{BookingError, BookingResult};
pub use ledger::{BookingLedger, LedgerError};
pub use lifecycle::TransitionError;
pub use models::{
    Booking, BookingFilter, BookingStatus, FlightSnapshot, Gender, Passenger, PaymentDetails,
    PaymentMethod, SeatPreference,
};
pub use orchestrator::{
    BookingOrchestrator, BookingOutcome, CancellationOutcome, CreateBookingRequest, PassengerInput,
};
pub use payments::{PaymentIntentRequest, PaymentOrchestrator};
