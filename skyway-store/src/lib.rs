pub mod amadeus;
pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod mailer;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod stripe;
pub mod user_repo;

pub use amadeus::AmadeusClient;
pub use booking_repo::PgBookingLedger;
pub use database::DbClient;
pub use mailer::{LogNotifier, SmtpNotifier};
pub use stripe::StripeClient;
pub use user_repo::PgIdentityStore;
