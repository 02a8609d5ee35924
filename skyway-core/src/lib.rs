pub mod identity;
pub mod inventory;
pub mod notify;
pub mod payment;

pub use identity::{IdentityError, IdentityStore, NewUser, User};
pub use inventory::{FlightOffer, InventoryClient, InventoryError, OfferQuery};
pub use notify::{Notifier, NotifyError};
pub use payment::{
    to_minor_units, NewPaymentIntent, PaymentError, PaymentGateway, PaymentIntent,
    PaymentReference, PaymentStatus, Refund,
};
