pub mod models;
pub mod pii;

pub use models::notifications::{MessageBody, Notification};
pub use pii::Masked;
