use async_trait::async_trait;
use skyway_shared::Notification;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    Address(String),
    #[error("Message could not be built: {0}")]
    Build(String),
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

/// Outbound customer messaging (activation links, booking notices).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
