//! Outbound mail: an SMTP relay for production and a logging stand-in for
//! environments without mail configured.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use skyway_core::notify::{Notifier, NotifyError};
use skyway_shared::{MessageBody, Notification};

use crate::app_config::MailConfig;

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("from address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| NotifyError::Delivery(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();

        Ok(Self { transport, from })
    }
}

fn build_message(from: &Mailbox, notification: &Notification) -> Result<Message, NotifyError> {
    let to = notification
        .to
        .expose()
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::Address(e.to_string()))?;

    let (content_type, body) = match &notification.body {
        MessageBody::Text(text) => (ContentType::TEXT_PLAIN, text.clone()),
        MessageBody::Html(html) => (ContentType::TEXT_HTML, html.clone()),
    };

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(notification.subject.as_str())
        .header(content_type)
        .body(body)
        .map_err(|e| NotifyError::Build(e.to_string()))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = build_message(&self.from, notification)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        tracing::info!(to = %notification.to, subject = %notification.subject, "Mail sent");
        Ok(())
    }
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            body = %notification.body.as_str(),
            "Mail not configured, notification logged only"
        );
        Ok(())
    }
}
