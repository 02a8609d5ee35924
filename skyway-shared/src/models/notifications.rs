use serde::{Deserialize, Serialize};

use crate::pii::Masked;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum MessageBody {
    Text(String),
    Html(String),
}

impl MessageBody {
    pub fn as_str(&self) -> &str {
        match self {
            MessageBody::Text(s) | MessageBody::Html(s) => s,
        }
    }
}

/// An outbound message addressed to a single customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub to: Masked<String>,
    pub subject: String,
    pub body: MessageBody,
}

impl Notification {
    pub fn text(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: Masked(to.into()),
            subject: subject.into(),
            body: MessageBody::Text(body.into()),
        }
    }

    pub fn html(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: Masked(to.into()),
            subject: subject.into(),
            body: MessageBody::Html(body.into()),
        }
    }

    /// Account activation mail carrying the single-use link.
    pub fn account_activation(to: impl Into<String>, activation_link: &str) -> Self {
        Self::html(
            to,
            "Account Activation",
            format!(
                "<p>Click <a href=\"{}\">here</a> to activate your account.</p>",
                activation_link
            ),
        )
    }
}
