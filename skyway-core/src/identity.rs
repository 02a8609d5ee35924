use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyway_shared::pii::Masked;
use uuid::Uuid;

/// A registered customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Masked<String>,
    pub email: Masked<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub country: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub activation_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Everything needed to store a freshly registered (inactive) account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub password_hash: String,
    pub country: Option<String>,
    pub activation_token: String,
}

impl NewUser {
    pub fn into_user(self, id: Uuid) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: Masked(self.phone_number),
            email: Masked(self.email),
            password_hash: self.password_hash,
            country: self.country,
            is_active: false,
            activation_token: Some(self.activation_token),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("Identity storage failed: {0}")]
    Storage(String),
}

/// Persisted user records. Emails are unique.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User, IdentityError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError>;

    /// Flip the activation flag and drop the pending token.
    async fn activate(&self, id: Uuid) -> Result<(), IdentityError>;
}
