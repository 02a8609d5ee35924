//! Customer accounts: registration, single-use activation and login.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use skyway_core::{IdentityError, IdentityStore, NewUser, Notifier, User};
use skyway_shared::Notification;
use uuid::Uuid;

use crate::middleware::auth::CustomerClaims;
use crate::state::AuthConfig;

const ACTIVATION_PURPOSE: &str = "activation";
pub const CUSTOMER_ROLE: &str = "CUSTOMER";
const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account not activated")]
    NotActivated,
    #[error("Invalid or expired activation token")]
    InvalidToken,
    #[error("Account storage failed: {0}")]
    Storage(String),
    #[error("Credential processing failed: {0}")]
    Credentials(String),
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::DuplicateEmail => AuthError::DuplicateEmail,
            IdentityError::NotFound(_) => AuthError::InvalidToken,
            IdentityError::Storage(msg) => AuthError::Storage(msg),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActivationClaims {
    email: String,
    purpose: String,
    exp: usize,
}

#[derive(Debug)]
pub struct Registration {
    pub user: User,
    pub activation_email_sent: bool,
}

#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AccountService {
    identity: Arc<dyn IdentityStore>,
    notifier: Arc<dyn Notifier>,
    auth: AuthConfig,
    notify_timeout: Duration,
}

impl AccountService {
    pub fn new(identity: Arc<dyn IdentityStore>, notifier: Arc<dyn Notifier>, auth: AuthConfig) -> Self {
        Self {
            identity,
            notifier,
            auth,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<Registration, AuthError> {
        let (Some(first_name), Some(last_name), Some(phone_number), Some(email), Some(password)) = (
            required(req.first_name),
            required(req.last_name),
            required(req.phone_number),
            required(req.email),
            req.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthError::Validation("Missing required fields".to_string()));
        };
        let email = normalize_email(&email);

        if self.identity.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(password).await?;
        let activation_token = self.activation_token(&email)?;

        let user = self
            .identity
            .insert_user(NewUser {
                first_name,
                last_name,
                phone_number,
                email: email.clone(),
                password_hash,
                country: required(req.country),
                activation_token: activation_token.clone(),
            })
            .await?;
        tracing::info!(user_id = %user.id, "User registered");

        let link = format!("{}/activate/{}", self.auth.frontend_base_url, activation_token);
        let notification = Notification::account_activation(email, &link);
        let activation_email_sent =
            match tokio::time::timeout(self.notify_timeout, self.notifier.send(&notification)).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::warn!(user_id = %user.id, error = %e, "Activation mail failed");
                    false
                }
                Err(_) => {
                    tracing::warn!(user_id = %user.id, "Activation mail timed out");
                    false
                }
            };

        Ok(Registration { user, activation_email_sent })
    }

    pub async fn activate(&self, token: &str) -> Result<(), AuthError> {
        let claims = decode::<ActivationClaims>(
            token,
            &DecodingKey::from_secret(self.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "Activation token rejected");
            AuthError::InvalidToken
        })?
        .claims;

        if claims.purpose != ACTIVATION_PURPOSE {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .identity
            .find_by_email(&claims.email)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        // Single use: only the token still pending on the account is accepted.
        if user.activation_token.as_deref() != Some(token) {
            return Err(AuthError::InvalidToken);
        }

        self.identity.activate(user.id).await?;
        tracing::info!(user_id = %user.id, "Account activated");
        Ok(())
    }

    pub async fn login(&self, req: LoginRequest) -> Result<Session, AuthError> {
        let (Some(email), Some(password)) = (required(req.email), req.password) else {
            return Err(AuthError::InvalidCredentials);
        };

        let user = self
            .identity
            .find_by_email(&normalize_email(&email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, user.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::NotActivated);
        }

        let claims = CustomerClaims {
            sub: user.id.to_string(),
            email: user.email.expose().clone(),
            role: CUSTOMER_ROLE.to_string(),
            exp: expiry(self.auth.expiration),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(self.auth.secret.as_bytes()))
            .map_err(|e| AuthError::Credentials(format!("Token encoding failed: {}", e)))?;

        Ok(Session { token, user_id: user.id })
    }

    fn activation_token(&self, email: &str) -> Result<String, AuthError> {
        let claims = ActivationClaims {
            email: email.to_string(),
            purpose: ACTIVATION_PURPOSE.to_string(),
            exp: expiry(self.auth.activation_expiration),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.auth.secret.as_bytes()))
            .map_err(|e| AuthError::Credentials(format!("Token encoding failed: {}", e)))
    }
}

fn expiry(seconds: u64) -> usize {
    (Utc::now() + chrono::Duration::seconds(seconds as i64)).timestamp() as usize
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Credentials(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Credentials(e.to_string()))?
}

async fn verify_password(password: String, stored: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(&stored).map_err(|e| AuthError::Credentials(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::Credentials(e.to_string()))?
}
