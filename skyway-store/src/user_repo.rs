use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skyway_core::identity::{IdentityError, IdentityStore, NewUser, User};
use skyway_shared::Masked;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::is_unique_violation;

pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    phone_number: String,
    email: String,
    password_hash: String,
    country: Option<String>,
    is_active: bool,
    activation_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: Masked(row.phone_number),
            email: Masked(row.email),
            password_hash: row.password_hash,
            country: row.country,
            is_active: row.is_active,
            activation_token: row.activation_token,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, first_name, last_name, phone_number, email, password_hash, country, is_active, activation_token, created_at";

fn storage(e: sqlx::Error) -> IdentityError {
    IdentityError::Storage(e.to_string())
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, IdentityError> {
        let user = user.into_user(Uuid::new_v4());

        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, phone_number, email, password_hash, country, is_active, activation_token, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.phone_number.expose())
        .bind(user.email.expose())
        .bind(&user.password_hash)
        .bind(&user.country)
        .bind(user.is_active)
        .bind(&user.activation_token)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                IdentityError::DuplicateEmail
            } else {
                storage(e)
            }
        })?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, IdentityError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, IdentityError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        Ok(row.map(User::from))
    }

    async fn activate(&self, id: Uuid) -> Result<(), IdentityError> {
        let result = sqlx::query("UPDATE users SET is_active = TRUE, activation_token = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
