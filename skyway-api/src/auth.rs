use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::accounts::{LoginRequest, RegisterRequest};
use crate::extract::AppJson;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    message: &'static str,
    activation_email_sent: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    user_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/activate/{token}", get(activate))
}

async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registration = state.accounts.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered. Please check your email to activate your account.",
            activation_email_sent: registration.activation_email_sent,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = state.accounts.login(req).await?;

    Ok(Json(LoginResponse {
        token: session.token,
        user_id: session.user_id,
    }))
}

async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<&'static str, AppError> {
    state.accounts.activate(&token).await?;
    Ok("Account activated! You can now log in.")
}
