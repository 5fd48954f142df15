//! Sign-up, sign-in and sign-out handlers.
//!
//! Signing in stores a [`CurrentUser`] in the session; the session cookie is
//! the only credential the API accepts afterwards.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::MessageResponse;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Body of `POST /api/signup`.
///
/// Not `Debug`: it carries the raw password.
#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /api/signin`.
#[derive(Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response of `POST /api/signin`.
#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub user: CurrentUser,
}

/// Create a customer account.
#[instrument(skip(state, body))]
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let Json(request) = body?;
    let password = SecretString::from(request.password);

    let user = AuthService::new(state.pool())
        .signup(&request.name, &request.email, &password)
        .await?;

    Ok(Json(user))
}

/// Sign in and start a session.
#[instrument(skip(state, session, body))]
pub async fn signin(
    State(state): State<AppState>,
    session: Session,
    body: std::result::Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Json<SigninResponse>> {
    let Json(request) = body?;
    let password = SecretString::from(request.password);

    let user = AuthService::new(state.pool())
        .signin(&request.email, &password)
        .await?;

    let current = CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&current.id, Some(current.email.as_str()));
    tracing::info!(user_id = %current.id, "User signed in");

    Ok(Json(SigninResponse { user: current }))
}

/// End the session.
#[instrument(skip(session))]
pub async fn signout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(MessageResponse::new("Signout success")))
}
