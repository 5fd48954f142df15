//! User profile and purchase history handlers.
//!
//! A user may read and change their own record; admins may act on anyone's.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use corona_core::UserId;

use super::path_id;
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Order, User, session_keys};
use crate::services::auth::{AuthService, ProfileChanges};
use crate::state::AppState;

const USER_NOT_FOUND: &str = "User not found";

/// Body of `PUT /api/user/{user_id}`. Omitted fields keep their values.
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub about: Option<String>,
    pub password: Option<String>,
}

/// Get a user's profile, including purchase history.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    path: std::result::Result<Path<UserId>, PathRejection>,
) -> Result<Json<User>> {
    let target = authorize(&user, path)?;
    Ok(Json(AuthService::new(state.pool()).get_user(target).await?))
}

/// Update a user's name, about text or password.
#[instrument(skip(state, user, session, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    path: std::result::Result<Path<UserId>, PathRejection>,
    body: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let target = authorize(&user, path)?;
    let Json(request) = body?;

    let changes = ProfileChanges {
        name: request.name,
        about: request.about,
        password: request.password.map(SecretString::from),
    };
    let updated = AuthService::new(state.pool())
        .update_profile(target, changes)
        .await?;

    if updated.id == user.id {
        let current = CurrentUser {
            name: updated.name.clone(),
            ..user
        };
        session
            .insert(session_keys::CURRENT_USER, &current)
            .await
            .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    }
    tracing::info!(target_id = %updated.id, "Profile updated");

    Ok(Json(updated))
}

/// A user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn purchase_history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    path: std::result::Result<Path<UserId>, PathRejection>,
) -> Result<Json<Vec<Order>>> {
    let target = authorize(&user, path)?;
    Ok(Json(
        OrderRepository::new(state.pool())
            .list_for_user(target)
            .await?,
    ))
}

/// Resolve the target user and check the caller may act on them.
fn authorize(
    user: &CurrentUser,
    path: std::result::Result<Path<UserId>, PathRejection>,
) -> Result<UserId> {
    let target = path_id(path, USER_NOT_FOUND)?;
    if !user.can_access(target) {
        tracing::warn!(user_id = %user.id, target_id = %target, "Profile access denied");
        return Err(AppError::Forbidden("Access denied".to_owned()));
    }
    Ok(target)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corona_core::{Email, Role};

    use super::*;

    fn current(id: i32, role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_authorize_self() {
        let user = current(1, Role::Customer);
        assert_eq!(authorize(&user, Ok(Path(UserId::new(1)))).unwrap(), UserId::new(1));
    }

    #[test]
    fn test_authorize_other_customer_is_forbidden() {
        let user = current(1, Role::Customer);
        assert!(matches!(
            authorize(&user, Ok(Path(UserId::new(2)))),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_authorize_admin_reaches_anyone() {
        let admin = current(1, Role::Admin);
        assert!(authorize(&admin, Ok(Path(UserId::new(2)))).is_ok());
    }
}
