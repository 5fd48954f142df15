//! Authentication service.
//!
//! Registration, sign-in and profile changes on top of salted HMAC
//! credentials (see [`password`]).

mod error;
pub mod password;

pub use error::AuthError;
pub use password::{Credential, encrypt_password};

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::instrument;

use corona_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::{ProfileUpdate, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum display name length, in characters.
const MAX_NAME_LENGTH: usize = 32;

/// Requested profile changes. `None` leaves a field unchanged.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub about: Option<String>,
    pub password: Option<SecretString>,
}

/// Authentication service.
///
/// Handles user registration, sign-in and profile updates.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for invalid input.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<User, AuthError> {
        self.register(name, email, password, Role::Customer).await
    }

    /// Register an account with an explicit role.
    ///
    /// # Errors
    ///
    /// Same as [`Self::signup`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<User, AuthError> {
        let name = validate_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password.expose_secret())?;

        let credential = Credential::new(password);

        let user = self
            .users
            .create(name, &email, &credential, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password is wrong.
    #[instrument(skip(self, password))]
    pub async fn signin(&self, email: &str, password: &SecretString) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, credential) = self
            .users
            .get_credentials_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !credential.authenticate(password.expose_secret()) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update a user's profile. A new password is stored under a new salt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName` or `AuthError::WeakPassword` for
    /// invalid input.
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        changes: ProfileChanges,
    ) -> Result<User, AuthError> {
        let name = changes.name.as_deref().map(validate_name).transpose()?;

        let credential = match &changes.password {
            Some(password) => {
                validate_password(password.expose_secret())?;
                Some(Credential::new(password))
            }
            None => None,
        };

        let update = ProfileUpdate {
            name,
            about: changes.about.as_deref().map(str::trim),
            credential: credential.as_ref(),
        };

        self.users
            .update_profile(user_id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}

/// Validate a display name, returning it trimmed.
fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidName("Name is required".to_owned()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must contain at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "Password must contain a number".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Ada  ").unwrap(), "Ada");
        assert!(matches!(validate_name("   "), Err(AuthError::InvalidName(_))));
        assert!(validate_name(&"x".repeat(32)).is_ok());
        assert!(validate_name(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        let err = validate_password("a1b2").unwrap_err();
        assert_eq!(err.to_string(), "Password must contain at least 6 characters");
    }

    #[test]
    fn test_validate_password_needs_digit() {
        let err = validate_password("abcdefgh").unwrap_err();
        assert_eq!(err.to_string(), "Password must contain a number");
        assert!(validate_password("abcde1").is_ok());
    }
}
