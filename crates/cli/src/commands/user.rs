//! User account management commands.
//!
//! # Environment Variables
//!
//! - `CORONA_ADMIN_PASSWORD` - Password for the new admin account

use corona_core::Role;
use secrecy::SecretString;
use tracing::info;

use corona_api::services::auth::AuthService;

/// Create an admin account.
///
/// The password is read from `CORONA_ADMIN_PASSWORD` so it never appears in
/// shell history.
///
/// # Errors
///
/// Returns an error if the password is missing or weak, the email is invalid
/// or taken, or the database is unreachable.
pub async fn create_admin(email: &str, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let password = std::env::var("CORONA_ADMIN_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| "CORONA_ADMIN_PASSWORD not set")?;

    let user = AuthService::new(&pool)
        .register(name, email, &password, Role::Admin)
        .await?;

    info!(
        "Admin created successfully! ID: {}, Email: {}",
        user.id, user.email
    );
    Ok(())
}
