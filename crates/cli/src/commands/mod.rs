//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;

/// Load `.env` and connect to the shop database.
///
/// # Errors
///
/// Returns an error if no database URL is set or the connection fails.
pub async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("CORONA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "CORONA_DATABASE_URL not set")?;

    tracing::info!("Connecting to database...");
    Ok(corona_api::db::create_pool(&database_url).await?)
}
