//! Database migration command.
//!
//! Applies the migrations embedded in `corona-api`
//! (`crates/api/migrations/`), which create the `shop` schema and the
//! session table.

use tracing::info;

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    info!("Running migrations...");
    corona_api::MIGRATOR.run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
