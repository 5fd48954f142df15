//! Corona Shop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! corona-cli migrate
//!
//! # Create an admin account (password read from CORONA_ADMIN_PASSWORD)
//! corona-cli user create-admin -e admin@example.com -n "Admin"
//!
//! # Load categories and products from a YAML file
//! corona-cli seed crates/cli/seed/catalog.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `CORONA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "corona-cli")]
#[command(author, version, about = "Corona Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the catalog YAML file
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an admin account
    CreateAdmin {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::CreateAdmin { email, name } => {
                commands::user::create_admin(&email, &name).await?;
            }
        },
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
    }
    Ok(())
}
