//! Slotwise CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! slotwise-cli migrate
//!
//! # Register a tenant with an owner account
//! slotwise-cli tenant create -n "Glow Beauty Studio" -e owner@glow.example -p <password>
//!
//! # Seed a demo tenant with employees, services, and appointments
//! slotwise-cli seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "slotwise-cli")]
#[command(author, version, about = "Slotwise CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo data
    Seed,
    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        action: TenantAction,
    },
}

#[derive(Subcommand)]
enum TenantAction {
    /// Register a new tenant with an owner account
    Create {
        /// Business name
        #[arg(short, long)]
        name: String,

        /// Owner email address
        #[arg(short, long)]
        email: String,

        /// Owner password
        #[arg(short, long)]
        password: String,

        /// Tenant timezone
        #[arg(short, long, default_value = "UTC")]
        timezone: String,
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
        Commands::Seed => commands::seed::run().await?,
        Commands::Tenant { action } => match action {
            TenantAction::Create {
                name,
                email,
                password,
                timezone,
            } => commands::tenant::create(&name, &email, &password, &timezone).await?,
        },
    }

    Ok(())
}
