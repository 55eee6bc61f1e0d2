//! Okinawa Rentals CLI - Database migrations, seed data and user management.
//!
//! # Usage
//!
//! ```bash
//! # Create the documents and sessions tables
//! rentals-cli migrate
//!
//! # Load agencies and listings from YAML
//! rentals-cli seed crates/cli/seed/okinawa.yaml
//!
//! # Promote a user
//! rentals-cli users set-role -e staff@chatanhomes.jp -r agency --agency chatan-homes
//! ```
//!
//! All commands read `RENTALS_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "rentals-cli")]
#[command(author, version, about = "Okinawa Rentals CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (documents and session tables)
    Migrate,
    /// Load agencies and listings from a YAML file
    Seed {
        /// Path to the seed file
        file: String,
    },
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Change a user's role
    SetRole {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// New role (`user`, `paid`, `agency`, `admin`)
        #[arg(short, long)]
        role: String,

        /// Agency id, for the `agency` role
        #[arg(long)]
        agency: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Users { action } => match action {
            UsersAction::SetRole {
                email,
                role,
                agency,
            } => commands::users::set_role(&email, &role, agency.as_deref()).await?,
        },
    }
    Ok(())
}
