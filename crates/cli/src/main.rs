//! Menuboard CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! menuboard migrate
//!
//! # Load categories and items from YAML
//! menuboard seed crates/storefront/seed/menu.yaml
//!
//! # Promote an account
//! menuboard accounts set-role ana@example.com admin
//!
//! # Move an order along its lifecycle
//! menuboard orders set-status 6f1c... completed
//!
//! # Find and remove order headers whose lines were never saved
//! menuboard orders orphans
//! menuboard orders purge-orphans --older-than 30
//! ```
//!
//! # Environment Variables
//!
//! - `MENUBOARD_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use menuboard_core::{OrderId, OrderStatus, Role};

mod commands;

#[derive(Parser)]
#[command(name = "menuboard")]
#[command(author, version, about = "Menuboard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load categories and items from a YAML file (idempotent)
    Seed {
        /// Path to the menu file
        file: PathBuf,
    },
    /// Manage accounts
    Accounts {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Change an account's role
    SetRole {
        /// Account email address
        email: String,

        /// New role (`customer`, `staff`, `admin`)
        role: Role,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Move an order to a new status
    SetStatus {
        /// Order id
        id: OrderId,

        /// New status (`pending`, `completed`, `cancelled`)
        status: OrderStatus,
    },
    /// List order headers with no lines
    Orphans {
        /// Only headers older than this many minutes
        #[arg(long, default_value_t = commands::orders::DEFAULT_GRACE_MINUTES)]
        older_than: u32,
    },
    /// Delete order headers with no lines
    PurgeOrphans {
        /// Only headers older than this many minutes
        #[arg(long, default_value_t = commands::orders::DEFAULT_GRACE_MINUTES)]
        older_than: u32,
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
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Accounts { action } => match action {
            AccountAction::SetRole { email, role } => {
                commands::accounts::set_role(&email, role).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrderAction::SetStatus { id, status } => {
                commands::orders::set_status(id, status).await?;
            }
            OrderAction::Orphans { older_than } => commands::orders::orphans(older_than).await?,
            OrderAction::PurgeOrphans { older_than } => {
                commands::orders::purge_orphans(older_than).await?;
            }
        },
    }
    Ok(())
}
