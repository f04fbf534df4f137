//! Aladabuy CLI - Database migrations and store maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! aladabuy migrate
//!
//! # Load products, collections and promotions from YAML
//! aladabuy seed catalog.yaml
//!
//! # Give a user a customer profile so they can check out
//! aladabuy customer create --user-id 7 --phone 555-0100 --membership gold
//!
//! # Mark an order as paid
//! aladabuy order set-status 12 complete
//! ```
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "aladabuy")]
#[command(author, version, about = "Aladabuy store tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Manage customer profiles
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Manage orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Create a customer profile for an existing user
    Create {
        /// Identity-provider user id
        #[arg(short, long)]
        user_id: i32,

        /// Phone number
        #[arg(short, long)]
        phone: String,

        /// Birth date (YYYY-MM-DD)
        #[arg(short, long)]
        birth_date: Option<NaiveDate>,

        /// Membership tier (`bronze`, `silver`, `gold` or `B`, `S`, `G`)
        #[arg(short, long, default_value = "bronze")]
        membership: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Set the payment status of an order
    SetStatus {
        /// Order id
        order_id: i32,

        /// Payment status (`pending`, `complete`, `failed` or `P`, `C`, `F`)
        status: String,
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

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            commands::seed::catalog(&file).await?;
        }
        Commands::Customer { action } => match action {
            CustomerAction::Create {
                user_id,
                phone,
                birth_date,
                membership,
            } => {
                commands::customer::create(user_id, &phone, birth_date, &membership).await?;
            }
        },
        Commands::Order { action } => match action {
            OrderAction::SetStatus { order_id, status } => {
                commands::order::set_status(order_id, &status).await?;
            }
        },
    }
    Ok(())
}
