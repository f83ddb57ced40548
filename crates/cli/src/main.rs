//! Collection Gate CLI - migrations, rule management and discount tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cg-cli migrate
//!
//! # Show or replace the active rule
//! cg-cli rules show
//! cg-cli rules save --mode exclude -c 123 -c 456
//!
//! # Apply the rule to one discount, or to every discount
//! cg-cli apply --discount 987
//! cg-cli apply
//!
//! # Run the live mutation checks (development stores only)
//! cg-cli diagnose
//!
//! # Remove all data for a shop
//! cg-cli shop redact demo.myshopify.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `rules` - Show and save the shop's rule
//! - `apply` - Apply the rule to discounts
//! - `diagnose` - Exercise discount mutations against the live store
//! - `shop redact` - Delete a shop's rules and logs

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cg-cli")]
#[command(author, version, about = "Collection Gate CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Show or save the shop's rule
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
    /// Apply the active rule to discounts
    Apply {
        /// Only this discount (numeric id or GID). Every discount if omitted.
        #[arg(short, long)]
        discount: Option<String>,

        /// Pause between discounts in milliseconds during a bulk run (default: `APPLY_PAUSE_MS`)
        #[arg(long)]
        pause_ms: Option<u64>,
    },
    /// Run live mutation checks against the store
    Diagnose,
    /// Manage shop data
    Shop {
        #[command(subcommand)]
        action: ShopAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Print the active rule as JSON
    Show,
    /// Create or replace the rule
    Save {
        /// Rule mode (`exclude` or `include`)
        #[arg(short, long, default_value = "exclude")]
        mode: String,

        /// Selected collection (numeric id or GID); repeatable
        #[arg(short, long = "collection")]
        collections: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ShopAction {
    /// Delete every rule, selected collection and log entry for a shop
    Redact {
        /// Shop domain (e.g. demo.myshopify.com)
        shop: String,
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
        Commands::Rules { action } => match action {
            RulesAction::Show => commands::rules::show().await?,
            RulesAction::Save { mode, collections } => {
                commands::rules::save(&mode, &collections).await?;
            }
        },
        Commands::Apply { discount, pause_ms } => match discount {
            Some(id) => commands::apply::one(&id).await?,
            None => commands::apply::all(pause_ms).await?,
        },
        Commands::Diagnose => commands::apply::diagnose().await?,
        Commands::Shop { action } => match action {
            ShopAction::Redact { shop } => commands::shop::redact(&shop).await?,
        },
    }
    Ok(())
}
