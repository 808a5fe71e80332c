//! RocketShoes CLI - Drive the persistent cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rocketshoes show
//!
//! # Add one unit of product 1
//! rocketshoes add 1
//!
//! # Set product 1 to three units
//! rocketshoes set 1 3
//!
//! # Remove product 1
//! rocketshoes remove 1
//! ```
//!
//! # Commands
//!
//! - `show` - Print the cart (`--json` for the stored representation)
//! - `add` - Add one unit of a product
//! - `remove` - Remove a product entirely
//! - `set` - Set a product's quantity
//!
//! Configuration is read from the environment, see `rocketshoes_cart::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Terminal output is this binary's job
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "rocketshoes")]
#[command(author, version, about = "RocketShoes cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    Show {
        /// Print the stored JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the quantity of a product already in the cart
    Set {
        /// Product ID
        id: ProductId,

        /// New quantity (values below 1 are ignored)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketshoes_cart=info,rocketshoes=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Show { json } => commands::show(json).await?,
        Commands::Add { id } => {
            let session = commands::Session::open().await?;
            commands::add(&session, id).await?;
        }
        Commands::Remove { id } => {
            let session = commands::Session::open().await?;
            commands::remove(&session, id).await?;
        }
        Commands::Set { id, amount } => {
            let session = commands::Session::open().await?;
            commands::set(&session, id, amount).await?;
        }
    }
    Ok(())
}
