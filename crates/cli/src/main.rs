//! Marketplace cart CLI - inspect and edit the locally persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! mp-cart list
//!
//! # Add one unit of a product
//! mp-cart add --id p1 --title "Shirt" --image-url https://cdn.example.com/p1.png --price 10
//!
//! # Change quantities
//! mp-cart increment p1
//! mp-cart decrement p1
//! ```
//!
//! # Environment Variables
//!
//! - `CART_STORAGE_DIR` - Directory holding the cart file (default: `.cart`)
//! - `CART_STORAGE_KEY` - Key the cart is stored under (default: `@Marketplace:products`)
//! - `RUST_LOG` - Log filter (default: `marketplace_cart=info,marketplace_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use marketplace_core::ProductId;
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "mp-cart")]
#[command(author, version, about = "Marketplace cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    List,
    /// Add one unit of a product
    Add {
        /// Catalog product ID
        #[arg(long)]
        id: ProductId,

        /// Display name
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long, default_value = "")]
        image_url: String,

        /// Unit price
        #[arg(long)]
        price: Decimal,
    },
    /// Add one unit of a product already in the cart
    Increment {
        /// Catalog product ID
        id: ProductId,
    },
    /// Remove one unit of a product, dropping it at zero
    Decrement {
        /// Catalog product ID
        id: ProductId,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace_cart=info,marketplace_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::cart::CommandError> {
    let action = match cli.command {
        Commands::List => commands::cart::Action::List,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::Action::Add(marketplace_core::NewLineItem::new(
            id, title, image_url, price,
        )),
        Commands::Increment { id } => commands::cart::Action::Increment(id),
        Commands::Decrement { id } => commands::cart::Action::Decrement(id),
    };
    commands::cart::execute(action).await
}
