//! `harvest` command-line front end.
//!
//! Every invocation loads the inventory from the configured backend, runs one
//! command through the store and prints the result.

mod render;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use harvest_ai::{InsightClient, InsightConfig, InsightError};
use harvest_core::ItemId;
use harvest_infra::{InfraConfig, InventoryStore, connect_backend};
use harvest_inventory::{Category, CategoryFilter, ItemDraft, ItemPatch, Unit, coerce_amount};

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Perishable-goods inventory with stock insights")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics, all items and restock candidates
    Report,

    /// List items matching a name search and category
    List {
        /// Case-insensitive substring of the name
        #[arg(long, default_value = "")]
        search: String,

        /// `all` or a category (hoja, raiz, fruto, bulbo, otro)
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
    },

    /// Create an item
    Add {
        name: String,
        #[arg(long, default_value = "0")]
        quantity: String,
        #[arg(long, default_value = "kg")]
        unit: Unit,
        #[arg(long, default_value = "0")]
        min_stock: String,
        #[arg(long, default_value = "otro")]
        category: Category,
        #[arg(long, default_value = "0")]
        price: String,
    },

    /// Change some fields of an item
    Update {
        id: ItemId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        unit: Option<Unit>,
        #[arg(long)]
        min_stock: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        price: Option<String>,
    },

    /// Add `delta` to an item's quantity (clamped at zero)
    Adjust {
        id: ItemId,
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },

    /// Delete an item
    Delete { id: ItemId },

    /// Ask the insight service for advice on the current inventory
    Insight,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    harvest_observability::init();

    let cli = Cli::parse();

    let config = InfraConfig::from_env().context("invalid inventory configuration")?;
    let backend = connect_backend(&config)
        .await
        .context("failed to connect to the inventory backend")?;
    let store = InventoryStore::new(backend);
    let items = store.load().await.context("failed to load inventory")?;
    tracing::info!(items = items.len(), "inventory loaded");

    match cli.command {
        Commands::Report => {
            print!("{}", render::report(&store.snapshot()));
        }
        Commands::List { search, category } => {
            print!("{}", render::items(&store.filter(&search, category)));
        }
        Commands::Add {
            name,
            quantity,
            unit,
            min_stock,
            category,
            price,
        } => {
            let draft = ItemDraft {
                name,
                quantity,
                unit,
                min_stock,
                category,
                price,
            };
            let created = store.create(draft).await?;
            println!("{}", render::item_line(&created));
        }
        Commands::Update {
            id,
            name,
            quantity,
            unit,
            min_stock,
            category,
            price,
        } => {
            let patch = ItemPatch {
                name,
                quantity: quantity.as_deref().map(coerce_amount),
                unit,
                min_stock: min_stock.as_deref().map(coerce_amount),
                category,
                price: price.as_deref().map(coerce_amount),
            };
            if patch.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            let updated = store.update(id, patch).await?;
            println!("{}", render::item_line(&updated));
        }
        Commands::Adjust { id, delta } => {
            let adjusted = store.adjust_quantity(id, delta).await?;
            println!("{}", render::item_line(&adjusted));
        }
        Commands::Delete { id } => {
            store.delete(id).await?;
            println!("deleted {id}");
        }
        Commands::Insight => {
            let Some(insight_config) =
                InsightConfig::from_env().context("invalid insight configuration")?
            else {
                bail!("insight disabled; set HARVEST_INSIGHT_API_KEY");
            };
            let client = InsightClient::from_config(&insight_config)?;
            let text = client
                .request_insight(&store.snapshot())
                .await
                .map_err(insight_failure)?;
            println!("{text}");
        }
    }

    Ok(())
}

/// Word an insight failure by whether retrying later can help.
fn insight_failure(err: InsightError) -> anyhow::Error {
    if err.is_transient() {
        anyhow::anyhow!("{err}; try again later")
    } else {
        anyhow::Error::new(err).context("insight request failed")
    }
}
