//! Cart commands.
//!
//! # Environment Variables
//!
//! - `CART_API_URL` - Stock and product API base URL (required by `add`,
//!   `remove` and `set`; `show` only reads the store)
//! - `CART_STORE_DIR` - Directory holding the persisted cart
//! - `CART_STORAGE_KEY` - Key the cart is stored under

use std::sync::Arc;

use rocketshoes_cart::store::load_cart;
use rocketshoes_cart::{
    CartConfig, CartManager, ConfigError, FileStore, HttpStockClient, Outcome, RecordingNotifier,
    StockError, StoreConfig, StoreError,
};
use rocketshoes_core::{Cart, ProductId};
use thiserror::Error;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The stock API client could not be built.
    #[error("Stock client error: {0}")]
    Stock(#[from] StockError),

    /// The stored cart could not be loaded.
    #[error("Cart storage error: {0}")]
    Store(#[from] StoreError),

    /// The stored cart could not be rendered as JSON.
    #[error("Cart encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The cart change was not applied.
    #[error("{0}")]
    NotApplied(String),
}

type Manager = CartManager<HttpStockClient, FileStore, Arc<RecordingNotifier>>;

/// A loaded cart plus the notices its commands produce.
pub struct Session {
    manager: Manager,
    notices: Arc<RecordingNotifier>,
}

impl Session {
    /// Load configuration and the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or the stored cart is
    /// unreadable.
    pub async fn open() -> Result<Self, CommandError> {
        let config = CartConfig::from_env()?;
        tracing::debug!(?config, "Loaded configuration");

        let stock = HttpStockClient::new(&config.api)?;
        let store = FileStore::new(&config.store.store_dir);
        let notices = Arc::new(RecordingNotifier::new());

        let manager = CartManager::load_with_key(
            stock,
            store,
            Arc::clone(&notices),
            config.store.storage_key,
        )
        .await?;

        Ok(Self { manager, notices })
    }

    /// Print the cart after a mutation, or the notices if it failed.
    fn finish(&self, outcome: Outcome) -> Result<(), CommandError> {
        match outcome {
            Outcome::Committed => {
                print!("{}", render(&self.manager.cart()));
                Ok(())
            }
            Outcome::Ignored => {
                println!("Nothing to change.");
                Ok(())
            }
            Outcome::Failed(err) => {
                for notice in self.notices.take() {
                    eprintln!("{notice}");
                }
                Err(CommandError::NotApplied(err.to_string()))
            }
        }
    }
}

/// Print the stored cart. Needs no stock API configuration.
///
/// # Errors
///
/// Returns an error if the stored cart is unreadable or cannot be encoded
/// as JSON.
pub async fn show(json: bool) -> Result<(), CommandError> {
    let config = StoreConfig::from_env()?;
    let cart = load_stored(&config).await?;
    print!("{}", format_cart(&cart, json)?);
    Ok(())
}

/// Read the cart persisted under `config`, or an empty cart.
async fn load_stored(config: &StoreConfig) -> Result<Cart, CommandError> {
    let store = FileStore::new(&config.store_dir);
    Ok(load_cart(&store, &config.storage_key).await?)
}

fn format_cart(cart: &Cart, json: bool) -> Result<String, CommandError> {
    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(cart)?))
    } else {
        Ok(render(cart))
    }
}

/// Add one unit of `id`.
///
/// # Errors
///
/// Returns `CommandError::NotApplied` if the cart was left unchanged.
pub async fn add(session: &Session, id: ProductId) -> Result<(), CommandError> {
    let outcome = session.manager.add_product(id).await;
    session.finish(outcome)
}

/// Remove `id` from the cart.
///
/// # Errors
///
/// Returns `CommandError::NotApplied` if the cart was left unchanged.
pub async fn remove(session: &Session, id: ProductId) -> Result<(), CommandError> {
    let outcome = session.manager.remove_product(id).await;
    session.finish(outcome)
}

/// Set the amount of `id`.
///
/// # Errors
///
/// Returns `CommandError::NotApplied` if the cart was left unchanged.
pub async fn set(session: &Session, id: ProductId, amount: i64) -> Result<(), CommandError> {
    let outcome = session.manager.update_product_amount(id, amount).await;
    session.finish(outcome)
}

/// Render the cart as a plain-text table.
fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty.\n".to_string();
    }

    let mut out = format!("{:>6}  {:>5}  {:>10}  {}\n", "ID", "QTY", "PRICE", "PRODUCT");
    for product in cart {
        out.push_str(&format!(
            "{:>6}  {:>5}  {:>10}  {}\n",
            product.id(),
            product.amount(),
            product.details.price,
            product.details.title
        ));
    }
    out.push_str(&format!(
        "{} product(s), {} item(s)\n",
        cart.len(),
        cart.total_quantity()
    ));
    out
}
