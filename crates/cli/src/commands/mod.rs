//! Subcommand implementations.
//!
//! Every command runs against an [`App`]: one Storefront client shared by
//! the cart synchronizer and the customer session, both backed by the same
//! state file.

pub mod account;
pub mod cart;

use std::sync::Arc;

use headless_cart::account::{AccountError, AccountSession};
use headless_cart::cart::{CartError, CartSynchronizer};
use headless_cart::config::{ConfigError, StorefrontConfig};
use headless_cart::shopify::StorefrontClient;
use headless_cart::store::FileStore;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// An account operation failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// No password given on the command line or in the environment.
    #[error("Password required: pass --password or set HEADLESS_CART_PASSWORD")]
    MissingPassword,

    /// The cart has no checkout URL yet.
    #[error("Cart is empty")]
    EmptyCart,
}

/// Cart and session, restored from the state file.
pub struct App {
    pub cart: CartSynchronizer<StorefrontClient, FileStore>,
    pub account: AccountSession<StorefrontClient, FileStore>,
}

impl App {
    /// Build the client and restore the persisted session and cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the state file
    /// cannot be read.
    pub async fn connect(config: &StorefrontConfig) -> Result<Self, CommandError> {
        let client = Arc::new(StorefrontClient::new(&config.shopify)?);
        let store = Arc::new(FileStore::new(config.state_path.clone()));

        let account = AccountSession::new(Arc::clone(&client), Arc::clone(&store));
        let cart = CartSynchronizer::new(client, store);

        if account.restore().await?.is_some()
            && let Some(token) = account.access_token()
        {
            cart.resume_identity(token);
        }
        cart.restore().await?;

        Ok(Self { cart, account })
    }
}
