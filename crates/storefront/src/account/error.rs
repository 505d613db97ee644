//! Account errors.

use headless_cart_core::EmailError;
use thiserror::Error;

use crate::shopify::ShopifyError;
use crate::store::StoreError;

/// Errors surfaced by account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The email address is not well formed.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Shopify rejected the credentials or registration.
    #[error("{0}")]
    Rejected(String),

    /// Shopify could not be reached.
    #[error("Network error: {0}")]
    Network(#[source] ShopifyError),

    /// Any other Shopify failure.
    #[error("Shopify error: {0}")]
    Remote(#[source] ShopifyError),

    /// The operation needs a signed-in customer.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The stored token is no longer accepted.
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// Order page size out of range.
    #[error("Page size must be between 1 and 250 (got {0})")]
    InvalidPageSize(i64),

    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ShopifyError> for AccountError {
    fn from(e: ShopifyError) -> Self {
        match e {
            ShopifyError::UserError(_) => Self::Rejected(e.first_message()),
            e if e.is_transport() => Self::Network(e),
            e => Self::Remote(e),
        }
    }
}
