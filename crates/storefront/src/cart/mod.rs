//! Cart synchronization with the Shopify Storefront API.
//!
//! - [`CartSynchronizer`] owns the cart reference and snapshot
//! - [`CartBackend`] is the remote seam ([`crate::shopify::StorefrontClient`]
//!   in production)
//! - [`ErrorClassifier`] decides which failures mean a stale cart
//! - [`RetryPolicy`] bounds stale-cart recovery

mod backend;
mod error;
mod retry;
mod snapshot;
mod sync;

pub use backend::CartBackend;
pub use error::{CartError, ErrorClass, ErrorClassifier, MessageClassifier};
pub use retry::RetryPolicy;
pub use snapshot::{CartReference, CartSnapshot, LineItem};
pub use sync::{AddToCart, CandidateLine, CartSynchronizer};
