//! Customer accounts.
//!
//! Password sign-in through `customerAccessTokenCreate`, registration,
//! profile and order history. The access token is persisted in the local
//! store under `shopify_customer_token` and handed to the cart synchronizer
//! so carts carry the customer's identity.

mod backend;
mod error;
mod session;

pub use backend::AccountBackend;
pub use error::AccountError;
pub use session::AccountSession;
