//! Headless Shopify cart and customer session library.
//!
//! - [`cart`] keeps a local cart mirror in step with the Storefront API
//! - [`account`] handles customer sign-in, registration and order history
//! - [`shopify`] is the Storefront GraphQL client
//! - [`store`] persists cart and session references between runs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod cart;
pub mod config;
pub mod shopify;
pub mod store;
