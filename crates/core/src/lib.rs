//! Headless Cart Core - Shared types library.
//!
//! This crate provides the types used by every headless-cart component:
//! - `headless-cart` - Storefront API client and cart synchronizer
//! - `headless-cart-cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be used
//! anywhere, including in tests that never touch the network.
//!
//! # Modules
//!
//! - [`types`] - Global IDs and the identifier normalizer, prices, emails and
//!   order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
