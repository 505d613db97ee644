//! Core types for headless-cart.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod email;
pub mod gid;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use gid::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use status::*;
