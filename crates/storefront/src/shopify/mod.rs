//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - GraphQL documents are written by hand and sent through `graphql_client`'s
//!   `GraphQLQuery` request/response envelope
//! - Shopify is source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for product variant lookups only; carts and
//!   customer data are never cached
//!
//! # APIs
//!
//! ## Cart
//! - `cartCreate`, `cart`, `cartLinesAdd`, `cartLinesUpdate`, `cartLinesRemove`
//!
//! ## Products
//! - Variant lookup for resolving a product ID to a purchasable variant
//!
//! ## Customer
//! - Password login (`customerAccessTokenCreate`), registration, profile and
//!   order history
//!
//! # Example
//!
//! ```rust,ignore
//! use headless_cart::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify)?;
//!
//! let variants = client.get_product_variants(&product_id).await?;
//! let cart = client.create_cart(vec![CartLineInput {
//!     merchandise_id: VariantId::parse(&variants.variants[0].id)?,
//!     quantity: 1,
//! }], None).await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success HTTP status.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// First part of the response body.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {}", join_user_errors(.0))]
    UserError(Vec<types::CartUserError>),
}

impl ShopifyError {
    /// Whether the failure happened below the GraphQL layer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::RateLimited(_)
        )
    }

    /// The first user-facing message carried by the error.
    ///
    /// For user errors and GraphQL errors this is the first message Shopify
    /// returned; otherwise the full display string.
    #[must_use]
    pub fn first_message(&self) -> String {
        match self {
            Self::UserError(errors) => errors
                .first()
                .map_or_else(|| self.to_string(), |e| e.message.clone()),
            Self::GraphQL(errors) => errors
                .iter()
                .find(|e| !e.message.is_empty())
                .map_or_else(|| self.to_string(), |e| e.message.clone()),
            _ => self.to_string(),
        }
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: e.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn join_user_errors(errors: &[types::CartUserError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) if !field.is_empty() => format!("{} ({})", e.message, field.join(".")),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("cart gid://shopify/Cart/1".to_string());
        assert_eq!(err.to_string(), "Not found: cart gid://shopify/Cart/1");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let err = ShopifyError::GraphQL(vec![
            GraphQLError::message("Field not found"),
            GraphQLError::message("Invalid ID"),
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("cartLinesAdd".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: cartLinesAdd.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_empty() {
        assert_eq!(
            ShopifyError::GraphQL(vec![]).to_string(),
            "GraphQL errors: (no error details provided)"
        );
        assert_eq!(
            ShopifyError::GraphQL(vec![GraphQLError::message("")]).to_string(),
            "GraphQL errors: [error 1]: (no details)"
        );
    }

    #[test]
    fn test_user_error_display_and_first_message() {
        let err = ShopifyError::UserError(vec![
            types::CartUserError {
                code: Some("INVALID".to_string()),
                field: Some(vec!["lines".to_string(), "0".to_string()]),
                message: "Merchandise does not exist".to_string(),
            },
            types::CartUserError {
                code: None,
                field: None,
                message: "Second".to_string(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "User error: Merchandise does not exist (lines.0); Second"
        );
        assert_eq!(err.first_message(), "Merchandise does not exist");
    }

    #[test]
    fn test_transport_classification() {
        assert!(ShopifyError::RateLimited(2).is_transport());
        assert!(
            ShopifyError::Status {
                status: 502,
                body: String::new()
            }
            .is_transport()
        );
        assert!(!ShopifyError::NotFound(String::new()).is_transport());
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
