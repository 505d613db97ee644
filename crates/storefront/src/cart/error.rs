//! Cart errors and failure classification.

use headless_cart_core::IdentifierError;
use thiserror::Error;

use crate::shopify::ShopifyError;
use crate::store::StoreError;

/// Errors surfaced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Shopify could not be reached or answered with a transport failure.
    #[error("Network error: {0}")]
    Network(#[source] ShopifyError),

    /// Shopify rejected the request (user errors, GraphQL errors).
    #[error("{0}")]
    RemoteUserError(String),

    /// The cached cart reference no longer resolves.
    #[error("Cart is no longer available: {0}")]
    StaleReference(String),

    /// The identifier cannot name a purchasable variant.
    #[error("Invalid product ID format: {0}")]
    UnresolvableIdentifier(#[from] IdentifierError),

    /// Every candidate line was rejected before reaching Shopify.
    #[error("No valid merchandise IDs to create cart")]
    NoValidLineItems,

    /// Quantity below one.
    #[error("Quantity must be at least 1 (got {0})")]
    InvalidQuantity(i64),

    /// A product ID could not be resolved to one of its variants.
    #[error("Could not retrieve product options: {0}")]
    VariantLookup(String),

    /// Shopify answered with data this crate cannot interpret.
    #[error("Malformed cart response: {0}")]
    MalformedResponse(String),

    /// The local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CartError {
    /// Whether the failure happened before any remote call was issued.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvableIdentifier(_) | Self::NoValidLineItems | Self::InvalidQuantity(_)
        )
    }
}

/// How a failed remote call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transport failure.
    Network,
    /// Business-rule rejection.
    RemoteUserError,
    /// The cart reference is no longer valid.
    StaleReference,
    /// The response could not be interpreted.
    Malformed,
}

/// Decides which [`ErrorClass`] a Shopify failure belongs to.
pub trait ErrorClassifier: Send + Sync {
    /// Classify a failed remote call.
    fn classify(&self, error: &ShopifyError) -> ErrorClass;
}

/// Default classifier.
///
/// Shopify reports a missing or expired cart in several ways: a mutation
/// payload without a cart, a user error, or a GraphQL error on the ID. The
/// message markers cover the latter two.
#[derive(Debug, Clone)]
pub struct MessageClassifier {
    markers: Vec<String>,
}

impl MessageClassifier {
    /// Substrings (lowercase) that mark a stale cart reference.
    pub const DEFAULT_MARKERS: &'static [&'static str] = &[
        "cart not found",
        "invalid id",
        "invalid global id",
        "cart does not exist",
    ];

    /// Classifier with custom stale-reference markers.
    pub fn with_markers<I, T>(markers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.into().to_lowercase())
                .collect(),
        }
    }

    fn is_stale_message(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.markers.iter().any(|m| message.contains(m.as_str()))
    }
}

impl Default for MessageClassifier {
    fn default() -> Self {
        Self::with_markers(Self::DEFAULT_MARKERS.iter().copied())
    }
}

impl ErrorClassifier for MessageClassifier {
    fn classify(&self, error: &ShopifyError) -> ErrorClass {
        match error {
            ShopifyError::NotFound(_) => ErrorClass::StaleReference,
            e if e.is_transport() => ErrorClass::Network,
            ShopifyError::Parse(_) | ShopifyError::Malformed(_) => ErrorClass::Malformed,
            e if self.is_stale_message(&e.to_string()) => ErrorClass::StaleReference,
            _ => ErrorClass::RemoteUserError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::{CartUserError, GraphQLError};

    fn user_error(message: &str) -> ShopifyError {
        ShopifyError::UserError(vec![CartUserError {
            code: None,
            field: Some(vec!["cartId".to_string()]),
            message: message.to_string(),
        }])
    }

    #[test]
    fn test_not_found_is_stale() {
        let classifier = MessageClassifier::default();
        assert_eq!(
            classifier.classify(&ShopifyError::NotFound("Cart not found: x".to_string())),
            ErrorClass::StaleReference
        );
    }

    #[test]
    fn test_stale_markers_are_case_insensitive() {
        let classifier = MessageClassifier::default();
        assert_eq!(
            classifier.classify(&user_error("The specified Cart Does Not Exist.")),
            ErrorClass::StaleReference
        );
        assert_eq!(
            classifier.classify(&ShopifyError::GraphQL(vec![GraphQLError::message(
                "Invalid global id `gid://shopify/Cart/zzz`"
            )])),
            ErrorClass::StaleReference
        );
    }

    #[test]
    fn test_other_user_errors_are_remote() {
        let classifier = MessageClassifier::default();
        assert_eq!(
            classifier.classify(&user_error("Merchandise is out of stock")),
            ErrorClass::RemoteUserError
        );
    }

    #[test]
    fn test_transport_and_malformed() {
        let classifier = MessageClassifier::default();
        assert_eq!(
            classifier.classify(&ShopifyError::RateLimited(1)),
            ErrorClass::Network
        );
        assert_eq!(
            classifier.classify(&ShopifyError::Status {
                status: 404,
                body: "cart not found".to_string()
            }),
            ErrorClass::Network
        );
        assert_eq!(
            classifier.classify(&ShopifyError::Malformed("Failed to create cart".to_string())),
            ErrorClass::Malformed
        );
    }

    #[test]
    fn test_custom_markers() {
        let classifier = MessageClassifier::with_markers(["EXPIRED"]);
        assert_eq!(
            classifier.classify(&user_error("cart expired")),
            ErrorClass::StaleReference
        );
        assert_eq!(
            classifier.classify(&user_error("cart not found")),
            ErrorClass::RemoteUserError
        );
    }

    #[test]
    fn test_input_errors() {
        assert!(CartError::InvalidQuantity(0).is_input_error());
        assert!(CartError::NoValidLineItems.is_input_error());
        assert!(!CartError::StaleReference(String::new()).is_input_error());
    }
}
