//! Shopify global IDs and the merchandise identifier normalizer.
//!
//! Shopify addresses every resource with a global ID of the form
//! `gid://shopify/<Resource>/<id>`. Product-level and variant-level IDs are
//! distinct resource classes: only a `ProductVariant` can be put in a cart.
//!
//! Use the `define_gid!` macro to create type-safe wrappers that can only hold
//! a well-formed ID of one resource class, so a product ID can never be passed
//! where a variant ID is expected.

use core::fmt;

/// Prefix shared by every Shopify global ID.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Errors that can occur when normalizing an identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The input is empty or whitespace.
    #[error("identifier cannot be empty")]
    Empty,
    /// The input is a product-level ID; it needs a variant lookup.
    #[error("product ID {0} cannot be used as merchandise; resolve a variant first")]
    ProductLevel(String),
    /// The input is a well-formed global ID of an unrelated resource class.
    #[error("expected a {expected} ID, got a {found} ID: {id}")]
    WrongResource {
        /// Resource class that was expected.
        expected: &'static str,
        /// Resource class that was found.
        found: String,
        /// The offending ID.
        id: String,
    },
    /// The input starts with the global ID prefix but is not well formed.
    #[error("malformed global ID: {0}")]
    Malformed(String),
    /// The input contains no digits to build an ID from.
    #[error("identifier contains no numeric part: {0}")]
    NoDigits(String),
}

/// Split a global ID into its resource class and tail.
///
/// Returns `None` unless the input has the prefix, a non-empty alphanumeric
/// resource name and a non-empty tail.
#[must_use]
pub fn split_gid(s: &str) -> Option<(&str, &str)> {
    let rest = s.strip_prefix(GID_PREFIX)?;
    let (resource, tail) = rest.split_once('/')?;
    if resource.is_empty()
        || tail.is_empty()
        || !resource.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some((resource, tail))
}

/// Extract the leading numeric part of a global ID's tail.
///
/// ```
/// # use headless_cart_core::decode_gid;
/// assert_eq!(decode_gid("gid://shopify/ProductVariant/42"), Some("42"));
/// assert_eq!(decode_gid("gid://shopify/Cart/abc"), None);
/// assert_eq!(decode_gid("42"), None);
/// ```
#[must_use]
pub fn decode_gid(s: &str) -> Option<&str> {
    let (_, tail) = split_gid(s)?;
    let end = tail
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(tail.len());
    tail.get(..end).filter(|digits| !digits.is_empty())
}

/// Macro to define a type-safe global ID wrapper for one resource class.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` that validate the resource class
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()`, `from_numeric()`, `as_str()`, `numeric_id()`
/// - `Display`, `AsRef<str>`, `TryFrom<String>` and `Into<String>`
///
/// # Example
///
/// ```rust
/// # use headless_cart_core::define_gid;
/// define_gid!(CollectionId, "Collection");
///
/// let id = CollectionId::from_numeric(7);
/// assert_eq!(id.as_str(), "gid://shopify/Collection/7");
/// assert!(CollectionId::parse("gid://shopify/Product/7").is_err());
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Resource class name inside the global ID.
            pub const RESOURCE: &'static str = $resource;

            /// Parse a well-formed global ID of this resource class.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not a global ID, or is a global
            /// ID of a different resource class.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdentifierError> {
                let s = s.trim();
                if s.is_empty() {
                    return Err($crate::IdentifierError::Empty);
                }
                match $crate::split_gid(s) {
                    Some((resource, _)) if resource == Self::RESOURCE => Ok(Self(s.to_owned())),
                    Some((resource, _)) => Err($crate::IdentifierError::WrongResource {
                        expected: Self::RESOURCE,
                        found: resource.to_owned(),
                        id: s.to_owned(),
                    }),
                    None => Err($crate::IdentifierError::Malformed(s.to_owned())),
                }
            }

            /// Build a global ID of this resource class from a numeric ID.
            #[must_use]
            pub fn from_numeric(id: u64) -> Self {
                Self(format!("{}{}/{id}", $crate::GID_PREFIX, Self::RESOURCE))
            }

            /// Get the global ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Get the numeric part of the global ID, if it has one.
            #[must_use]
            pub fn numeric_id(&self) -> Option<&str> {
                $crate::decode_gid(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::IdentifierError;

            fn try_from(s: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_gid!(VariantId, "ProductVariant");
define_gid!(ProductId, "Product");

/// Raw identifier input, as received from a caller.
///
/// Identifiers arrive either as text (a global ID, a bare numeric ID, or
/// something that merely contains digits) or as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierInput {
    /// Textual identifier.
    Text(String),
    /// Numeric identifier.
    Numeric(u64),
}

impl From<&str> for IdentifierInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for IdentifierInput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<u64> for IdentifierInput {
    fn from(n: u64) -> Self {
        Self::Numeric(n)
    }
}

impl From<&VariantId> for IdentifierInput {
    fn from(id: &VariantId) -> Self {
        Self::Text(id.as_str().to_owned())
    }
}

impl fmt::Display for IdentifierInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Numeric(n) => write!(f, "{n}"),
        }
    }
}

/// What a raw merchandise identifier refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerchandiseRef {
    /// A purchasable variant, usable as-is.
    Variant(VariantId),
    /// A product listing; must be resolved to one of its variants.
    Product(ProductId),
}

/// Classify a raw identifier as a variant or a product reference.
///
/// Product global IDs are kept as products so the caller can look up a
/// variant. Everything else goes through [`normalize_variant_id`].
///
/// # Errors
///
/// Returns the normalizer's error for inputs that are neither.
pub fn classify_merchandise(
    input: impl Into<IdentifierInput>,
) -> Result<MerchandiseRef, IdentifierError> {
    let input = input.into();
    if let IdentifierInput::Text(s) = &input
        && let Some((resource, _)) = split_gid(s.trim())
        && resource == ProductId::RESOURCE
    {
        return ProductId::parse(s).map(MerchandiseRef::Product);
    }
    normalize_variant_id(input).map(MerchandiseRef::Variant)
}

/// Normalize an identifier into a variant-level global ID.
///
/// - Variant global IDs are returned unchanged.
/// - Product global IDs are rejected with [`IdentifierError::ProductLevel`].
/// - Global IDs of any other resource class are rejected.
/// - Anything else has its non-digit characters stripped and the remaining
///   digits wrapped in a variant global ID.
///
/// ```
/// # use headless_cart_core::normalize_variant_id;
/// let id = normalize_variant_id("12345").unwrap();
/// assert_eq!(id.as_str(), "gid://shopify/ProductVariant/12345");
///
/// let id = normalize_variant_id(678_u64).unwrap();
/// assert_eq!(id.as_str(), "gid://shopify/ProductVariant/678");
///
/// assert!(normalize_variant_id("gid://shopify/Product/1").is_err());
/// ```
///
/// # Errors
///
/// Returns an [`IdentifierError`] describing why the input cannot name a
/// variant.
pub fn normalize_variant_id(
    input: impl Into<IdentifierInput>,
) -> Result<VariantId, IdentifierError> {
    let text = match input.into() {
        IdentifierInput::Numeric(n) => return Ok(VariantId::from_numeric(n)),
        IdentifierInput::Text(s) => s,
    };
    let text = text.trim();

    if text.is_empty() {
        return Err(IdentifierError::Empty);
    }

    if text.starts_with(GID_PREFIX) {
        return match split_gid(text) {
            Some((resource, _)) if resource == ProductId::RESOURCE => {
                Err(IdentifierError::ProductLevel(text.to_owned()))
            }
            Some(_) => VariantId::parse(text),
            None => Err(IdentifierError::Malformed(text.to_owned())),
        };
    }

    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(IdentifierError::NoDigits(text.to_owned()));
    }
    Ok(VariantId(format!(
        "{GID_PREFIX}{}/{digits}",
        VariantId::RESOURCE
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_gid_passes_through() {
        let id = normalize_variant_id("gid://shopify/ProductVariant/44012345").unwrap();
        assert_eq!(id.as_str(), "gid://shopify/ProductVariant/44012345");
    }

    #[test]
    fn test_product_gid_is_rejected() {
        let err = normalize_variant_id("gid://shopify/Product/1").unwrap_err();
        assert_eq!(
            err,
            IdentifierError::ProductLevel("gid://shopify/Product/1".to_string())
        );
    }

    #[test]
    fn test_other_resource_is_rejected() {
        let err = normalize_variant_id("gid://shopify/Collection/9").unwrap_err();
        assert!(matches!(
            err,
            IdentifierError::WrongResource { expected: "ProductVariant", ref found, .. }
                if found == "Collection"
        ));
    }

    #[test]
    fn test_bare_numeric_text() {
        let id = normalize_variant_id("987").unwrap();
        assert_eq!(id.as_str(), "gid://shopify/ProductVariant/987");
        assert_eq!(id.numeric_id(), Some("987"));
    }

    #[test]
    fn test_alphanumeric_keeps_only_digits() {
        let id = normalize_variant_id("sku-12-ab-34").unwrap();
        assert_eq!(id.as_str(), "gid://shopify/ProductVariant/1234");
    }

    #[test]
    fn test_numeric_input() {
        let id = normalize_variant_id(55_u64).unwrap();
        assert_eq!(id.as_str(), "gid://shopify/ProductVariant/55");
    }

    #[test]
    fn test_empty_and_digitless() {
        assert_eq!(normalize_variant_id("  "), Err(IdentifierError::Empty));
        assert!(matches!(
            normalize_variant_id("no-digits"),
            Err(IdentifierError::NoDigits(_))
        ));
    }

    #[test]
    fn test_prefix_without_resource_is_malformed() {
        assert!(matches!(
            normalize_variant_id("gid://shopify/ProductVariant/"),
            Err(IdentifierError::Malformed(_))
        ));
        assert!(matches!(
            normalize_variant_id("gid://shopify/"),
            Err(IdentifierError::Malformed(_))
        ));
    }

    #[test]
    fn test_classify_merchandise() {
        assert_eq!(
            classify_merchandise("gid://shopify/Product/1").unwrap(),
            MerchandiseRef::Product(ProductId::from_numeric(1))
        );
        assert_eq!(
            classify_merchandise("2").unwrap(),
            MerchandiseRef::Variant(VariantId::from_numeric(2))
        );
        assert!(classify_merchandise("gid://shopify/Order/3").is_err());
    }

    #[test]
    fn test_decode_gid() {
        assert_eq!(decode_gid("gid://shopify/Product/123"), Some("123"));
        assert_eq!(decode_gid("gid://shopify/Cart/123?key=abc"), Some("123"));
        assert_eq!(decode_gid("gid://shopify/Cart/c1-abc"), None);
        assert_eq!(decode_gid("123"), None);
    }

    #[test]
    fn test_typed_parse_checks_resource() {
        assert!(VariantId::parse("gid://shopify/ProductVariant/1").is_ok());
        assert!(ProductId::parse("gid://shopify/ProductVariant/1").is_err());
        assert!(VariantId::parse("1").is_err());
    }

    #[test]
    fn test_serde_validates_resource() {
        let id = VariantId::from_numeric(5);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gid://shopify/ProductVariant/5\"");

        let parsed: VariantId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        let bad: Result<VariantId, _> = serde_json::from_str("\"gid://shopify/Product/5\"");
        assert!(bad.is_err());
    }
}
