//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with a
//! hand-written document and `serde` variable/response types, so requests go
//! through the same `graphql_client` envelope as generated queries would.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

use crate::shopify::types::{CartLineInput, CartLineUpdateInput};

/// Implement [`GraphQLQuery`] for a hand-written operation.
///
/// The operation module must define `Variables`, `ResponseData` and
/// `OPERATION_NAME`.
macro_rules! operation {
    ($name:ident, $module:ident, $document:expr) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $document,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

/// Selection set shared by every cart query and mutation.
macro_rules! cart_fields {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
  }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        merchandise {
          ... on ProductVariant {
            id
            title
            image { url altText }
            price { amount currencyCode }
            product {
              id
              title
              handle
              featuredImage { url altText }
            }
          }
        }
      }
    }
  }
}
"
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// `MoneyV2` selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyFields {
    pub amount: String,
    pub currency_code: String,
}

/// `Image` selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub url: String,
    pub alt_text: Option<String>,
}

/// Relay-style connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    #[serde(default)]
    pub page_info: Option<PageInfoFields>,
}

/// Relay-style edge.
#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

/// `PageInfo` selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoFields {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// `CartFields` fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCostFields,
    pub lines: Connection<CartLineFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub subtotal_amount: MoneyFields,
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineFields {
    pub id: String,
    pub quantity: i64,
    /// `ProductVariant` is the only `Merchandise` member.
    pub merchandise: CartMerchandiseFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMerchandiseFields {
    pub id: String,
    pub title: String,
    pub image: Option<ImageFields>,
    pub price: MoneyFields,
    pub product: CartMerchandiseProductFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMerchandiseProductFields {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub featured_image: Option<ImageFields>,
}

/// `CartUserError` / `CustomerUserError` selection.
#[derive(Debug, Clone, Deserialize)]
pub struct UserErrorFields {
    #[serde(default)]
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by `cartCreate` and the `cartLines*` mutations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartFields>,
    pub user_errors: Vec<UserErrorFields>,
}

// =============================================================================
// Cart operations
// =============================================================================

pub mod create_cart {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "createCart";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BuyerIdentityInput {
        pub customer_access_token: String,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub buyer_identity: Option<BuyerIdentityInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

operation!(
    CreateCart,
    create_cart,
    concat!(
        r"
mutation createCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fields!()
    )
);

pub mod get_cart {
    use super::{CartFields, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "getCart";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }
}

operation!(
    GetCart,
    get_cart,
    concat!(
        r"
query getCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
",
        cart_fields!()
    )
);

pub mod add_cart_lines {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "addCartLines";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

operation!(
    AddCartLines,
    add_cart_lines,
    concat!(
        r"
mutation addCartLines($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fields!()
    )
);

pub mod update_cart_lines {
    use super::{CartLineUpdateInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "updateCartLines";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

operation!(
    UpdateCartLines,
    update_cart_lines,
    concat!(
        r"
mutation updateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fields!()
    )
);

pub mod remove_cart_lines {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "removeCartLines";

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

operation!(
    RemoveCartLines,
    remove_cart_lines,
    concat!(
        r"
mutation removeCartLines($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fields!()
    )
);

// =============================================================================
// Product operations
// =============================================================================

pub mod get_product_variants {
    use super::{Connection, Deserialize, MoneyFields, Serialize};

    pub const OPERATION_NAME: &str = "getProductVariants";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ProductFields {
        pub id: String,
        pub title: String,
        pub variants: Connection<VariantFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantFields {
        pub id: String,
        pub title: String,
        pub available_for_sale: bool,
        pub price: MoneyFields,
    }
}

operation!(
    GetProductVariants,
    get_product_variants,
    r"
query getProductVariants($id: ID!) {
  product(id: $id) {
    id
    title
    variants(first: 100) {
      edges {
        node {
          id
          title
          availableForSale
          price { amount currencyCode }
        }
      }
    }
  }
}
"
);

// =============================================================================
// Customer operations
// =============================================================================

pub mod customer_access_token_create {
    use super::{Deserialize, Serialize, UserErrorFields};

    pub const OPERATION_NAME: &str = "customerAccessTokenCreate";

    /// Carries the plaintext password; deliberately not `Debug`.
    #[derive(Clone, Serialize)]
    pub struct CustomerAccessTokenCreateInput {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Serialize)]
    pub struct Variables {
        pub input: CustomerAccessTokenCreateInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_access_token_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub customer_access_token: Option<AccessTokenFields>,
        pub customer_user_errors: Vec<UserErrorFields>,
    }

    #[derive(Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccessTokenFields {
        pub access_token: String,
        pub expires_at: String,
    }

    impl std::fmt::Debug for AccessTokenFields {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("AccessTokenFields")
                .field("access_token", &"[REDACTED]")
                .field("expires_at", &self.expires_at)
                .finish()
        }
    }
}

operation!(
    CustomerAccessTokenCreate,
    customer_access_token_create,
    r"
mutation customerAccessTokenCreate($input: CustomerAccessTokenCreateInput!) {
  customerAccessTokenCreate(input: $input) {
    customerAccessToken { accessToken expiresAt }
    customerUserErrors { code field message }
  }
}
"
);

pub mod customer_access_token_delete {
    use super::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "customerAccessTokenDelete";

    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub customer_access_token: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_access_token_delete: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub deleted_access_token: Option<String>,
    }
}

operation!(
    CustomerAccessTokenDelete,
    customer_access_token_delete,
    r"
mutation customerAccessTokenDelete($customerAccessToken: String!) {
  customerAccessTokenDelete(customerAccessToken: $customerAccessToken) {
    deletedAccessToken
  }
}
"
);

pub mod customer_create {
    use super::{Deserialize, Serialize, UserErrorFields};

    pub const OPERATION_NAME: &str = "customerCreate";

    /// Carries the plaintext password; deliberately not `Debug`.
    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CustomerCreateInput {
        pub first_name: String,
        pub last_name: String,
        pub email: String,
        pub password: String,
        pub accepts_marketing: bool,
    }

    #[derive(Clone, Serialize)]
    pub struct Variables {
        pub input: CustomerCreateInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_create: Option<Payload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub customer: Option<CreatedCustomer>,
        pub customer_user_errors: Vec<UserErrorFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CreatedCustomer {
        pub id: String,
    }
}

operation!(
    CustomerCreate,
    customer_create,
    r"
mutation customerCreate($input: CustomerCreateInput!) {
  customerCreate(input: $input) {
    customer { id }
    customerUserErrors { code field message }
  }
}
"
);

pub mod get_customer {
    use super::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "getCustomer";

    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub customer_access_token: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub customer: Option<CustomerFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CustomerFields {
        pub id: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub email: Option<String>,
        pub display_name: String,
        pub phone: Option<String>,
        pub default_address: Option<AddressFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct AddressFields {
        pub id: String,
        pub address1: Option<String>,
        pub address2: Option<String>,
        pub city: Option<String>,
        pub province: Option<String>,
        pub country: Option<String>,
        pub zip: Option<String>,
        pub phone: Option<String>,
    }
}

operation!(
    GetCustomer,
    get_customer,
    r"
query getCustomer($customerAccessToken: String!) {
  customer(customerAccessToken: $customerAccessToken) {
    id
    firstName
    lastName
    email
    displayName
    phone
    defaultAddress { id address1 address2 city province country zip phone }
  }
}
"
);

pub mod get_customer_orders {
    use super::{Connection, Deserialize, ImageFields, MoneyFields, Serialize};

    pub const OPERATION_NAME: &str = "getCustomerOrders";

    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub customer_access_token: String,
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub customer: Option<CustomerOrders>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CustomerOrders {
        pub orders: Connection<OrderFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OrderFields {
        pub id: String,
        pub order_number: i64,
        pub processed_at: String,
        pub financial_status: Option<String>,
        pub fulfillment_status: String,
        pub total_price: MoneyFields,
        pub line_items: Connection<OrderLineItemFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OrderLineItemFields {
        pub title: String,
        pub quantity: i64,
        pub variant: Option<OrderVariantFields>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OrderVariantFields {
        pub image: Option<ImageFields>,
    }
}

operation!(
    GetCustomerOrders,
    get_customer_orders,
    r"
query getCustomerOrders($customerAccessToken: String!, $first: Int!, $after: String) {
  customer(customerAccessToken: $customerAccessToken) {
    orders(first: $first, after: $after) {
      pageInfo { hasNextPage endCursor }
      edges {
        node {
          id
          orderNumber
          processedAt
          financialStatus
          fulfillmentStatus
          totalPrice { amount currencyCode }
          lineItems(first: 5) {
            edges {
              node {
                title
                quantity
                variant { image { url altText } }
              }
            }
          }
        }
      }
    }
  }
}
"
);
