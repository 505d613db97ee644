//! Shopify Storefront API client implementation.
//!
//! Sends hand-written GraphQL documents through `graphql_client`'s envelope
//! with `reqwest` 0.13 for HTTP. Product variant lookups are cached with
//! `moka`; carts and customer data always go to Shopify.

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;

use graphql_client::{GraphQLQuery, Response};
use headless_cart_core::{Email, ProductId};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::config::{ConfigError, ShopifyStorefrontConfig};
use crate::shopify::types::{
    Cart, CartLineInput, CartLineUpdateInput, Customer, CustomerAccessToken, NewCustomer,
    OrderConnection, ProductVariants,
};
use crate::shopify::{GraphQLError, ShopifyError};

use cache::{CacheValue, product_variants_key};
use conversions::{
    convert_cart, convert_customer, convert_order_connection, convert_product_variants,
    convert_user_errors,
};
use queries::{
    AddCartLines, CartMutationPayload, CreateCart, CustomerAccessTokenCreate,
    CustomerAccessTokenDelete, CustomerCreate, GetCart, GetCustomer, GetCustomerOrders,
    GetProductVariants, RemoveCartLines, UpdateCartLines, add_cart_lines, create_cart,
    customer_access_token_create, customer_access_token_delete, customer_create, get_cart,
    get_customer, get_customer_orders, get_product_variants, remove_cart_lines,
    update_cart_lines,
};

/// Header carrying the public Storefront access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; clones share the HTTP connection pool and the variant
/// cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: url::Url,
    access_token: SecretString,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the store domain does not form a valid endpoint.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ConfigError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.variant_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint()?,
                access_token: config.access_token.clone(),
                cache,
            }),
        })
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError>
    where
        Q::Variables: serde::Serialize,
    {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect(),
            });
        }

        parse_response::<Q::ResponseData>(request_body.operation_name, &response_text)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a new cart with the given lines.
    ///
    /// When `buyer_token` is set the cart is associated with that customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines, buyer_token), fields(lines = lines.len(), buyer = buyer_token.is_some()))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        buyer_token: Option<&SecretString>,
    ) -> Result<Cart, ShopifyError> {
        let variables = create_cart::Variables {
            input: create_cart::CartInput {
                lines,
                buyer_identity: buyer_token.map(|t| create_cart::BuyerIdentityInput {
                    customer_access_token: t.expose_secret().to_string(),
                }),
            },
        };

        let data = self.execute::<CreateCart>(variables).await?;
        cart_from_payload(data.cart_create, "create cart", None)
    }

    /// Get an existing cart.
    ///
    /// Returns `Ok(None)` when Shopify no longer knows the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Option<Cart>, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;
        Ok(data.cart.map(convert_cart))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the cart no longer exists, or an
    /// error if the update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id, lines = lines.len()))]
    pub async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = add_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines,
        };

        let data = self.execute::<AddCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_add, "add to cart", Some(cart_id))
    }

    /// Update line quantities in a cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the cart no longer exists, or an
    /// error if the update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines,
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_update, "update cart", Some(cart_id))
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the cart no longer exists, or an
    /// error if the removal fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let variables = remove_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            line_ids,
        };

        let data = self.execute::<RemoveCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_remove, "remove from cart", Some(cart_id))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the purchasable variants of a product.
    ///
    /// Returns `Ok(None)` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_variants(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<ProductVariants>, ShopifyError> {
        let cache_key = product_variants_key(product_id.as_str());

        if let Some(CacheValue::ProductVariants(variants)) =
            self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for product variants");
            return Ok(Some(*variants));
        }

        let variables = get_product_variants::Variables {
            id: product_id.to_string(),
        };

        let data = self.execute::<GetProductVariants>(variables).await?;
        let Some(product) = data.product.map(convert_product_variants) else {
            return Ok(None);
        };

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::ProductVariants(Box::new(product.clone())),
            )
            .await;

        Ok(Some(product))
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Customer Methods
    // =========================================================================

    /// Exchange an email and password for a customer access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` for rejected credentials, or an
    /// error if the API request fails.
    #[instrument(skip(self, email, password))]
    pub async fn customer_access_token_create(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let variables = customer_access_token_create::Variables {
            input: customer_access_token_create::CustomerAccessTokenCreateInput {
                email: email.to_string(),
                password: password.expose_secret().to_string(),
            },
        };

        let data = self.execute::<CustomerAccessTokenCreate>(variables).await?;
        let payload = data.customer_access_token_create.ok_or_else(|| {
            ShopifyError::Malformed("customerAccessTokenCreate returned no payload".to_string())
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(ShopifyError::UserError(convert_user_errors(
                payload.customer_user_errors,
            )));
        }

        payload
            .customer_access_token
            .map(|t| CustomerAccessToken {
                access_token: SecretString::from(t.access_token),
                expires_at: t.expires_at,
            })
            .ok_or_else(|| ShopifyError::Malformed("Failed to create access token".to_string()))
    }

    /// Revoke a customer access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn customer_access_token_delete(
        &self,
        token: &SecretString,
    ) -> Result<(), ShopifyError> {
        let variables = customer_access_token_delete::Variables {
            customer_access_token: token.expose_secret().to_string(),
        };

        let data = self.execute::<CustomerAccessTokenDelete>(variables).await?;
        let deleted = data
            .customer_access_token_delete
            .and_then(|p| p.deleted_access_token)
            .is_some();
        debug!(deleted, "Customer access token revoked");
        Ok(())
    }

    /// Register a new customer and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` if Shopify rejects the registration
    /// (e.g., email already taken), or an error if the API request fails.
    #[instrument(skip(self, customer, password), fields(email = %customer.email))]
    pub async fn customer_create(
        &self,
        customer: &NewCustomer,
        password: &SecretString,
    ) -> Result<String, ShopifyError> {
        let variables = customer_create::Variables {
            input: customer_create::CustomerCreateInput {
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
                email: customer.email.to_string(),
                password: password.expose_secret().to_string(),
                accepts_marketing: customer.accepts_marketing,
            },
        };

        let data = self.execute::<CustomerCreate>(variables).await?;
        let payload = data.customer_create.ok_or_else(|| {
            ShopifyError::Malformed("customerCreate returned no payload".to_string())
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(ShopifyError::UserError(convert_user_errors(
                payload.customer_user_errors,
            )));
        }

        payload
            .customer
            .map(|c| c.id)
            .ok_or_else(|| ShopifyError::Malformed("Failed to create customer".to_string()))
    }

    /// Get the customer a token belongs to.
    ///
    /// Returns `Ok(None)` if the token is expired or revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_customer(
        &self,
        token: &SecretString,
    ) -> Result<Option<Customer>, ShopifyError> {
        let variables = get_customer::Variables {
            customer_access_token: token.expose_secret().to_string(),
        };

        let data = self.execute::<GetCustomer>(variables).await?;
        Ok(data.customer.map(convert_customer))
    }

    /// Get a page of the customer's orders, newest first.
    ///
    /// Returns `Ok(None)` if the token is expired or revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, after), fields(first = first))]
    pub async fn get_customer_orders(
        &self,
        token: &SecretString,
        first: i64,
        after: Option<String>,
    ) -> Result<Option<OrderConnection>, ShopifyError> {
        let variables = get_customer_orders::Variables {
            customer_access_token: token.expose_secret().to_string(),
            first,
            after,
        };

        let data = self.execute::<GetCustomerOrders>(variables).await?;
        Ok(data.customer.map(convert_order_connection))
    }
}

/// Parse a GraphQL response body into its data, surfacing GraphQL errors.
fn parse_response<T: serde::de::DeserializeOwned>(
    operation: &str,
    body: &str,
) -> Result<T, ShopifyError> {
    let response: Response<T> = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(
                error = %e,
                operation,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Shopify GraphQL response"
            );
            return Err(ShopifyError::Parse(e));
        }
    };

    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        tracing::debug!(errors = ?errors, operation, "GraphQL errors in response");
        return Err(ShopifyError::GraphQL(
            errors.into_iter().map(GraphQLError::from).collect(),
        ));
    }

    response.data.ok_or_else(|| {
        tracing::error!(
            operation,
            body = %body.chars().take(500).collect::<String>(),
            "Shopify GraphQL response has no data and no errors"
        );
        ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
    })
}

/// Unwrap a cart mutation payload.
///
/// User errors win over a returned cart. A mutation against a known cart ID
/// that comes back without a cart means Shopify no longer has it.
fn cart_from_payload(
    payload: Option<CartMutationPayload>,
    action: &str,
    cart_id: Option<&str>,
) -> Result<Cart, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::Malformed(format!("Failed to {action}")));
    };

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserError(convert_user_errors(
            payload.user_errors,
        )));
    }

    match (payload.cart, cart_id) {
        (Some(cart), _) => Ok(convert_cart(cart)),
        (None, Some(id)) => Err(ShopifyError::NotFound(format!("Cart not found: {id}"))),
        (None, None) => Err(ShopifyError::Malformed(format!("Failed to {action}"))),
    }
}
