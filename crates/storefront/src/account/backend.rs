//! Remote operations the account session depends on.

use std::future::Future;

use headless_cart_core::Email;
use secrecy::SecretString;

use crate::shopify::types::{Customer, CustomerAccessToken, NewCustomer, OrderConnection};
use crate::shopify::{ShopifyError, StorefrontClient};

/// Customer authentication and profile lookups.
pub trait AccountBackend: Send + Sync {
    /// Exchange credentials for an access token.
    fn create_access_token(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<CustomerAccessToken, ShopifyError>> + Send;

    /// Revoke an access token.
    fn delete_access_token(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<(), ShopifyError>> + Send;

    /// Register a customer; returns its ID.
    fn create_customer(
        &self,
        customer: &NewCustomer,
        password: &SecretString,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send;

    /// The customer owning a token; `None` if the token is no longer valid.
    fn customer(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Option<Customer>, ShopifyError>> + Send;

    /// A page of the customer's orders; `None` if the token is no longer valid.
    fn orders(
        &self,
        token: &SecretString,
        first: i64,
        after: Option<String>,
    ) -> impl Future<Output = Result<Option<OrderConnection>, ShopifyError>> + Send;
}

impl AccountBackend for StorefrontClient {
    fn create_access_token(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<CustomerAccessToken, ShopifyError>> + Send {
        self.customer_access_token_create(email, password)
    }

    fn delete_access_token(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<(), ShopifyError>> + Send {
        self.customer_access_token_delete(token)
    }

    fn create_customer(
        &self,
        customer: &NewCustomer,
        password: &SecretString,
    ) -> impl Future<Output = Result<String, ShopifyError>> + Send {
        self.customer_create(customer, password)
    }

    fn customer(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Option<Customer>, ShopifyError>> + Send {
        self.get_customer(token)
    }

    fn orders(
        &self,
        token: &SecretString,
        first: i64,
        after: Option<String>,
    ) -> impl Future<Output = Result<Option<OrderConnection>, ShopifyError>> + Send {
        self.get_customer_orders(token, first, after)
    }
}
