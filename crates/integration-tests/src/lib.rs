//! Integration test support for the headless cart.
//!
//! [`FakeShopify`] is an in-process stand-in for the Storefront API. It
//! implements both backend traits, keeps carts and customers in memory, and
//! records every call so tests can assert on what went over the wire.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p headless-cart-integration-tests
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use headless_cart::account::AccountBackend;
use headless_cart::cart::CartBackend;
use headless_cart::shopify::types::{
    Cart, CartCost, CartLine, CartLineInput, CartLineUpdateInput, CartMerchandise,
    CartMerchandiseProduct, CartUserError, Customer, CustomerAccessToken, Money, NewCustomer,
    Order, OrderConnection, PageInfo, ProductVariant, ProductVariants,
};
use headless_cart::shopify::ShopifyError;
use headless_cart_core::{Email, ProductId};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

/// One call made against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateCart {
        lines: Vec<(String, i64)>,
        buyer: Option<String>,
    },
    GetCart(String),
    AddLines {
        cart_id: String,
        lines: Vec<(String, i64)>,
    },
    UpdateLines {
        cart_id: String,
        lines: Vec<(String, i64)>,
    },
    RemoveLines {
        cart_id: String,
        line_ids: Vec<String>,
    },
    ProductVariants(String),
    CreateAccessToken(String),
    DeleteAccessToken(String),
    CreateCustomer(NewCustomer),
    Customer(String),
    Orders {
        first: i64,
        after: Option<String>,
    },
}

impl Call {
    /// Whether the call changes a cart.
    pub const fn is_cart_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateCart { .. }
                | Self::AddLines { .. }
                | Self::UpdateLines { .. }
                | Self::RemoveLines { .. }
        )
    }
}

/// How the next remote call should fail.
#[derive(Debug, Clone)]
pub enum Failure {
    /// HTTP 503.
    Unavailable,
    /// A `userErrors` entry with this message.
    UserError(String),
}

impl Failure {
    fn into_error(self) -> ShopifyError {
        match self {
            Self::Unavailable => ShopifyError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            },
            Self::UserError(message) => user_error(message),
        }
    }
}

#[derive(Debug, Clone)]
struct CatalogVariant {
    product_id: String,
    product_title: String,
    title: String,
    available: bool,
    price: Decimal,
}

#[derive(Debug, Clone)]
struct FakeCart {
    lines: Vec<(String, String, i64)>,
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    customer: Customer,
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    variants: Vec<(String, CatalogVariant)>,
    carts: HashMap<String, FakeCart>,
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    orders: Vec<Order>,
    token_expires_at: Option<String>,
    fail_next: Option<Failure>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn take_failure(&mut self) -> Result<(), ShopifyError> {
        self.fail_next.take().map_or(Ok(()), |f| Err(f.into_error()))
    }

    fn variant(&self, id: &str) -> Option<&CatalogVariant> {
        self.variants
            .iter()
            .find(|(variant_id, _)| variant_id == id)
            .map(|(_, v)| v)
    }

    fn add_to(&mut self, cart_id: &str, lines: &[CartLineInput]) -> Result<(), ShopifyError> {
        for line in lines {
            if self.variant(line.merchandise_id.as_str()).is_none() {
                return Err(user_error(format!(
                    "The merchandise with id {} does not exist.",
                    line.merchandise_id
                )));
            }
        }
        for line in lines {
            let existing = self
                .carts
                .get_mut(cart_id)
                .and_then(|c| {
                    c.lines
                        .iter_mut()
                        .find(|(_, variant_id, _)| variant_id == line.merchandise_id.as_str())
                })
                .map(|(_, _, quantity)| quantity);
            if let Some(quantity) = existing {
                *quantity += line.quantity;
                continue;
            }
            let line_id = format!("gid://shopify/CartLine/{}", self.next_id());
            if let Some(cart) = self.carts.get_mut(cart_id) {
                cart.lines
                    .push((line_id, line.merchandise_id.to_string(), line.quantity));
            }
        }
        Ok(())
    }

    fn render(&self, cart_id: &str) -> Option<Cart> {
        let cart = self.carts.get(cart_id)?;
        let mut subtotal = Decimal::ZERO;
        let mut total_quantity = 0;
        let lines = cart
            .lines
            .iter()
            .filter_map(|(line_id, variant_id, quantity)| {
                let variant = self.variant(variant_id)?;
                subtotal += variant.price * Decimal::from(*quantity);
                total_quantity += quantity;
                Some(CartLine {
                    id: line_id.clone(),
                    quantity: *quantity,
                    merchandise: CartMerchandise {
                        id: variant_id.clone(),
                        title: variant.title.clone(),
                        price: usd(variant.price),
                        image: None,
                        product: CartMerchandiseProduct {
                            id: variant.product_id.clone(),
                            handle: variant.product_title.to_lowercase().replace(' ', "-"),
                            title: variant.product_title.clone(),
                            featured_image: None,
                        },
                    },
                })
            })
            .collect();

        let suffix = cart_id.rsplit('/').next().unwrap_or(cart_id);
        Some(Cart {
            id: cart_id.to_string(),
            checkout_url: format!("https://shop.example.com/cart/c/{suffix}"),
            total_quantity,
            cost: CartCost {
                subtotal: usd(subtotal),
                total: usd(subtotal),
            },
            lines,
        })
    }

    fn customer_for(&self, token: &str) -> Option<Customer> {
        let email = self.tokens.get(token)?;
        self.accounts.get(email).map(|a| a.customer.clone())
    }
}

/// In-memory Storefront API.
#[derive(Default)]
pub struct FakeShopify {
    inner: Mutex<Inner>,
}

impl FakeShopify {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product whose variants are `(numeric id, title, available, price)`.
    pub fn with_product(self, product: u64, title: &str, variants: &[(u64, &str, bool, &str)]) -> Self {
        {
            let mut inner = self.lock();
            for &(variant, variant_title, available, price) in variants {
                inner.variants.push((
                    format!("gid://shopify/ProductVariant/{variant}"),
                    CatalogVariant {
                        product_id: format!("gid://shopify/Product/{product}"),
                        product_title: title.to_string(),
                        title: variant_title.to_string(),
                        available,
                        price: Decimal::from_str(price).unwrap_or_default(),
                    },
                ));
            }
        }
        self
    }

    /// Register a customer account.
    pub fn with_account(self, email: &str, password: &str, first_name: &str) -> Self {
        {
            let mut inner = self.lock();
            let id = format!("gid://shopify/Customer/{}", inner.next_id());
            inner.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    customer: Customer {
                        id,
                        first_name: Some(first_name.to_string()),
                        last_name: None,
                        email: Some(email.to_string()),
                        display_name: first_name.to_string(),
                        phone: None,
                        default_address: None,
                    },
                },
            );
        }
        self
    }

    /// Orders returned to any signed-in customer.
    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        self.lock().orders = orders;
        self
    }

    /// Expiry handed out with new access tokens.
    pub fn with_token_expiry(self, expires_at: &str) -> Self {
        self.lock().token_expires_at = Some(expires_at.to_string());
        self
    }

    /// Make Shopify forget a cart, as it does after checkout or expiry.
    pub fn expire_cart(&self, cart_id: &str) {
        self.lock().carts.remove(cart_id);
    }

    /// Revoke every access token.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Fail the next remote call.
    pub fn fail_next(&self, failure: Failure) {
        self.lock().fail_next = Some(failure);
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Cart-mutating calls so far.
    pub fn cart_mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(Call::is_cart_mutation)
            .collect()
    }

    /// Number of carts created.
    pub fn carts_created(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::CreateCart { .. }))
            .count()
    }

    /// Current server-side state of a cart.
    pub fn cart(&self, cart_id: &str) -> Option<Cart> {
        self.lock().render(cart_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, Inner> {
        let mut inner = self.lock();
        inner.calls.push(call);
        inner
    }
}

impl CartBackend for FakeShopify {
    async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        buyer_token: Option<&SecretString>,
    ) -> Result<Cart, ShopifyError> {
        let mut inner = self.record(Call::CreateCart {
            lines: pairs(&lines),
            buyer: buyer_token.map(|t| t.expose_secret().to_string()),
        });
        inner.take_failure()?;

        let cart_id = format!("gid://shopify/Cart/c{}", inner.next_id());
        inner
            .carts
            .insert(cart_id.clone(), FakeCart { lines: Vec::new() });
        if let Err(e) = inner.add_to(&cart_id, &lines) {
            inner.carts.remove(&cart_id);
            return Err(e);
        }
        inner.render(&cart_id).ok_or_else(|| missing(&cart_id))
    }

    async fn get_cart(&self, cart_id: &str) -> Result<Option<Cart>, ShopifyError> {
        let mut inner = self.record(Call::GetCart(cart_id.to_string()));
        inner.take_failure()?;
        Ok(inner.render(cart_id))
    }

    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let mut inner = self.record(Call::AddLines {
            cart_id: cart_id.to_string(),
            lines: pairs(&lines),
        });
        inner.take_failure()?;
        if !inner.carts.contains_key(cart_id) {
            return Err(missing(cart_id));
        }
        inner.add_to(cart_id, &lines)?;
        inner.render(cart_id).ok_or_else(|| missing(cart_id))
    }

    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let mut inner = self.record(Call::UpdateLines {
            cart_id: cart_id.to_string(),
            lines: lines.iter().map(|l| (l.id.clone(), l.quantity)).collect(),
        });
        inner.take_failure()?;
        let cart = inner.carts.get_mut(cart_id).ok_or_else(|| missing(cart_id))?;
        for update in &lines {
            let line = cart
                .lines
                .iter_mut()
                .find(|(line_id, _, _)| *line_id == update.id)
                .ok_or_else(|| user_error(format!("The line with id {} does not exist.", update.id)))?;
            line.2 = update.quantity;
        }
        inner.render(cart_id).ok_or_else(|| missing(cart_id))
    }

    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let mut inner = self.record(Call::RemoveLines {
            cart_id: cart_id.to_string(),
            line_ids: line_ids.clone(),
        });
        inner.take_failure()?;
        let cart = inner.carts.get_mut(cart_id).ok_or_else(|| missing(cart_id))?;
        cart.lines.retain(|(line_id, _, _)| !line_ids.contains(line_id));
        inner.render(cart_id).ok_or_else(|| missing(cart_id))
    }

    async fn product_variants(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<ProductVariants>, ShopifyError> {
        let mut inner = self.record(Call::ProductVariants(product_id.to_string()));
        inner.take_failure()?;

        let variants: Vec<_> = inner
            .variants
            .iter()
            .filter(|(_, v)| v.product_id == product_id.as_str())
            .collect();
        let Some((_, first)) = variants.first() else {
            return Ok(None);
        };
        Ok(Some(ProductVariants {
            product_id: product_id.to_string(),
            title: first.product_title.clone(),
            variants: variants
                .iter()
                .map(|(id, v)| ProductVariant {
                    id: id.clone(),
                    title: v.title.clone(),
                    available_for_sale: v.available,
                    price: usd(v.price),
                })
                .collect(),
        }))
    }
}

impl AccountBackend for FakeShopify {
    async fn create_access_token(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let mut inner = self.record(Call::CreateAccessToken(email.to_string()));
        inner.take_failure()?;

        let valid = inner
            .accounts
            .get(email.as_str())
            .is_some_and(|a| a.password == password.expose_secret());
        if !valid {
            return Err(user_error("Unidentified customer".to_string()));
        }

        let token = format!("tok_{}", inner.next_id());
        inner.tokens.insert(token.clone(), email.to_string());
        Ok(CustomerAccessToken {
            access_token: SecretString::from(token),
            expires_at: inner
                .token_expires_at
                .clone()
                .unwrap_or_else(|| "2099-01-01T00:00:00Z".to_string()),
        })
    }

    async fn delete_access_token(&self, token: &SecretString) -> Result<(), ShopifyError> {
        let mut inner = self.record(Call::DeleteAccessToken(token.expose_secret().to_string()));
        inner.take_failure()?;
        inner.tokens.remove(token.expose_secret());
        Ok(())
    }

    async fn create_customer(
        &self,
        customer: &NewCustomer,
        password: &SecretString,
    ) -> Result<String, ShopifyError> {
        let mut inner = self.record(Call::CreateCustomer(customer.clone()));
        inner.take_failure()?;

        if inner.accounts.contains_key(customer.email.as_str()) {
            return Err(user_error(
                "Email has already been taken".to_string(),
            ));
        }
        let id = format!("gid://shopify/Customer/{}", inner.next_id());
        inner.accounts.insert(
            customer.email.to_string(),
            Account {
                password: password.expose_secret().to_string(),
                customer: Customer {
                    id: id.clone(),
                    first_name: Some(customer.first_name.clone()),
                    last_name: Some(customer.last_name.clone()),
                    email: Some(customer.email.to_string()),
                    display_name: format!("{} {}", customer.first_name, customer.last_name),
                    phone: None,
                    default_address: None,
                },
            },
        );
        Ok(id)
    }

    async fn customer(&self, token: &SecretString) -> Result<Option<Customer>, ShopifyError> {
        let mut inner = self.record(Call::Customer(token.expose_secret().to_string()));
        inner.take_failure()?;
        Ok(inner.customer_for(token.expose_secret()))
    }

    async fn orders(
        &self,
        token: &SecretString,
        first: i64,
        after: Option<String>,
    ) -> Result<Option<OrderConnection>, ShopifyError> {
        let mut inner = self.record(Call::Orders {
            first,
            after: after.clone(),
        });
        inner.take_failure()?;
        if inner.customer_for(token.expose_secret()).is_none() {
            return Ok(None);
        }

        let start = after
            .and_then(|cursor| cursor.parse::<usize>().ok())
            .unwrap_or(0);
        let page_size = usize::try_from(first).unwrap_or(0);
        let orders: Vec<Order> = inner.orders.iter().skip(start).take(page_size).cloned().collect();
        let end = start + orders.len();
        Ok(Some(OrderConnection {
            page_info: PageInfo {
                has_next_page: end < inner.orders.len(),
                end_cursor: (!orders.is_empty()).then(|| end.to_string()),
            },
            orders,
        }))
    }
}

/// A simple order for fixtures.
pub fn order(number: i64, total: &str) -> Order {
    Order {
        id: format!("gid://shopify/Order/{number}"),
        order_number: number,
        processed_at: "2024-03-01T12:00:00Z".to_string(),
        financial_status: None,
        fulfillment_status: None,
        total: Money {
            amount: total.to_string(),
            currency_code: "USD".to_string(),
        },
        line_items: Vec::new(),
    }
}

fn pairs(lines: &[CartLineInput]) -> Vec<(String, i64)> {
    lines
        .iter()
        .map(|l| (l.merchandise_id.to_string(), l.quantity))
        .collect()
}

fn usd(amount: Decimal) -> Money {
    Money {
        amount: amount.to_string(),
        currency_code: "USD".to_string(),
    }
}

fn missing(cart_id: &str) -> ShopifyError {
    ShopifyError::NotFound(format!("Cart not found: {cart_id}"))
}

fn user_error(message: String) -> ShopifyError {
    ShopifyError::UserError(vec![CartUserError {
        code: None,
        field: None,
        message,
    }])
}
