//! `hc account` commands.

#![allow(clippy::print_stdout)]

use headless_cart::shopify::types::{Customer, OrderConnection};
use headless_cart_core::{FulfillmentStatus, Price};
use secrecy::SecretString;

use super::{App, CommandError};

/// Sign in and move the cart to the customer.
///
/// # Errors
///
/// `MissingPassword`, or the account failure. A cart hand-over failure is
/// logged; the sign-in still counts.
pub async fn login(app: &App, email: &str, password: Option<String>) -> Result<(), CommandError> {
    let password = password
        .map(SecretString::from)
        .ok_or(CommandError::MissingPassword)?;
    let customer = app.account.login(email, &password).await?;
    hand_over_cart(app).await;
    print_customer(&customer);
    Ok(())
}

/// Register, sign in, and move the cart to the new customer.
///
/// # Errors
///
/// `MissingPassword`, or the account failure.
pub async fn register(
    app: &App,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: Option<String>,
) -> Result<(), CommandError> {
    let password = password
        .map(SecretString::from)
        .ok_or(CommandError::MissingPassword)?;
    let customer = app
        .account
        .register(first_name, last_name, email, &password)
        .await?;
    hand_over_cart(app).await;
    print_customer(&customer);
    Ok(())
}

/// Sign out. The cart stays, but later carts are anonymous.
///
/// # Errors
///
/// Returns an error if the state file cannot be written.
pub async fn logout(app: &App) -> Result<(), CommandError> {
    app.account.logout().await?;
    app.cart.on_signed_out();
    println!("Signed out");
    Ok(())
}

/// Print the signed-in customer.
pub fn show(app: &App) {
    match app.account.customer() {
        Some(customer) if app.account.is_authenticated() => print_customer(&customer),
        _ => println!("Not signed in"),
    }
}

/// Print a page of orders.
///
/// # Errors
///
/// Returns the account failure.
pub async fn orders(app: &App, first: i64, after: Option<String>) -> Result<(), CommandError> {
    let page = app.account.orders(first, after).await?;
    print_orders(&page);
    Ok(())
}

async fn hand_over_cart(app: &App) {
    let Some(token) = app.account.access_token() else {
        return;
    };
    if let Err(e) = app.cart.on_authenticated(token).await {
        tracing::warn!(error = %e, "Failed to move cart to signed-in customer");
    }
}

fn print_customer(customer: &Customer) {
    println!("{}", customer.display_name);
    if let Some(email) = &customer.email {
        println!("  {email}");
    }
    if let Some(address) = &customer.default_address {
        let parts: Vec<&str> = [&address.city, &address.province, &address.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        if !parts.is_empty() {
            println!("  {}", parts.join(", "));
        }
    }
}

fn print_orders(page: &OrderConnection) {
    if page.orders.is_empty() {
        println!("No orders");
        return;
    }

    for order in &page.orders {
        let total = Price::parse(&order.total.amount, &order.total.currency_code).map_or_else(
            |_| format!("{} {}", order.total.amount, order.total.currency_code),
            |p| p.to_string(),
        );
        let fulfillment = order
            .fulfillment_status
            .map_or("Unknown", FulfillmentStatus::label);
        println!(
            "#{}  {}  {total}  {fulfillment}",
            order.order_number, order.processed_at
        );
        for item in &order.line_items {
            println!("      {} x {}", item.quantity, item.title);
        }
    }
    if page.page_info.has_next_page
        && let Some(cursor) = &page.page_info.end_cursor
    {
        println!("More: --after {cursor}");
    }
}
