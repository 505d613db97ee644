//! `hc cart` commands.

#![allow(clippy::print_stdout)]

use headless_cart::cart::{AddToCart, CartSnapshot};

use super::{App, CommandError};

/// Print the cart.
pub fn show(app: &App) {
    print_snapshot(&app.cart.snapshot());
}

/// Add a product or variant.
///
/// # Errors
///
/// Returns the cart failure.
pub async fn add(
    app: &App,
    id: String,
    variant: Option<String>,
    quantity: i64,
) -> Result<(), CommandError> {
    let mut item = AddToCart::new(id);
    if let Some(variant) = variant {
        item = item.with_variant(variant);
    }
    let snapshot = app.cart.add_to_cart(item, quantity).await?;
    print_snapshot(&snapshot);
    Ok(())
}

/// Change a line's quantity.
///
/// # Errors
///
/// Returns the cart failure.
pub async fn update(app: &App, line_id: &str, quantity: i64) -> Result<(), CommandError> {
    let snapshot = app.cart.update_quantity(line_id, quantity).await?;
    print_snapshot(&snapshot);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns the cart failure.
pub async fn remove(app: &App, line_id: &str) -> Result<(), CommandError> {
    let snapshot = app.cart.remove_line(line_id).await?;
    print_snapshot(&snapshot);
    Ok(())
}

/// Forget the cart.
///
/// # Errors
///
/// Returns an error if the state file cannot be written.
pub async fn clear(app: &App) -> Result<(), CommandError> {
    app.cart.clear_cart().await?;
    println!("Cart cleared");
    Ok(())
}

/// Print the checkout URL.
///
/// # Errors
///
/// `EmptyCart` if no cart exists yet.
pub fn checkout(app: &App) -> Result<(), CommandError> {
    let url = app.cart.checkout_url().ok_or(CommandError::EmptyCart)?;
    println!("{url}");
    Ok(())
}

fn print_snapshot(snapshot: &CartSnapshot) {
    if snapshot.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in &snapshot.items {
        let title = match &item.variant_title {
            Some(variant) => format!("{} ({variant})", item.title),
            None => item.title.clone(),
        };
        println!(
            "{:>3} x {title}  {}  [{}]",
            item.quantity,
            item.line_total(),
            item.line_id
        );
    }
    println!(
        "{} item(s), subtotal {}",
        snapshot.total_quantity, snapshot.subtotal
    );
    if let Some(url) = &snapshot.checkout_url {
        println!("Checkout: {url}");
    }
}
