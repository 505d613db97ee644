//! Cart type conversion functions.

use crate::shopify::types::{
    Cart, CartCost, CartLine, CartMerchandise, CartMerchandiseProduct, CartUserError, Image,
    Money,
};

use super::super::queries::{
    CartFields, CartLineFields, ImageFields, MoneyFields, UserErrorFields,
};

pub(crate) fn convert_money(m: MoneyFields) -> Money {
    Money {
        amount: m.amount,
        currency_code: m.currency_code,
    }
}

pub(crate) fn convert_image(i: ImageFields) -> Image {
    Image {
        url: i.url,
        alt_text: i.alt_text,
    }
}

/// Convert the `CartFields` fragment into a [`Cart`].
pub fn convert_cart(cart: CartFields) -> Cart {
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount),
            total: convert_money(cart.cost.total_amount),
        },
        lines: cart
            .lines
            .edges
            .into_iter()
            .map(|e| convert_cart_line(e.node))
            .collect(),
    }
}

fn convert_cart_line(line: CartLineFields) -> CartLine {
    let m = line.merchandise;
    CartLine {
        id: line.id,
        quantity: line.quantity,
        merchandise: CartMerchandise {
            id: m.id,
            title: m.title,
            price: convert_money(m.price),
            image: m.image.map(convert_image),
            product: CartMerchandiseProduct {
                id: m.product.id,
                handle: m.product.handle,
                title: m.product.title,
                featured_image: m.product.featured_image.map(convert_image),
            },
        },
    }
}

/// Convert mutation user errors.
pub fn convert_user_errors(errors: Vec<UserErrorFields>) -> Vec<CartUserError> {
    errors
        .into_iter()
        .map(|e| CartUserError {
            code: e.code,
            field: e.field,
            message: e.message,
        })
        .collect()
}
