//! Customer and order conversion functions.

use tracing::warn;

use crate::shopify::types::{
    Customer, MailingAddress, Order, OrderConnection, OrderLineItem, PageInfo,
};

use super::super::queries::{get_customer, get_customer_orders};
use super::cart::{convert_image, convert_money};

/// Convert a customer profile.
pub fn convert_customer(c: get_customer::CustomerFields) -> Customer {
    Customer {
        id: c.id,
        first_name: c.first_name,
        last_name: c.last_name,
        email: c.email,
        display_name: c.display_name,
        phone: c.phone,
        default_address: c.default_address.map(|a| MailingAddress {
            id: a.id,
            address1: a.address1,
            address2: a.address2,
            city: a.city,
            province: a.province,
            country: a.country,
            zip: a.zip,
            phone: a.phone,
        }),
    }
}

/// Convert a page of customer orders.
pub fn convert_order_connection(
    orders: get_customer_orders::CustomerOrders,
) -> OrderConnection {
    let connection = orders.orders;
    let page_info = connection.page_info.map_or(
        PageInfo {
            has_next_page: false,
            end_cursor: None,
        },
        |p| PageInfo {
            has_next_page: p.has_next_page,
            end_cursor: p.end_cursor,
        },
    );

    OrderConnection {
        orders: connection
            .edges
            .into_iter()
            .map(|e| convert_order(e.node))
            .collect(),
        page_info,
    }
}

fn convert_order(o: get_customer_orders::OrderFields) -> Order {
    let financial_status = o.financial_status.as_deref().and_then(|s| {
        s.parse()
            .inspect_err(|e| warn!(order = %o.id, "{e}"))
            .ok()
    });
    let fulfillment_status = o
        .fulfillment_status
        .parse()
        .inspect_err(|e| warn!(order = %o.id, "{e}"))
        .ok();

    Order {
        id: o.id,
        order_number: o.order_number,
        processed_at: o.processed_at,
        financial_status,
        fulfillment_status,
        total: convert_money(o.total_price),
        line_items: o
            .line_items
            .edges
            .into_iter()
            .map(|e| OrderLineItem {
                title: e.node.title,
                quantity: e.node.quantity,
                image: e.node.variant.and_then(|v| v.image).map(convert_image),
            })
            .collect(),
    }
}
