//! Terminal rendering.
//!
//! `render_*` build the text; the `print`-style helpers write it out.

use std::fmt::Write as _;

use emporium_core::{CartState, ProductSnapshot, StockLevel};
use emporium_storefront::api::Order;

use crate::commands::CommandError;

#[allow(clippy::print_stdout)]
pub fn print(text: &str) {
    print!("{text}");
}

#[allow(clippy::print_stdout)]
pub fn notice(message: &str) {
    println!("{message}");
}

#[allow(clippy::print_stderr)]
pub fn warning(message: &str) {
    eprintln!("warning: {message}");
}

#[allow(clippy::print_stderr)]
pub fn failure(err: &CommandError) {
    eprintln!("error: {err}");
}

fn availability(product: &ProductSnapshot) -> String {
    match product.availability() {
        StockLevel::OutOfStock => "Out of stock".to_string(),
        StockLevel::Low(n) => format!("Only {n} left"),
        StockLevel::InStock => "In stock".to_string(),
    }
}

pub fn render_products(products: &[ProductSnapshot]) -> String {
    if products.is_empty() {
        return "No products found.\n".to_string();
    }

    let mut out = String::new();
    for product in products {
        let _ = writeln!(
            out,
            "{:<26} {:<32} {:>10}  {}",
            product.id.as_str(),
            product.name,
            product.price.to_string(),
            availability(product)
        );
        if product.has_sizes() {
            let sizes: Vec<String> = product
                .sizes
                .iter()
                .map(|s| format!("{} ({})", s.size, s.stock.max(0)))
                .collect();
            let _ = writeln!(out, "{:<26} sizes: {}", "", sizes.join(", "));
        }
    }
    out
}

pub fn render_cart(cart: &CartState) -> String {
    if cart.is_empty() {
        return "Your cart is empty.\n".to_string();
    }

    let mut out = String::new();
    for line in cart.items() {
        let size = line
            .size
            .as_deref()
            .map_or_else(String::new, |s| format!(" (size {s})"));
        let _ = writeln!(
            out,
            "{}{}  {} x {} = {}  [max {}]",
            line.name,
            size,
            line.qty,
            line.price,
            line.line_total(),
            line.max_stock
        );
    }
    let _ = writeln!(
        out,
        "Total: {} item(s), {}",
        cart.total_items(),
        cart.total_price()
    );
    out
}

pub fn render_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet.\n".to_string();
    }

    let mut out = String::new();
    for order in orders {
        let _ = writeln!(
            out,
            "{}  {:<10}  {:>10}  {} line(s)  {}",
            order.id,
            order.status.to_string(),
            order.total_amount.to_string(),
            order.items.len(),
            order.created_at.as_deref().unwrap_or("")
        );
    }
    out
}

pub fn render_order(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order {} ({})", order.id, order.status);
    if let Some(created_at) = &order.created_at {
        let _ = writeln!(out, "Placed: {created_at}");
    }
    for line in &order.items {
        let size = line
            .size
            .as_deref()
            .map_or_else(String::new, |s| format!(" (size {s})"));
        let _ = writeln!(out, "  {}{} x {}", line.product_name(), size, line.quantity);
    }
    let _ = writeln!(out, "Total: {}", order.total_amount);
    out
}
