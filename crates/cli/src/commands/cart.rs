//! Cart commands.
//!
//! The catalog is loaded first so cart lines can be resolved to products.

use std::io::{self, Write};

use qkart_core::ProductId;
use qkart_storefront::cart::CartSummary;
use qkart_storefront::error::messages;
use qkart_storefront::{Notice, Storefront};

use super::CliError;
use crate::show;

/// Print the cart and its totals.
pub async fn show_cart(storefront: &Storefront) -> Result<(), CliError> {
    storefront.load_catalog().await?;
    let summary = storefront.refresh_cart().await?;
    print_summary(&summary)
}

/// Add one unit of a product.
pub async fn add(storefront: &Storefront, product_id: &ProductId) -> Result<(), CliError> {
    storefront.load_catalog().await?;
    let summary = storefront.add_to_cart(product_id).await?;

    show(&Notice::success(messages::ITEM_ADDED));
    print_summary(&summary)
}

/// Set a product's quantity.
pub async fn set(storefront: &Storefront, product_id: &ProductId, qty: u32) -> Result<(), CliError> {
    storefront.load_catalog().await?;
    let summary = storefront.set_quantity(product_id, qty).await?;

    show(&Notice::success(messages::ITEM_ADDED));
    print_summary(&summary)
}

fn print_summary(summary: &CartSummary) -> Result<(), CliError> {
    let mut out = io::stdout().lock();

    if summary.is_empty() {
        writeln!(out, "Cart is empty")?;
        return Ok(());
    }

    for item in &summary.items {
        writeln!(
            out,
            "{}\t{}\t{} x {}\t{}",
            item.product.id,
            item.product.name,
            item.qty,
            item.product.cost,
            item.line_cost()
        )?;
    }
    writeln!(
        out,
        "Total: {} ({} items)",
        summary.total_cost, summary.item_count
    )?;
    Ok(())
}
