//! Human-facing summary rendering

use colored::Colorize;

use openibuy_types::SagaSummary;

fn mark(submitted: bool) -> colored::ColoredString {
    if submitted {
        "submitted".bright_green()
    } else {
        "pending".yellow()
    }
}

/// Render the end-of-saga summary.
pub fn render_summary(summary: &SagaSummary) {
    println!();
    println!("{}", "Purchase Summary".bright_white().bold());
    println!("{}", "─".repeat(60));

    println!("  {} {}", "Order:".bright_white(), summary.order_no.bright_cyan());
    println!("  {} {}", "Shipping quote:".bright_white(), summary.shipping_quote_id);
    println!("  {} {}", "Shipping address:".bright_white(), summary.shipping_address_id);
    if let Some(wallet) = &summary.buyer_wallet {
        println!("  {} {}", "Buyer wallet:".bright_white(), wallet);
    }

    let product = &summary.selected_product;
    println!();
    println!("{}", "Selected Product:".bright_white().bold());
    println!("  {} {}", "Item:".bright_white(), product.item_id.bright_cyan());
    println!("  {} {}", "Shop:".bright_white(), product.shop_id);
    if let Some(sku) = &product.sku_id {
        println!("  {} {}", "SKU:".bright_white(), sku);
    }
    if let Some(title) = &product.title {
        println!("  {} {}", "Title:".bright_white(), title);
    }
    if let Some(price) = product.comparable_price {
        println!("  {} {}", "Price:".bright_white(), format!("{price:.2}").bright_green());
    }

    println!();
    println!("{}", "Settlement:".bright_white().bold());
    println!("  create  {}", mark(summary.create_submitted));
    println!("  fund    {}", mark(summary.fund_submitted));
    println!("  confirm {}", mark(summary.confirm_submitted));
    for state in [
        ("escrow state (create)", &summary.create_escrow_state),
        ("escrow state (before confirm)", &summary.state_before_confirm),
        ("escrow state (after confirm)", &summary.state_after_confirm),
    ] {
        if let Some(value) = state.1 {
            println!("  {} {}", format!("{}:", state.0).bright_white(), value);
        }
    }

    if !summary.settlement_complete() {
        println!();
        println!(
            "{} {}",
            "Note:".yellow().bold(),
            "no tx hash was supplied for at least one settlement step; on-chain state may remain unchanged.".yellow()
        );
    }

    if let Ok(raw) = serde_json::to_string_pretty(summary) {
        println!();
        println!("{raw}");
    }
}
