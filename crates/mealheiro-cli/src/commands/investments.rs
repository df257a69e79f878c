//! Investment command implementations

use anyhow::Result;
use mealheiro_core::models::NewInvestment;
use mealheiro_core::Database;

use super::{ensure_owner, money, truncate};

pub fn cmd_investments_add(db: &Database, user_id: i64, investment: NewInvestment) -> Result<i64> {
    let id = db.add_investment(user_id, &investment)?;
    println!(
        "✅ Investment '{}' added (ID: {}): {} × {:.2} {}",
        investment.name.trim(),
        id,
        investment.quantity,
        investment.purchase_price,
        investment.currency.trim().to_uppercase()
    );
    Ok(id)
}

pub fn cmd_investments_list(db: &Database, user_id: i64) -> Result<()> {
    let investments = db.list_investments(user_id)?;

    if investments.is_empty() {
        println!("No investments. Add one with:");
        println!("  mealheiro investments add \"MSCI World\" 10 85.20 -t etf");
        return Ok(());
    }

    println!();
    println!("📈 Investments");
    println!("   ─────────────────────────────────────────────────────────────");

    for inv in &investments {
        let symbol = inv
            .symbol
            .as_deref()
            .map(|s| format!(" ({})", s))
            .unwrap_or_default();
        println!(
            "   [{}] {:24} │ {:10} │ {:>12} │ {:>+10.2} ({:+.1}%)",
            inv.id,
            truncate(&format!("{}{}", inv.name, symbol), 24),
            inv.investment_type.as_str(),
            money(inv.current_value()),
            inv.profit_loss(),
            inv.profit_loss_percentage()
        );
    }

    let summary = db.portfolio_summary(user_id)?;
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Invested {} │ Worth {} │ {:+.2} ({:+.1}%)",
        money(summary.total_invested),
        money(summary.current_value),
        summary.profit_loss,
        summary.profit_loss_percentage
    );
    for allocation in &summary.by_type {
        println!(
            "     {:12} {:>12} {:5.1}%",
            allocation.category,
            money(allocation.amount),
            allocation.percentage
        );
    }

    Ok(())
}

pub fn cmd_investments_price(db: &Database, user_id: i64, id: i64, price: f64) -> Result<()> {
    let investment = db
        .get_investment(id)?
        .filter(|i| i.user_id == user_id)
        .ok_or_else(|| anyhow::anyhow!("Investment {} not found", id))?;

    db.update_investment_price(id, price)?;
    println!(
        "✅ {} now priced at {:.2} {}",
        investment.name, price, investment.currency
    );
    Ok(())
}

pub fn cmd_investments_delete(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let investment = db.get_investment(id)?;
    ensure_owner("Investment", id, investment.as_ref().map(|i| i.user_id), user_id)?;

    db.delete_investment(id)?;
    println!("✅ Deleted investment {}", id);
    Ok(())
}
