//! Recurring expense command implementations

use anyhow::Result;
use chrono::NaiveDate;
use mealheiro_core::models::NewRecurringExpense;
use mealheiro_core::Database;

use super::{ensure_owner, money, truncate};

pub fn cmd_recurring_add(db: &Database, user_id: i64, item: NewRecurringExpense) -> Result<i64> {
    let id = db.add_recurring_expense(user_id, &item)?;
    println!(
        "✅ Recurring expense added (ID: {}): {} {} from {}",
        id,
        money(item.amount),
        item.frequency.as_str().to_lowercase(),
        item.start_date
    );
    Ok(id)
}

pub fn cmd_recurring_list(
    db: &Database,
    user_id: i64,
    include_paused: bool,
    today: NaiveDate,
) -> Result<()> {
    let items = db.list_recurring_expenses(user_id, !include_paused)?;

    if items.is_empty() {
        println!("No recurring expenses. Add one with:");
        println!("  mealheiro recurring add 9.99 \"Streaming\" -f monthly");
        return Ok(());
    }

    println!();
    println!("🔁 Recurring Expenses");
    println!("   ─────────────────────────────────────────────────────────────");

    for item in &items {
        let status_icon = if item.is_active { "✅" } else { "⏸️ " };
        let next = item
            .next_occurrence(today)
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {} [{}] {:24} │ {:>10}/{:<9} │ next {}",
            status_icon,
            item.id,
            truncate(&item.description, 24),
            money(item.amount),
            item.frequency.as_str().to_lowercase(),
            next
        );
    }

    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Monthly commitment: {}",
        money(db.monthly_recurring_commitment(user_id, today)?)
    );

    Ok(())
}

pub fn cmd_recurring_set_active(db: &Database, user_id: i64, id: i64, active: bool) -> Result<()> {
    let item = db
        .get_recurring_expense(id)?
        .filter(|item| item.user_id == user_id)
        .ok_or_else(|| anyhow::anyhow!("Recurring expense {} not found", id))?;

    if item.is_active == active {
        let state = if active { "active" } else { "paused" };
        println!("Recurring expense {} is already {}.", id, state);
        return Ok(());
    }

    db.set_recurring_active(id, active)?;
    if active {
        println!("✅ Resumed '{}'", item.description);
    } else {
        println!("⏸️  Paused '{}'", item.description);
    }
    Ok(())
}

pub fn cmd_recurring_delete(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let item = db.get_recurring_expense(id)?;
    ensure_owner("Recurring expense", id, item.as_ref().map(|i| i.user_id), user_id)?;

    db.delete_recurring_expense(id)?;
    println!("✅ Deleted recurring expense {}", id);
    Ok(())
}

pub fn cmd_recurring_upcoming(
    db: &Database,
    user_id: i64,
    today: NaiveDate,
    days: i64,
) -> Result<()> {
    let upcoming = db.upcoming_recurring(user_id, today, days)?;

    if upcoming.is_empty() {
        println!("Nothing due in the next {} days.", days);
        return Ok(());
    }

    println!();
    println!("📅 Due in the next {} days", days);
    println!("   ─────────────────────────────────────────────────────────────");

    let mut total = 0.0;
    for payment in &upcoming {
        total += payment.amount;
        let when = match payment.days_until {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };
        println!(
            "   {} │ {:>10} │ {:24} │ {}",
            payment.due,
            money(payment.amount),
            truncate(&payment.description, 24),
            when
        );
    }

    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total: {}", money(total));

    Ok(())
}
