//! Savings target command implementations

use anyhow::Result;
use chrono::NaiveDate;
use mealheiro_core::models::{NewSavingsTarget, SavingsChange, SavingsTarget};
use mealheiro_core::Database;

use super::{money, truncate};

/// Look up a target, treating other users' targets as missing
fn owned_target(db: &Database, user_id: i64, id: i64) -> Result<SavingsTarget> {
    db.get_savings_target(id)?
        .filter(|t| t.user_id == user_id)
        .ok_or_else(|| anyhow::anyhow!("Savings target {} not found", id))
}

fn print_change(target: &SavingsTarget, change: &SavingsChange) {
    println!(
        "✅ {}: {} → {} ({:+.2})",
        target.name,
        money(change.previous_amount),
        money(change.new_amount),
        change.amount_added
    );
    if change.new_amount >= target.target_amount {
        println!("   🎉 Target reached!");
    } else {
        println!(
            "   {} to go",
            money(target.target_amount - change.new_amount)
        );
    }
}

pub fn cmd_savings_add(db: &Database, user_id: i64, target: NewSavingsTarget) -> Result<i64> {
    let id = db.create_savings_target(user_id, &target)?;
    println!(
        "✅ Savings target '{}' created (ID: {}): {} of {}",
        target.name.trim(),
        id,
        money(target.initial_amount.max(0.0)),
        money(target.target_amount)
    );
    Ok(id)
}

pub fn cmd_savings_list(db: &Database, user_id: i64, today: NaiveDate) -> Result<()> {
    let targets = db.list_savings_targets(user_id)?;

    if targets.is_empty() {
        println!("No savings targets. Create one with:");
        println!("  mealheiro savings add \"Férias\" 1500 --end 2025-07-01");
        return Ok(());
    }

    println!();
    println!("🐷 Savings Targets");
    println!("   ─────────────────────────────────────────────────────────────");

    for t in &targets {
        let status_icon = if t.is_completed { "✅" } else { "🎯" };
        let deadline = match t.days_remaining(today) {
            Some(days) if days < 0 => format!("{} days overdue", -days),
            Some(days) => format!("{} days left", days),
            None => "no deadline".to_string(),
        };
        println!(
            "   {} [{}] {:20} │ {:>11} / {:<11} │ {:5.1}% │ {}",
            status_icon,
            t.id,
            truncate(&t.name, 20),
            money(t.current_amount),
            money(t.target_amount),
            t.progress_percentage(),
            deadline
        );
    }

    let summary = db.savings_summary(user_id)?;
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Saved {} of {} ({:.1}%), {} of {} targets completed",
        money(summary.total_saved),
        money(summary.total_target),
        summary.overall_progress,
        summary.completed_count,
        summary.target_count
    );

    Ok(())
}

pub fn cmd_savings_deposit(
    db: &Database,
    user_id: i64,
    id: i64,
    amount: f64,
    note: Option<&str>,
) -> Result<()> {
    owned_target(db, user_id, id)?;
    let change = db.add_to_savings_target(id, amount, note)?;
    let target = owned_target(db, user_id, id)?;
    print_change(&target, &change);
    Ok(())
}

pub fn cmd_savings_set(
    db: &Database,
    user_id: i64,
    id: i64,
    amount: f64,
    note: Option<&str>,
) -> Result<()> {
    owned_target(db, user_id, id)?;
    let change = db.set_savings_amount(id, amount, note)?;
    let target = owned_target(db, user_id, id)?;
    print_change(&target, &change);
    Ok(())
}

pub fn cmd_savings_history(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let target = owned_target(db, user_id, id)?;
    let history = db.savings_history(id)?;

    if history.is_empty() {
        println!("No updates recorded for '{}'.", target.name);
        return Ok(());
    }

    println!();
    println!("📜 History of '{}'", target.name);
    println!("   ─────────────────────────────────────────────────────────────");

    for update in history {
        println!(
            "   {} │ {:>+10.2} │ {:>11} → {:<11} │ {}",
            update.updated_at.format("%Y-%m-%d %H:%M"),
            update.amount_added,
            money(update.previous_amount),
            money(update.new_amount),
            update.note.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

pub fn cmd_savings_delete(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let target = owned_target(db, user_id, id)?;
    db.delete_savings_target(id)?;
    println!("✅ Deleted savings target '{}' and its history", target.name);
    Ok(())
}
