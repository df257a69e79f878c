//! Expense and income command implementations

use anyhow::Result;
use mealheiro_core::models::{DateRange, NewExpense, NewIncome};
use mealheiro_core::Database;

use super::{ensure_owner, money, truncate};

pub fn cmd_expenses_add(db: &Database, user_id: i64, expense: NewExpense) -> Result<i64> {
    let id = db.add_expense(user_id, &expense)?;
    println!(
        "✅ Expense recorded (ID: {}): {} │ {} │ {}",
        id,
        expense.date,
        money(expense.amount),
        truncate(expense.description.trim(), 40)
    );
    Ok(id)
}

pub fn cmd_expenses_list(
    db: &Database,
    user_id: i64,
    month: Option<DateRange>,
    limit: usize,
) -> Result<()> {
    let expenses = match month {
        Some(range) => db.list_expenses_in_range(user_id, range)?,
        None => db.recent_expenses(user_id, limit)?,
    };

    if expenses.is_empty() {
        println!("No expenses found. Record one with:");
        println!("  mealheiro expenses add 12.50 \"Almoço\" -c Comida");
        return Ok(());
    }

    println!();
    match month {
        Some(range) => println!("💸 Expenses for {}", range.month_label()),
        None => println!("💸 Recent Expenses"),
    }
    println!("   ─────────────────────────────────────────────────────────────");

    for e in expenses.iter().take(limit) {
        println!(
            "   [{}] {} │ {:>11} │ {:14} │ {}",
            e.id,
            e.date,
            money(e.amount),
            truncate(&e.category, 14),
            truncate(&e.description, 36)
        );
    }

    if let Some(range) = month {
        println!("   ─────────────────────────────────────────────────────────────");
        println!("   Total: {}", money(db.sum_expenses(user_id, range)?));
    }

    Ok(())
}

pub fn cmd_expenses_delete(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let expense = db.get_expense(id)?;
    ensure_owner("Expense", id, expense.as_ref().map(|e| e.user_id), user_id)?;

    db.delete_expense(id)?;
    println!("✅ Deleted expense {}", id);
    Ok(())
}

pub fn cmd_expenses_categories(db: &Database, user_id: i64) -> Result<()> {
    let categories = db.expense_categories(user_id)?;

    if categories.is_empty() {
        println!("No expense categories yet.");
        return Ok(());
    }

    println!();
    println!("🏷️  Expense Categories");
    println!("   ─────────────────────────────");
    for category in categories {
        println!("   {}", category);
    }

    Ok(())
}

pub fn cmd_incomes_add(db: &Database, user_id: i64, income: NewIncome) -> Result<i64> {
    let id = db.add_income(user_id, &income)?;
    println!(
        "✅ Income recorded (ID: {}): {} │ {} │ {}",
        id,
        income.date,
        money(income.amount),
        truncate(income.description.trim(), 40)
    );
    Ok(id)
}

pub fn cmd_incomes_list(
    db: &Database,
    user_id: i64,
    month: Option<DateRange>,
    limit: usize,
) -> Result<()> {
    let incomes = match month {
        Some(range) => db.list_incomes_in_range(user_id, range)?,
        None => db.recent_incomes(user_id, limit)?,
    };

    if incomes.is_empty() {
        println!("No incomes found. Record one with:");
        println!("  mealheiro incomes add 1200 \"Salário\" -c Trabalho");
        return Ok(());
    }

    println!();
    match month {
        Some(range) => println!("💰 Incomes for {}", range.month_label()),
        None => println!("💰 Recent Incomes"),
    }
    println!("   ─────────────────────────────────────────────────────────────");

    for i in incomes.iter().take(limit) {
        println!(
            "   [{}] {} │ {:>11} │ {:14} │ {}",
            i.id,
            i.date,
            money(i.amount),
            truncate(&i.category, 14),
            truncate(&i.description, 36)
        );
    }

    if let Some(range) = month {
        println!("   ─────────────────────────────────────────────────────────────");
        println!("   Total: {}", money(db.sum_incomes(user_id, range)?));
    }

    Ok(())
}

pub fn cmd_incomes_delete(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let income = db.get_income(id)?;
    ensure_owner("Income", id, income.as_ref().map(|i| i.user_id), user_id)?;

    db.delete_income(id)?;
    println!("✅ Deleted income {}", id);
    Ok(())
}
