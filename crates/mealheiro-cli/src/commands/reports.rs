//! Report command implementations (dashboard, analysis, trend)

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use mealheiro_core::models::DateRange;
use mealheiro_core::views::MonthOverMonth;
use mealheiro_core::{Charts, Dashboard, DashboardConfig, Database, MonthlyAnalysis};

use super::{money, truncate};

fn change_line(label: &str, change: &MonthOverMonth) -> String {
    if change.previous > 0.0 {
        format!(
            "{} {:+.2} ({:+.1}%) vs last month",
            label, change.change, change.change_percentage
        )
    } else {
        format!("{} {:+.2} vs last month", label, change.change)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize report")?
    );
    Ok(())
}

pub async fn cmd_dashboard(
    db: &Database,
    user_id: i64,
    today: NaiveDate,
    config: &DashboardConfig,
    json: bool,
) -> Result<()> {
    let dash = Dashboard::load(db, user_id, today, config.clone()).await?;

    if json {
        return print_json(&dash);
    }

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│         🐷 Mealheiro Dashboard          │");
    println!("╰─────────────────────────────────────────╯");
    println!("  Month: {}", dash.month.month_label());
    println!();
    println!("  Income:          {:>12}", money(dash.total_income));
    println!("  Expenses:        {:>12}", money(dash.total_expenses));
    println!("  Balance:         {:>12}", money(dash.balance));
    println!("  Savings rate:    {:>11.1}%", dash.savings_rate);
    println!("  {}", change_line("Expenses", &dash.expense_change));
    println!("  {}", change_line("Income", &dash.income_change));

    if !dash.top_categories.is_empty() {
        println!();
        println!("  🏷️  Top categories");
        for c in &dash.top_categories {
            println!(
                "     {:16} {:>12} {:5.1}%",
                truncate(&c.category, 16),
                money(c.amount),
                c.percentage
            );
        }
    }

    if !dash.recent_expenses.is_empty() {
        println!();
        println!("  💸 Recent expenses");
        for e in &dash.recent_expenses {
            println!(
                "     {} {:>12}  {}",
                e.date,
                money(e.amount),
                truncate(&e.description, 30)
            );
        }
    }

    println!();
    println!(
        "  🐷 Savings: {} of {} ({:.1}%)",
        money(dash.savings.total_saved),
        money(dash.savings.total_target),
        dash.savings.overall_progress
    );
    if dash.portfolio.investment_count > 0 {
        println!(
            "  📈 Portfolio: {} ({:+.2})",
            money(dash.portfolio.current_value),
            dash.portfolio.profit_loss
        );
    }
    println!(
        "  🔁 Recurring: {}/month",
        money(dash.recurring_commitment)
    );

    if !dash.upcoming.is_empty() {
        println!();
        println!("  📅 Coming up");
        for p in &dash.upcoming {
            println!(
                "     {} {:>12}  {}",
                p.due,
                money(p.amount),
                truncate(&p.description, 30)
            );
        }
    }
    println!();

    Ok(())
}

pub async fn cmd_analysis(
    db: &Database,
    user_id: i64,
    month: Option<DateRange>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let range = month.unwrap_or_else(|| DateRange::containing(today));
    let analysis = MonthlyAnalysis::load(
        db,
        user_id,
        range.from.year(),
        range.from.month(),
        today,
    )
    .await?;

    if json {
        return print_json(&analysis);
    }

    println!();
    println!("📊 Monthly Analysis: {}", analysis.label);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Income:        {:>12}", money(analysis.total_income));
    println!(
        "   Expenses:      {:>12}  ({} entries)",
        money(analysis.total_expenses),
        analysis.expense_count
    );
    println!("   Balance:       {:>12}", money(analysis.balance));
    println!("   Savings rate:  {:>11.1}%", analysis.savings_rate);
    println!(
        "   Daily average: {:>12}  (over {} days)",
        money(analysis.daily_average),
        analysis.days_counted
    );
    println!("   {}", change_line("Expenses", &analysis.expense_change));
    println!("   {}", change_line("Income", &analysis.income_change));

    if let Some(largest) = &analysis.largest_expense {
        println!(
            "   Largest expense: {} on {} ({})",
            money(largest.amount),
            largest.date,
            truncate(&largest.description, 30)
        );
    }

    if !analysis.expense_categories.is_empty() {
        println!();
        println!("   Expenses by category");
        for c in &analysis.expense_categories {
            let bar = "█".repeat((c.percentage / 5.0).round() as usize);
            println!(
                "     {:16} {:>12} {:5.1}% {}",
                truncate(&c.category, 16),
                money(c.amount),
                c.percentage,
                bar
            );
        }
    }

    if !analysis.income_categories.is_empty() {
        println!();
        println!("   Income by category");
        for c in &analysis.income_categories {
            println!(
                "     {:16} {:>12} {:5.1}%",
                truncate(&c.category, 16),
                money(c.amount),
                c.percentage
            );
        }
    }
    println!();

    Ok(())
}

pub async fn cmd_trend(
    db: &Database,
    user_id: i64,
    months: u32,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let months = months.max(1);
    let series = Charts::load(db, user_id, months, today).await?.income_expense;

    if json {
        return print_json(&series);
    }

    println!();
    println!("📈 Last {} months", months);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:8} │ {:>12} │ {:>12} │ {:>12}", "Month", "Income", "Expenses", "Balance");

    if let [income, expenses, balance] = series.as_slice() {
        for ((i, e), b) in income.points.iter().zip(&expenses.points).zip(&balance.points) {
            println!(
                "   {:8} │ {:>12} │ {:>12} │ {:>12}",
                i.label,
                money(i.value),
                money(e.value),
                money(b.value)
            );
        }
        println!("   ─────────────────────────────────────────────────────────────");
        println!(
            "   {:8} │ {:>12} │ {:>12} │ {:>12}",
            "Total",
            money(income.total()),
            money(expenses.total()),
            money(balance.total())
        );
    }
    println!();

    Ok(())
}
