//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Store opening (config, repair, reset-or-abort) and user selection
//! - `status` - Status, doctor, migrate and reset commands
//! - `users` - User profile commands
//! - `ledger` - Expense and income commands
//! - `recurring` - Recurring expense commands
//! - `savings` - Savings target commands
//! - `investments` - Investment commands
//! - `notes` - Note commands
//! - `reports` - Dashboard, monthly analysis and trend commands

pub mod core;
pub mod investments;
pub mod ledger;
pub mod notes;
pub mod recurring;
pub mod reports;
pub mod savings;
pub mod status;
pub mod users;

// Re-export command functions for main.rs
pub use core::*;
pub use investments::*;
pub use ledger::*;
pub use notes::*;
pub use recurring::*;
pub use reports::*;
pub use savings::*;
pub use status::*;
pub use users::*;

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use mealheiro_core::models::DateRange;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a date given as YYYY-MM-DD, DD/MM/YYYY or "today"
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("today") || s.eq_ignore_ascii_case("hoje") {
        return Ok(today());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD or DD/MM/YYYY)", s))
}

/// Parse a YYYY-MM month into its date range
pub fn parse_month(s: &str) -> Result<DateRange> {
    let (year, month) = s
        .trim()
        .split_once('-')
        .with_context(|| format!("Invalid month '{}' (use YYYY-MM)", s))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in '{}'", s))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("Invalid month in '{}'", s))?;
    Ok(DateRange::month(year, month)?)
}

/// Format an amount as euros
pub fn money(amount: f64) -> String {
    format!("{:.2} €", amount)
}

/// Ask a yes/no question; anything but "y" is no
pub fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Fail unless a record belongs to the current user
pub fn ensure_owner(kind: &str, id: i64, owner: Option<i64>, user_id: i64) -> Result<()> {
    match owner {
        Some(owner) if owner == user_id => Ok(()),
        _ => bail!("{} {} not found", kind, id),
    }
}
