//! Period aggregates shared by the expense and income ledgers

use std::collections::HashMap;

use chrono::{Datelike, Months};
use rusqlite::{params, Connection};

use super::Table;
use crate::error::Result;
use crate::models::{round_cents, CategoryTotal, DateRange, MonthlyTotal};

/// Total amount for a user inside an inclusive date range
pub(super) fn sum_in_range(
    conn: &Connection,
    table: Table,
    user_id: i64,
    range: DateRange,
) -> Result<f64> {
    let total: f64 = conn.query_row(
        &format!(
            "SELECT COALESCE(SUM(Amount), 0) FROM {} WHERE UserId = ? AND Date BETWEEN ? AND ?",
            table.as_str()
        ),
        params![user_id, range.from.to_string(), range.to.to_string()],
        |row| row.get(0),
    )?;
    Ok(round_cents(total))
}

/// Amount per category inside a range, largest first
pub(super) fn totals_by_category(
    conn: &Connection,
    table: Table,
    user_id: i64,
    range: DateRange,
) -> Result<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT Category, SUM(Amount) as total, COUNT(*) as count
        FROM {}
        WHERE UserId = ? AND Date BETWEEN ? AND ?
        GROUP BY Category
        ORDER BY total DESC, Category
        "#,
        table.as_str()
    ))?;

    let rows = stmt
        .query_map(
            params![user_id, range.from.to_string(), range.to.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(with_percentages(rows))
}

/// Attach each category's share of the grand total
pub(crate) fn with_percentages(rows: Vec<(String, f64, i64)>) -> Vec<CategoryTotal> {
    let grand_total: f64 = rows.iter().map(|(_, amount, _)| amount).sum();
    rows.into_iter()
        .map(|(category, amount, count)| CategoryTotal {
            category,
            amount: round_cents(amount),
            count,
            percentage: if grand_total > 0.0 {
                amount / grand_total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

/// One total per calendar month, oldest first, ending with the month of `today`
///
/// Months without rows are reported as zero.
pub(super) fn monthly_trend(
    conn: &Connection,
    table: Table,
    user_id: i64,
    months: u32,
    today: chrono::NaiveDate,
) -> Result<Vec<MonthlyTotal>> {
    let months = months.max(1);
    let window = DateRange::last_months(today, months);

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT strftime('%Y-%m', Date) as month, SUM(Amount), COUNT(*)
        FROM {}
        WHERE UserId = ? AND Date BETWEEN ? AND ?
        GROUP BY month
        "#,
        table.as_str()
    ))?;

    let found: HashMap<String, (f64, i64)> = stmt
        .query_map(
            params![user_id, window.from.to_string(), window.to.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    (row.get::<_, f64>(1)?, row.get::<_, i64>(2)?),
                ))
            },
        )?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;

    let mut trend = Vec::with_capacity(months as usize);
    for offset in 0..months {
        let Some(first) = window.from.checked_add_months(Months::new(offset)) else {
            break;
        };
        let label = format!("{:04}-{:02}", first.year(), first.month());
        let (amount, count) = found.get(&label).copied().unwrap_or((0.0, 0));
        trend.push(MonthlyTotal {
            year: first.year(),
            month: first.month(),
            label,
            amount: round_cents(amount),
            count,
        });
    }

    Ok(trend)
}

/// Distinct categories a user has recorded, alphabetically
pub(super) fn distinct_categories(
    conn: &Connection,
    table: Table,
    user_id: i64,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT Category FROM {} WHERE UserId = ? ORDER BY Category",
        table.as_str()
    ))?;
    let categories = stmt
        .query_map(params![user_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(categories)
}
