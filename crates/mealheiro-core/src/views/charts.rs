//! Chart series
//!
//! Series carry plain labels and values. Rendering is up to the front end.

use chrono::NaiveDate;
use serde::Serialize;

use super::{degrade, run_blocking};
use crate::db::Database;
use crate::error::Result;
use crate::models::{round_cents, DateRange, MonthlyTotal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    fn new(name: &str, points: Vec<ChartPoint>) -> Self {
        Self {
            name: name.to_string(),
            points,
        }
    }

    pub fn total(&self) -> f64 {
        round_cents(self.points.iter().map(|p| p.value).sum())
    }
}

fn trend_points(trend: &[MonthlyTotal]) -> Vec<ChartPoint> {
    trend
        .iter()
        .map(|m| ChartPoint {
            label: m.label.clone(),
            value: m.amount,
        })
        .collect()
}

/// Income, expense and balance per month for the last `months` months
pub fn income_expense_series(
    db: &Database,
    user_id: i64,
    months: u32,
    today: NaiveDate,
) -> Result<Vec<ChartSeries>> {
    let expenses = db.expense_trend(user_id, months, today)?;
    let incomes = degrade("incomes", db.income_trend(user_id, months, today));

    let income_points: Vec<ChartPoint> = expenses
        .iter()
        .map(|month| ChartPoint {
            label: month.label.clone(),
            value: incomes
                .iter()
                .find(|i| i.label == month.label)
                .map(|i| i.amount)
                .unwrap_or(0.0),
        })
        .collect();

    let balance_points: Vec<ChartPoint> = income_points
        .iter()
        .zip(&expenses)
        .map(|(income, expense)| ChartPoint {
            label: income.label.clone(),
            value: round_cents(income.value - expense.amount),
        })
        .collect();

    Ok(vec![
        ChartSeries::new("Income", income_points),
        ChartSeries::new("Expenses", trend_points(&expenses)),
        ChartSeries::new("Balance", balance_points),
    ])
}

/// Spending per category inside a range, largest first
pub fn category_series(db: &Database, user_id: i64, range: DateRange) -> Result<ChartSeries> {
    let points = db
        .expenses_by_category(user_id, range)?
        .into_iter()
        .map(|c| ChartPoint {
            label: c.category,
            value: c.amount,
        })
        .collect();
    Ok(ChartSeries::new("Expenses by category", points))
}

/// Progress percentage of each savings target
pub fn savings_progress_series(db: &Database, user_id: i64) -> Result<ChartSeries> {
    let points = db
        .list_savings_targets(user_id)?
        .iter()
        .map(|t| ChartPoint {
            label: t.name.clone(),
            value: t.progress_percentage(),
        })
        .collect();
    Ok(ChartSeries::new("Savings progress", points))
}

/// Every chart for one user
#[derive(Debug, Clone, Serialize)]
pub struct Charts {
    pub income_expense: Vec<ChartSeries>,
    /// Spending per category in the month containing `today`
    pub categories: ChartSeries,
    pub savings: ChartSeries,
}

impl Charts {
    pub fn build(db: &Database, user_id: i64, months: u32, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            income_expense: income_expense_series(db, user_id, months, today)?,
            categories: category_series(db, user_id, DateRange::containing(today))?,
            savings: savings_progress_series(db, user_id)?,
        })
    }

    pub async fn load(db: &Database, user_id: i64, months: u32, today: NaiveDate) -> Result<Self> {
        run_blocking(db, move |db| Self::build(db, user_id, months, today)).await
    }
}
