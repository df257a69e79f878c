//! View aggregation
//!
//! Views assemble service results into display-ready summaries. They keep no
//! state and touch the store only through `Database` service calls.
//!
//! Expense and savings failures propagate. Incomes, investments and recurring
//! expenses are optional sources: when one fails the view logs a warning and
//! carries on with zero or empty data.

use serde::Serialize;
use tracing::warn;

use crate::db::Database;
use crate::error::Result;
use crate::models::round_cents;

mod analysis;
mod charts;
mod dashboard;

pub use analysis::MonthlyAnalysis;
pub use charts::{
    category_series, income_expense_series, savings_progress_series, ChartPoint, ChartSeries,
    Charts,
};
pub use dashboard::Dashboard;

/// Change of one figure between two consecutive months
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthOverMonth {
    pub previous: f64,
    pub current: f64,
    pub change: f64,
    /// Relative change; 0 when the previous month was zero
    pub change_percentage: f64,
}

impl MonthOverMonth {
    pub fn new(previous: f64, current: f64) -> Self {
        let change = round_cents(current - previous);
        Self {
            previous,
            current,
            change,
            change_percentage: if previous > 0.0 {
                change / previous * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Share of income left after expenses, as a percentage
///
/// Zero when there was no income.
pub fn savings_rate(income: f64, expenses: f64) -> f64 {
    if income > 0.0 {
        (income - expenses) / income * 100.0
    } else {
        0.0
    }
}

/// Unwrap an optional source, substituting the default on failure
pub(crate) fn degrade<T: Default>(source: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(source, error = %e, "Aggregate unavailable, using empty value");
            T::default()
        }
    }
}

/// Run a blocking view build on tokio's blocking pool
pub async fn run_blocking<T, F>(db: &Database, build: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || build(&db)).await?
}
