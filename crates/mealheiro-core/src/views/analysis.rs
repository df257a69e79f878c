//! Analysis of one calendar month against the month before

use chrono::NaiveDate;
use serde::Serialize;

use super::{degrade, run_blocking, savings_rate, MonthOverMonth};
use crate::db::Database;
use crate::error::Result;
use crate::models::{round_cents, CategoryTotal, DateRange, Expense};

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyAnalysis {
    pub user_id: i64,
    pub range: DateRange,
    pub label: String,
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub savings_rate: f64,
    pub expense_categories: Vec<CategoryTotal>,
    pub income_categories: Vec<CategoryTotal>,
    pub expense_count: usize,
    pub largest_expense: Option<Expense>,
    /// Days the average is taken over (elapsed days for the current month)
    pub days_counted: i64,
    pub daily_average: f64,
    pub expense_change: MonthOverMonth,
    pub income_change: MonthOverMonth,
}

/// Days of `range` that have passed by `today`, both ends included
fn elapsed_days(range: DateRange, today: NaiveDate) -> i64 {
    if today < range.from {
        0
    } else if range.contains(today) {
        (today - range.from).num_days() + 1
    } else {
        range.days()
    }
}

impl MonthlyAnalysis {
    pub fn build(
        db: &Database,
        user_id: i64,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<Self> {
        let range = DateRange::month(year, month)?;
        let previous = range.previous_month();

        let expenses = db.list_expenses_in_range(user_id, range)?;
        let total_expenses = db.sum_expenses(user_id, range)?;
        let previous_expenses = db.sum_expenses(user_id, previous)?;
        let total_income = degrade("incomes", db.sum_incomes(user_id, range));
        let previous_income = degrade("incomes", db.sum_incomes(user_id, previous));

        let days_counted = elapsed_days(range, today);
        let daily_average = if days_counted > 0 {
            round_cents(total_expenses / days_counted as f64)
        } else {
            0.0
        };

        let largest_expense = expenses
            .iter()
            .fold(None::<&Expense>, |best, e| match best {
                Some(b) if b.amount >= e.amount => Some(b),
                _ => Some(e),
            })
            .cloned();

        Ok(Self {
            user_id,
            range,
            label: range.month_label(),
            total_income,
            total_expenses,
            balance: round_cents(total_income - total_expenses),
            savings_rate: savings_rate(total_income, total_expenses),
            expense_categories: db.expenses_by_category(user_id, range)?,
            income_categories: degrade("incomes", db.incomes_by_category(user_id, range)),
            expense_count: expenses.len(),
            largest_expense,
            days_counted,
            daily_average,
            expense_change: MonthOverMonth::new(previous_expenses, total_expenses),
            income_change: MonthOverMonth::new(previous_income, total_income),
        })
    }

    /// Build on the blocking pool
    pub async fn load(
        db: &Database,
        user_id: i64,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<Self> {
        run_blocking(db, move |db| Self::build(db, user_id, year, month, today)).await
    }
}
