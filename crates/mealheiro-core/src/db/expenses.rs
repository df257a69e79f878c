//! Expense operations

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{aggregates, format_datetime, parse_date, parse_datetime, Database, Table};
use crate::error::{Error, Result};
use crate::models::{round_cents, CategoryTotal, DateRange, Expense, MonthlyTotal, NewExpense};

const EXPENSE_COLUMNS: &str = "Id, UserId, Description, Amount, Category, Date, Notes, CreatedAt";

fn row_to_expense(row: &Row) -> rusqlite::Result<Expense> {
    let date: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        date: parse_date(&date)?,
        notes: row.get(6)?,
        created_at: parse_datetime(&created_at),
    })
}

/// Blank notes are stored as NULL
pub(super) fn clean_notes(notes: Option<&str>) -> Option<&str> {
    notes.map(str::trim).filter(|n| !n.is_empty())
}

impl Database {
    pub fn add_expense(&self, user_id: i64, expense: &NewExpense) -> Result<i64> {
        expense.validate()?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO Expenses (Description, Amount, Category, Date, Notes, CreatedAt, UserId)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                expense.description.trim(),
                round_cents(expense.amount),
                expense.category.trim(),
                expense.date.to_string(),
                clean_notes(expense.notes.as_deref()),
                format_datetime(Utc::now()),
                user_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!("SELECT {} FROM Expenses WHERE Id = ?", EXPENSE_COLUMNS),
                params![id],
                row_to_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// All expenses of a user, newest first
    pub fn list_expenses(&self, user_id: i64) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM Expenses WHERE UserId = ? ORDER BY Date DESC, Id DESC",
            EXPENSE_COLUMNS
        ))?;
        let expenses = stmt
            .query_map(params![user_id], row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    pub fn list_expenses_in_range(&self, user_id: i64, range: DateRange) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM Expenses
            WHERE UserId = ? AND Date BETWEEN ? AND ?
            ORDER BY Date DESC, Id DESC
            "#,
            EXPENSE_COLUMNS
        ))?;
        let expenses = stmt
            .query_map(
                params![user_id, range.from.to_string(), range.to.to_string()],
                row_to_expense,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    /// The `limit` most recent expenses
    pub fn recent_expenses(&self, user_id: i64, limit: usize) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM Expenses WHERE UserId = ? ORDER BY Date DESC, Id DESC LIMIT ?",
            EXPENSE_COLUMNS
        ))?;
        let expenses = stmt
            .query_map(params![user_id, limit as i64], row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    pub fn update_expense(&self, id: i64, expense: &NewExpense) -> Result<()> {
        expense.validate()?;
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE Expenses
            SET Description = ?, Amount = ?, Category = ?, Date = ?, Notes = ?
            WHERE Id = ?
            "#,
            params![
                expense.description.trim(),
                round_cents(expense.amount),
                expense.category.trim(),
                expense.date.to_string(),
                clean_notes(expense.notes.as_deref()),
                id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("expense {}", id)));
        }
        Ok(())
    }

    pub fn delete_expense(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM Expenses WHERE Id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("expense {}", id)));
        }
        Ok(())
    }

    /// Total spent inside an inclusive date range
    pub fn sum_expenses(&self, user_id: i64, range: DateRange) -> Result<f64> {
        let conn = self.conn()?;
        aggregates::sum_in_range(&conn, Table::Expenses, user_id, range)
    }

    pub fn expenses_by_category(&self, user_id: i64, range: DateRange) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;
        aggregates::totals_by_category(&conn, Table::Expenses, user_id, range)
    }

    /// Monthly spending for the last `months` months, oldest first
    pub fn expense_trend(
        &self,
        user_id: i64,
        months: u32,
        today: NaiveDate,
    ) -> Result<Vec<MonthlyTotal>> {
        let conn = self.conn()?;
        aggregates::monthly_trend(&conn, Table::Expenses, user_id, months, today)
    }

    pub fn expense_categories(&self, user_id: i64) -> Result<Vec<String>> {
        let conn = self.conn()?;
        aggregates::distinct_categories(&conn, Table::Expenses, user_id)
    }
}
