//! Income operations

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::expenses::clean_notes;
use super::{aggregates, format_datetime, parse_date, parse_datetime, Database, Table};
use crate::error::{Error, Result};
use crate::models::{round_cents, CategoryTotal, DateRange, Income, MonthlyTotal, NewIncome};

const INCOME_COLUMNS: &str = "Id, UserId, Description, Amount, Category, Date, Notes, CreatedAt";

fn row_to_income(row: &Row) -> rusqlite::Result<Income> {
    let date: String = row.get(5)?;
    let created_at: String = row.get(7)?;
    Ok(Income {
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

impl Database {
    pub fn add_income(&self, user_id: i64, income: &NewIncome) -> Result<i64> {
        income.validate()?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO Incomes (Description, Amount, Category, Date, Notes, CreatedAt, UserId)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                income.description.trim(),
                round_cents(income.amount),
                income.category.trim(),
                income.date.to_string(),
                clean_notes(income.notes.as_deref()),
                format_datetime(Utc::now()),
                user_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_income(&self, id: i64) -> Result<Option<Income>> {
        let conn = self.conn()?;
        let income = conn
            .query_row(
                &format!("SELECT {} FROM Incomes WHERE Id = ?", INCOME_COLUMNS),
                params![id],
                row_to_income,
            )
            .optional()?;
        Ok(income)
    }

    /// All incomes of a user, newest first
    pub fn list_incomes(&self, user_id: i64) -> Result<Vec<Income>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM Incomes WHERE UserId = ? ORDER BY Date DESC, Id DESC",
            INCOME_COLUMNS
        ))?;
        let incomes = stmt
            .query_map(params![user_id], row_to_income)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(incomes)
    }

    pub fn list_incomes_in_range(&self, user_id: i64, range: DateRange) -> Result<Vec<Income>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM Incomes
            WHERE UserId = ? AND Date BETWEEN ? AND ?
            ORDER BY Date DESC, Id DESC
            "#,
            INCOME_COLUMNS
        ))?;
        let incomes = stmt
            .query_map(
                params![user_id, range.from.to_string(), range.to.to_string()],
                row_to_income,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(incomes)
    }

    pub fn recent_incomes(&self, user_id: i64, limit: usize) -> Result<Vec<Income>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM Incomes WHERE UserId = ? ORDER BY Date DESC, Id DESC LIMIT ?",
            INCOME_COLUMNS
        ))?;
        let incomes = stmt
            .query_map(params![user_id, limit as i64], row_to_income)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(incomes)
    }

    pub fn update_income(&self, id: i64, income: &NewIncome) -> Result<()> {
        income.validate()?;
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE Incomes
            SET Description = ?, Amount = ?, Category = ?, Date = ?, Notes = ?
            WHERE Id = ?
            "#,
            params![
                income.description.trim(),
                round_cents(income.amount),
                income.category.trim(),
                income.date.to_string(),
                clean_notes(income.notes.as_deref()),
                id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("income {}", id)));
        }
        Ok(())
    }

    pub fn delete_income(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM Incomes WHERE Id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("income {}", id)));
        }
        Ok(())
    }

    pub fn sum_incomes(&self, user_id: i64, range: DateRange) -> Result<f64> {
        let conn = self.conn()?;
        aggregates::sum_in_range(&conn, Table::Incomes, user_id, range)
    }

    pub fn incomes_by_category(&self, user_id: i64, range: DateRange) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;
        aggregates::totals_by_category(&conn, Table::Incomes, user_id, range)
    }

    pub fn income_trend(
        &self,
        user_id: i64,
        months: u32,
        today: NaiveDate,
    ) -> Result<Vec<MonthlyTotal>> {
        let conn = self.conn()?;
        aggregates::monthly_trend(&conn, Table::Incomes, user_id, months, today)
    }

    pub fn income_categories(&self, user_id: i64) -> Result<Vec<String>> {
        let conn = self.conn()?;
        aggregates::distinct_categories(&conn, Table::Incomes, user_id)
    }
}
