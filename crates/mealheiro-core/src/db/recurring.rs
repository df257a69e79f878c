//! Recurring expense operations
//!
//! Every query here goes through `with_recurring_repair`: when a query fails
//! and the table does not answer a count, the migration runs once and the
//! query is retried once.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::warn;

use super::expenses::clean_notes;
use super::{format_datetime, parse_date, parse_datetime, parse_optional_date, Database, Table};
use crate::error::{Error, Result};
use crate::models::{
    round_cents, Frequency, NewRecurringExpense, RecurringExpense, UpcomingPayment,
};

const RECURRING_COLUMNS: &str = "Id, UserId, Description, Amount, Category, Frequency, StartDate, EndDate, LastProcessed, Notes, IsActive, CreatedAt";

fn row_to_recurring(row: &Row) -> rusqlite::Result<RecurringExpense> {
    let frequency: String = row.get(5)?;
    let start_date: String = row.get(6)?;
    let created_at: String = row.get(11)?;
    Ok(RecurringExpense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        frequency: Frequency::parse_or_monthly(&frequency),
        start_date: parse_date(&start_date)?,
        end_date: parse_optional_date(row.get(7)?),
        last_processed: parse_optional_date(row.get(8)?),
        notes: row.get(9)?,
        is_active: row.get(10)?,
        created_at: parse_datetime(&created_at),
    })
}

fn query_recurring(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<RecurringExpense>> {
    let mut stmt = conn.prepare(sql)?;
    let items = stmt
        .query_map(params, row_to_recurring)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

impl Database {
    /// Run `op`, repairing RecurringExpenses and retrying once when the table is broken
    ///
    /// Errors from a healthy table (constraint failures and the like) are returned as is.
    pub(super) fn with_recurring_repair<T>(&self, op: impl Fn(&Connection) -> Result<T>) -> Result<T> {
        let first = {
            let conn = self.conn()?;
            op(&*conn)
        };

        match first {
            Err(Error::Database(e)) => {
                if self.probe_table(Table::RecurringExpenses).is_ok() {
                    return Err(Error::Database(e));
                }
                warn!(error = %e, "RecurringExpenses query failed, repairing and retrying");
                if !self.migrate_recurring_expense_table()? {
                    return Err(Error::Database(e));
                }
                let conn = self.conn()?;
                op(&*conn)
            }
            other => other,
        }
    }

    pub fn add_recurring_expense(&self, user_id: i64, item: &NewRecurringExpense) -> Result<i64> {
        item.validate()?;
        self.with_recurring_repair(|conn| {
            conn.execute(
                r#"
                INSERT INTO RecurringExpenses
                    (Description, Amount, Category, Frequency, StartDate, EndDate, Notes, CreatedAt, IsActive, UserId)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
                "#,
                params![
                    item.description.trim(),
                    round_cents(item.amount),
                    item.category.trim(),
                    item.frequency.as_str(),
                    item.start_date.to_string(),
                    item.end_date.map(|d| d.to_string()),
                    clean_notes(item.notes.as_deref()),
                    format_datetime(Utc::now()),
                    user_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_recurring_expense(&self, id: i64) -> Result<Option<RecurringExpense>> {
        self.with_recurring_repair(|conn| {
            let item = conn
                .query_row(
                    &format!("SELECT {} FROM RecurringExpenses WHERE Id = ?", RECURRING_COLUMNS),
                    params![id],
                    row_to_recurring,
                )
                .optional()?;
            Ok(item)
        })
    }

    /// Recurring expenses of a user, active first, then by start date
    pub fn list_recurring_expenses(
        &self,
        user_id: i64,
        active_only: bool,
    ) -> Result<Vec<RecurringExpense>> {
        let sql = format!(
            r#"
            SELECT {} FROM RecurringExpenses
            WHERE UserId = ? {}
            ORDER BY IsActive DESC, StartDate, Id
            "#,
            RECURRING_COLUMNS,
            if active_only { "AND IsActive = 1" } else { "" }
        );
        self.with_recurring_repair(|conn| query_recurring(conn, &sql, params![user_id]))
    }

    pub fn update_recurring_expense(&self, id: i64, item: &NewRecurringExpense) -> Result<()> {
        item.validate()?;
        let updated = self.with_recurring_repair(|conn| {
            Ok(conn.execute(
                r#"
                UPDATE RecurringExpenses
                SET Description = ?, Amount = ?, Category = ?, Frequency = ?,
                    StartDate = ?, EndDate = ?, Notes = ?
                WHERE Id = ?
                "#,
                params![
                    item.description.trim(),
                    round_cents(item.amount),
                    item.category.trim(),
                    item.frequency.as_str(),
                    item.start_date.to_string(),
                    item.end_date.map(|d| d.to_string()),
                    clean_notes(item.notes.as_deref()),
                    id,
                ],
            )?)
        })?;
        if updated == 0 {
            return Err(Error::NotFound(format!("recurring expense {}", id)));
        }
        Ok(())
    }

    /// Pause or resume a recurring expense
    pub fn set_recurring_active(&self, id: i64, active: bool) -> Result<()> {
        let updated = self.with_recurring_repair(|conn| {
            Ok(conn.execute(
                "UPDATE RecurringExpenses SET IsActive = ? WHERE Id = ?",
                params![active, id],
            )?)
        })?;
        if updated == 0 {
            return Err(Error::NotFound(format!("recurring expense {}", id)));
        }
        Ok(())
    }

    pub fn delete_recurring_expense(&self, id: i64) -> Result<()> {
        let deleted = self.with_recurring_repair(|conn| {
            Ok(conn.execute("DELETE FROM RecurringExpenses WHERE Id = ?", params![id])?)
        })?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("recurring expense {}", id)));
        }
        Ok(())
    }

    /// Active recurring expenses due within `days` of `today`, soonest first
    pub fn upcoming_recurring(
        &self,
        user_id: i64,
        today: NaiveDate,
        days: i64,
    ) -> Result<Vec<UpcomingPayment>> {
        let mut upcoming: Vec<UpcomingPayment> = self
            .list_recurring_expenses(user_id, true)?
            .into_iter()
            .filter_map(|item| {
                let due = item.next_occurrence(today)?;
                let days_until = (due - today).num_days();
                (days_until <= days).then(|| UpcomingPayment {
                    recurring_id: item.id,
                    description: item.description,
                    category: item.category,
                    amount: item.amount,
                    frequency: item.frequency,
                    due,
                    days_until,
                })
            })
            .collect();

        upcoming.sort_by(|a, b| a.due.cmp(&b.due).then(a.recurring_id.cmp(&b.recurring_id)));
        Ok(upcoming)
    }

    /// Monthly cost of every active recurring expense still running on `today`
    pub fn monthly_recurring_commitment(&self, user_id: i64, today: NaiveDate) -> Result<f64> {
        let total: f64 = self
            .list_recurring_expenses(user_id, true)?
            .iter()
            .filter(|item| item.next_occurrence(today).is_some())
            .map(RecurringExpense::monthly_equivalent)
            .sum();
        Ok(round_cents(total))
    }
}
