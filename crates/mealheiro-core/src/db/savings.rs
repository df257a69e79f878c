//! Savings target operations
//!
//! Every change to a target's current amount appends one row to
//! SavingsUpdateHistories inside the same transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_datetime, parse_date, parse_datetime, parse_optional_date, Database};
use crate::error::{Error, Result};
use crate::models::{
    round_cents, NewSavingsTarget, SavingsChange, SavingsSummary, SavingsTarget, SavingsUpdate,
};

const TARGET_COLUMNS: &str = "Id, UserId, Name, Description, TargetAmount, CurrentAmount, Category, StartDate, EndDate, IsCompleted, CompletedAt, CreatedAt";

const MAX_NOTE_LEN: usize = 200;

fn row_to_target(row: &Row) -> rusqlite::Result<SavingsTarget> {
    let start_date: String = row.get(7)?;
    let completed_at: Option<String> = row.get(10)?;
    let created_at: String = row.get(11)?;
    Ok(SavingsTarget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        target_amount: row.get(4)?,
        current_amount: row.get(5)?,
        category: row.get(6)?,
        start_date: parse_date(&start_date)?,
        end_date: parse_optional_date(row.get(8)?),
        is_completed: row.get(9)?,
        completed_at: completed_at.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&created_at),
    })
}

fn load_target(conn: &Connection, id: i64) -> Result<Option<SavingsTarget>> {
    let target = conn
        .query_row(
            &format!("SELECT {} FROM SavingsTargets WHERE Id = ?", TARGET_COLUMNS),
            params![id],
            row_to_target,
        )
        .optional()?;
    Ok(target)
}

fn clean_note(note: Option<&str>) -> Result<Option<&str>> {
    let note = note.map(str::trim).filter(|n| !n.is_empty());
    if let Some(n) = note {
        if n.chars().count() > MAX_NOTE_LEN {
            return Err(Error::InvalidData(format!(
                "Note must be at most {} characters",
                MAX_NOTE_LEN
            )));
        }
    }
    Ok(note)
}

fn record_change(
    conn: &Connection,
    target: &SavingsTarget,
    change: &SavingsChange,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        r#"
        UPDATE SavingsTargets
        SET CurrentAmount = ?, IsCompleted = ?, CompletedAt = ?
        WHERE Id = ?
        "#,
        params![
            target.current_amount,
            target.is_completed,
            target.completed_at.map(format_datetime),
            target.id,
        ],
    )?;
    conn.execute(
        r#"
        INSERT INTO SavingsUpdateHistories (SavingsTargetId, AmountAdded, PreviousAmount, NewAmount, Note, UpdatedAt)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
        params![
            target.id,
            change.amount_added,
            change.previous_amount,
            change.new_amount,
            note,
            format_datetime(now),
        ],
    )?;
    Ok(())
}

impl Database {
    /// Create a target; a non-zero initial amount is recorded as the first update
    pub fn create_savings_target(&self, user_id: i64, target: &NewSavingsTarget) -> Result<i64> {
        target.validate()?;
        let now = Utc::now();
        let conn = self.conn()?;

        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            conn.execute(
                r#"
                INSERT INTO SavingsTargets
                    (Name, Description, TargetAmount, CurrentAmount, Category, StartDate, EndDate, IsCompleted, CompletedAt, CreatedAt, UserId)
                VALUES (?, ?, ?, 0, ?, ?, ?, 0, NULL, ?, ?)
                "#,
                params![
                    target.name.trim(),
                    target.description.as_deref().map(str::trim),
                    round_cents(target.target_amount),
                    target.category.as_deref().map(str::trim),
                    target.start_date.to_string(),
                    target.end_date.map(|d| d.to_string()),
                    format_datetime(now),
                    user_id,
                ],
            )?;
            let id = conn.last_insert_rowid();

            if target.initial_amount > 0.0 {
                let mut stored = load_target(&conn, id)?
                    .ok_or_else(|| Error::NotFound(format!("savings target {}", id)))?;
                let change = stored.apply_amount(target.initial_amount, now);
                record_change(&conn, &stored, &change, Some("Initial amount"), now)?;
            }

            Ok(id)
        })();

        match result {
            Ok(id) => {
                conn.execute("COMMIT", [])?;
                Ok(id)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    pub fn get_savings_target(&self, id: i64) -> Result<Option<SavingsTarget>> {
        let conn = self.conn()?;
        load_target(&conn, id)
    }

    /// Targets of a user: open ones first, earliest deadline first
    pub fn list_savings_targets(&self, user_id: i64) -> Result<Vec<SavingsTarget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM SavingsTargets
            WHERE UserId = ?
            ORDER BY IsCompleted, EndDate IS NULL, EndDate, Id
            "#,
            TARGET_COLUMNS
        ))?;
        let targets = stmt
            .query_map(params![user_id], row_to_target)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(targets)
    }

    /// Edit a target's details; completion is re-evaluated against the new target
    ///
    /// The current amount is left alone (`initial_amount` is ignored).
    pub fn update_savings_target(&self, id: i64, edit: &NewSavingsTarget) -> Result<()> {
        edit.validate()?;
        let conn = self.conn()?;
        let mut target =
            load_target(&conn, id)?.ok_or_else(|| Error::NotFound(format!("savings target {}", id)))?;

        target.target_amount = round_cents(edit.target_amount);
        target.recompute_completion(Utc::now());

        conn.execute(
            r#"
            UPDATE SavingsTargets
            SET Name = ?, Description = ?, TargetAmount = ?, Category = ?, StartDate = ?, EndDate = ?,
                IsCompleted = ?, CompletedAt = ?
            WHERE Id = ?
            "#,
            params![
                edit.name.trim(),
                edit.description.as_deref().map(str::trim),
                target.target_amount,
                edit.category.as_deref().map(str::trim),
                edit.start_date.to_string(),
                edit.end_date.map(|d| d.to_string()),
                target.is_completed,
                target.completed_at.map(format_datetime),
                id,
            ],
        )?;
        Ok(())
    }

    /// Add (or, when negative, withdraw) an amount; the balance never goes below zero
    pub fn add_to_savings_target(
        &self,
        id: i64,
        amount: f64,
        note: Option<&str>,
    ) -> Result<SavingsChange> {
        if !amount.is_finite() {
            return Err(Error::InvalidData("Amount must be a number".to_string()));
        }
        self.change_savings_amount(id, note, |current| current + amount)
    }

    /// Set the current amount outright, clamped at zero
    pub fn set_savings_amount(
        &self,
        id: i64,
        amount: f64,
        note: Option<&str>,
    ) -> Result<SavingsChange> {
        if !amount.is_finite() {
            return Err(Error::InvalidData("Amount must be a number".to_string()));
        }
        self.change_savings_amount(id, note, |_| amount)
    }

    fn change_savings_amount(
        &self,
        id: i64,
        note: Option<&str>,
        new_amount: impl FnOnce(f64) -> f64,
    ) -> Result<SavingsChange> {
        let note = clean_note(note)?;
        let now = Utc::now();
        let conn = self.conn()?;

        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            let mut target = load_target(&conn, id)?
                .ok_or_else(|| Error::NotFound(format!("savings target {}", id)))?;
            let requested = new_amount(target.current_amount);
            let change = target.apply_amount(requested, now);
            record_change(&conn, &target, &change, note, now)?;
            Ok(change)
        })();

        match result {
            Ok(change) => {
                conn.execute("COMMIT", [])?;
                Ok(change)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    /// Update ledger of a target, newest first
    pub fn savings_history(&self, target_id: i64) -> Result<Vec<SavingsUpdate>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT Id, SavingsTargetId, AmountAdded, PreviousAmount, NewAmount, Note, UpdatedAt
            FROM SavingsUpdateHistories
            WHERE SavingsTargetId = ?
            ORDER BY UpdatedAt DESC, Id DESC
            "#,
        )?;
        let history = stmt
            .query_map(params![target_id], |row| {
                let updated_at: String = row.get(6)?;
                Ok(SavingsUpdate {
                    id: row.get(0)?,
                    savings_target_id: row.get(1)?,
                    amount_added: row.get(2)?,
                    previous_amount: row.get(3)?,
                    new_amount: row.get(4)?,
                    note: row.get(5)?,
                    updated_at: parse_datetime(&updated_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(history)
    }

    /// Delete a target together with its history
    pub fn delete_savings_target(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM SavingsTargets WHERE Id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("savings target {}", id)));
        }
        Ok(())
    }

    pub fn savings_summary(&self, user_id: i64) -> Result<SavingsSummary> {
        let conn = self.conn()?;
        let (target_count, completed_count, total_saved, total_target): (i64, i64, f64, f64) = conn
            .query_row(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(IsCompleted), 0),
                       COALESCE(SUM(CurrentAmount), 0),
                       COALESCE(SUM(TargetAmount), 0)
                FROM SavingsTargets
                WHERE UserId = ?
                "#,
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let overall_progress = if total_target > 0.0 {
            (total_saved / total_target * 100.0).min(100.0)
        } else {
            0.0
        };

        Ok(SavingsSummary {
            target_count,
            completed_count,
            total_saved: round_cents(total_saved),
            total_target: round_cents(total_target),
            overall_progress,
        })
    }
}
