//! Investment operations

use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::aggregates::with_percentages;
use super::expenses::clean_notes;
use super::{format_datetime, parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{round_cents, Investment, NewInvestment, PortfolioSummary};

const INVESTMENT_COLUMNS: &str = "Id, UserId, Name, Symbol, InvestmentType, Quantity, PurchasePrice, CurrentPrice, Amount, Currency, PurchaseDate, Notes, CreatedAt, LastUpdated";

fn row_to_investment(row: &Row) -> rusqlite::Result<Investment> {
    let investment_type: String = row.get(4)?;
    let purchase_date: String = row.get(10)?;
    let created_at: String = row.get(12)?;
    let last_updated: Option<String> = row.get(13)?;
    Ok(Investment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        symbol: row.get(3)?,
        investment_type: investment_type.parse().unwrap_or_default(),
        quantity: row.get(5)?,
        purchase_price: row.get(6)?,
        current_price: row.get(7)?,
        amount: row.get(8)?,
        currency: row.get(9)?,
        purchase_date: parse_date(&purchase_date)?,
        notes: row.get(11)?,
        created_at: parse_datetime(&created_at),
        last_updated: last_updated.map(|s| parse_datetime(&s)),
    })
}

impl Database {
    pub fn add_investment(&self, user_id: i64, investment: &NewInvestment) -> Result<i64> {
        investment.validate()?;
        let now = format_datetime(Utc::now());
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO Investments
                (Name, Symbol, InvestmentType, Quantity, PurchasePrice, CurrentPrice, Amount, Currency, PurchaseDate, Notes, CreatedAt, LastUpdated, UserId)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                investment.name.trim(),
                investment.symbol.as_deref().map(|s| s.trim().to_uppercase()),
                investment.investment_type.as_str(),
                investment.quantity,
                round_cents(investment.purchase_price),
                investment.current_price.map(round_cents),
                investment.invested_amount(),
                investment.currency.to_uppercase(),
                investment.purchase_date.to_string(),
                clean_notes(investment.notes.as_deref()),
                now,
                investment.current_price.map(|_| now.clone()),
                user_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_investment(&self, id: i64) -> Result<Option<Investment>> {
        let conn = self.conn()?;
        let investment = conn
            .query_row(
                &format!("SELECT {} FROM Investments WHERE Id = ?", INVESTMENT_COLUMNS),
                params![id],
                row_to_investment,
            )
            .optional()?;
        Ok(investment)
    }

    pub fn list_investments(&self, user_id: i64) -> Result<Vec<Investment>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM Investments WHERE UserId = ? ORDER BY InvestmentType, Name, Id",
            INVESTMENT_COLUMNS
        ))?;
        let investments = stmt
            .query_map(params![user_id], row_to_investment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(investments)
    }

    /// Replace an investment's details; the invested amount is recomputed
    pub fn update_investment(&self, id: i64, investment: &NewInvestment) -> Result<()> {
        investment.validate()?;
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE Investments
            SET Name = ?, Symbol = ?, InvestmentType = ?, Quantity = ?, PurchasePrice = ?,
                CurrentPrice = ?, Amount = ?, Currency = ?, PurchaseDate = ?, Notes = ?, LastUpdated = ?
            WHERE Id = ?
            "#,
            params![
                investment.name.trim(),
                investment.symbol.as_deref().map(|s| s.trim().to_uppercase()),
                investment.investment_type.as_str(),
                investment.quantity,
                round_cents(investment.purchase_price),
                investment.current_price.map(round_cents),
                investment.invested_amount(),
                investment.currency.to_uppercase(),
                investment.purchase_date.to_string(),
                clean_notes(investment.notes.as_deref()),
                format_datetime(Utc::now()),
                id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("investment {}", id)));
        }
        Ok(())
    }

    /// Record a new market price
    pub fn update_investment_price(&self, id: i64, price: f64) -> Result<()> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidData(
                "Current price must be greater than zero".to_string(),
            ));
        }
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE Investments SET CurrentPrice = ?, LastUpdated = ? WHERE Id = ?",
            params![round_cents(price), format_datetime(Utc::now()), id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("investment {}", id)));
        }
        Ok(())
    }

    pub fn delete_investment(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM Investments WHERE Id = ?", params![id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("investment {}", id)));
        }
        Ok(())
    }

    /// Invested amount, current value and profit across a user's holdings
    pub fn portfolio_summary(&self, user_id: i64) -> Result<PortfolioSummary> {
        let investments = self.list_investments(user_id)?;

        let total_invested: f64 = investments.iter().map(|i| i.amount).sum();
        let current_value: f64 = investments.iter().map(Investment::current_value).sum();
        let profit_loss = current_value - total_invested;

        let mut by_type: BTreeMap<&'static str, (f64, i64)> = BTreeMap::new();
        for investment in &investments {
            let entry = by_type
                .entry(investment.investment_type.as_str())
                .or_insert((0.0, 0));
            entry.0 += investment.current_value();
            entry.1 += 1;
        }
        let mut rows: Vec<(String, f64, i64)> = by_type
            .into_iter()
            .map(|(kind, (value, count))| (kind.to_string(), value, count))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(PortfolioSummary {
            investment_count: investments.len() as i64,
            total_invested: round_cents(total_invested),
            current_value: round_cents(current_value),
            profit_loss: round_cents(profit_loss),
            profit_loss_percentage: if total_invested > 0.0 {
                profit_loss / total_invested * 100.0
            } else {
                0.0
            },
            by_type: with_percentages(rows),
        })
    }
}
