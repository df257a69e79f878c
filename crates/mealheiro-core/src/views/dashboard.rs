//! Dashboard for the current month

use chrono::NaiveDate;
use serde::Serialize;

use super::{degrade, run_blocking, savings_rate, MonthOverMonth};
use crate::config::DashboardConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::{
    round_cents, CategoryTotal, DateRange, Expense, PortfolioSummary, SavingsSummary,
    UpcomingPayment,
};

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user_id: i64,
    pub today: NaiveDate,
    pub month: DateRange,
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
    pub savings_rate: f64,
    pub expense_change: MonthOverMonth,
    pub income_change: MonthOverMonth,
    pub top_categories: Vec<CategoryTotal>,
    pub recent_expenses: Vec<Expense>,
    pub savings: SavingsSummary,
    pub portfolio: PortfolioSummary,
    pub upcoming: Vec<UpcomingPayment>,
    pub recurring_commitment: f64,
}

impl Dashboard {
    pub fn build(
        db: &Database,
        user_id: i64,
        today: NaiveDate,
        config: &DashboardConfig,
    ) -> Result<Self> {
        let month = DateRange::containing(today);
        let previous = month.previous_month();

        let total_expenses = db.sum_expenses(user_id, month)?;
        let previous_expenses = db.sum_expenses(user_id, previous)?;
        let total_income = degrade("incomes", db.sum_incomes(user_id, month));
        let previous_income = degrade("incomes", db.sum_incomes(user_id, previous));

        let mut top_categories = db.expenses_by_category(user_id, month)?;
        top_categories.truncate(config.top_categories);

        Ok(Self {
            user_id,
            today,
            month,
            total_income,
            total_expenses,
            balance: round_cents(total_income - total_expenses),
            savings_rate: savings_rate(total_income, total_expenses),
            expense_change: MonthOverMonth::new(previous_expenses, total_expenses),
            income_change: MonthOverMonth::new(previous_income, total_income),
            top_categories,
            recent_expenses: db.recent_expenses(user_id, config.recent_limit)?,
            savings: db.savings_summary(user_id)?,
            portfolio: degrade("investments", db.portfolio_summary(user_id)),
            upcoming: degrade(
                "recurring expenses",
                db.upcoming_recurring(user_id, today, config.upcoming_days),
            ),
            recurring_commitment: degrade(
                "recurring expenses",
                db.monthly_recurring_commitment(user_id, today),
            ),
        })
    }

    /// Build on the blocking pool
    pub async fn load(
        db: &Database,
        user_id: i64,
        today: NaiveDate,
        config: DashboardConfig,
    ) -> Result<Self> {
        run_blocking(db, move |db| Self::build(db, user_id, today, &config)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewExpense, NewIncome, NewSavingsTarget, NewUser};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user = db
            .register_user(&NewUser {
                username: "ana".to_string(),
                email: "ana@example.pt".to_string(),
                password: "segredo123".to_string(),
                full_name: None,
            })
            .unwrap();

        for (description, amount, category, on) in [
            ("Supermercado", 120.0, "Comida", date(2024, 3, 2)),
            ("Luz", 45.5, "Casa", date(2024, 3, 8)),
            ("Cinema", 14.5, "Lazer", date(2024, 3, 9)),
            ("Supermercado", 100.0, "Comida", date(2024, 2, 12)),
        ] {
            db.add_expense(
                user,
                &NewExpense {
                    description: description.to_string(),
                    amount,
                    category: category.to_string(),
                    date: on,
                    notes: None,
                },
            )
            .unwrap();
        }

        for on in [date(2024, 2, 28), date(2024, 3, 1)] {
            db.add_income(
                user,
                &NewIncome {
                    description: "Salário".to_string(),
                    amount: 1000.0,
                    category: "Trabalho".to_string(),
                    date: on,
                    notes: None,
                },
            )
            .unwrap();
        }

        db.create_savings_target(
            user,
            &NewSavingsTarget {
                name: "Fundo de emergência".to_string(),
                description: None,
                target_amount: 1000.0,
                initial_amount: 250.0,
                category: None,
                start_date: date(2024, 1, 1),
                end_date: None,
            },
        )
        .unwrap();

        (db, user)
    }

    #[test]
    fn test_dashboard_totals() {
        let (db, user) = seeded();
        let config = DashboardConfig {
            top_categories: 2,
            ..DashboardConfig::default()
        };

        let dash = Dashboard::build(&db, user, date(2024, 3, 10), &config).unwrap();
        assert_eq!(dash.total_expenses, 180.0);
        assert_eq!(dash.total_income, 1000.0);
        assert_eq!(dash.balance, 820.0);
        assert!((dash.savings_rate - 82.0).abs() < 1e-9);
        assert_eq!(dash.expense_change.previous, 100.0);
        assert_eq!(dash.expense_change.change, 80.0);
        assert_eq!(dash.income_change.change, 0.0);

        assert_eq!(dash.top_categories.len(), 2);
        assert_eq!(dash.top_categories[0].category, "Comida");
        assert_eq!(dash.recent_expenses[0].description, "Cinema");
        assert_eq!(dash.savings.total_saved, 250.0);
        assert_eq!(dash.portfolio.investment_count, 0);
        assert!(dash.upcoming.is_empty());
    }

    #[test]
    fn test_dashboard_degrades_without_optional_tables() {
        let (db, user) = seeded();
        {
            let conn = db.conn().unwrap();
            conn.execute_batch("DROP TABLE Incomes; DROP TABLE Investments;")
                .unwrap();
        }

        let dash =
            Dashboard::build(&db, user, date(2024, 3, 10), &DashboardConfig::default()).unwrap();
        assert_eq!(dash.total_income, 0.0);
        assert_eq!(dash.savings_rate, 0.0);
        assert_eq!(dash.total_expenses, 180.0);
        assert_eq!(dash.portfolio.current_value, 0.0);
    }

    #[test]
    fn test_dashboard_fails_without_expenses() {
        let (db, user) = seeded();
        {
            let conn = db.conn().unwrap();
            conn.execute_batch("DROP TABLE Expenses;").unwrap();
        }

        assert!(
            Dashboard::build(&db, user, date(2024, 3, 10), &DashboardConfig::default()).is_err()
        );
    }

    #[tokio::test]
    async fn test_dashboard_load() {
        let (db, user) = seeded();
        let dash = Dashboard::load(&db, user, date(2024, 3, 10), DashboardConfig::default())
            .await
            .unwrap();
        assert_eq!(dash.month, DateRange::month(2024, 3).unwrap());

        let json = serde_json::to_value(&dash).unwrap();
        assert_eq!(json["total_expenses"], 180.0);
    }
}
