//! Integration tests for mealheiro-core
//!
//! These tests exercise the full open → initialize → record → report workflow
//! against an on-disk store.

use chrono::NaiveDate;
use mealheiro_core::{
    db::Table,
    models::{DateRange, Frequency, NewExpense, NewIncome, NewRecurringExpense, NewSavingsTarget},
    Config, Dashboard, Database, MonthlyAnalysis,
};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn test_config() -> Config {
    Config::from_toml(
        r#"
[database]
pool_size = 4

[seed_user]
username = "teste"
email = "teste@example.pt"
password = "teste123"

[dashboard]
recent_limit = 3
"#,
    )
    .expect("Failed to parse config")
}

fn open_store(dir: &TempDir, config: &Config) -> Database {
    let path = dir.path().join("data").join("mealheiro.db");
    Database::open_with(&path, &config.database).expect("Failed to open store")
}

// =============================================================================
// Bootstrap
// =============================================================================

#[test]
fn test_first_run_workflow() {
    let dir = TempDir::new().unwrap();
    let config = test_config();
    let db = open_store(&dir, &config);

    let report = db.initialize(&config.seed_user).unwrap();
    assert!(report.recurring_ready);
    let user_id = report.seeded_user.expect("seed user should be created");

    assert!(db.test_connection());
    assert!(db.validate_and_repair().unwrap());

    let user = db.authenticate("teste", "teste123").unwrap().unwrap();
    assert_eq!(user.id, user_id);

    // A second start leaves the store alone
    let again = db.initialize(&config.seed_user).unwrap();
    assert!(again.seeded_user.is_none());
    assert_eq!(db.count_users().unwrap(), 1);
}

#[test]
fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = test_config();

    let user_id = {
        let db = open_store(&dir, &config);
        let user_id = db.initialize(&config.seed_user).unwrap().seeded_user.unwrap();
        db.add_expense(
            user_id,
            &NewExpense {
                description: "Farmácia".to_string(),
                amount: 12.4,
                category: "Saúde".to_string(),
                date: date(2024, 5, 3),
                notes: None,
            },
        )
        .unwrap();
        user_id
    };

    let db = open_store(&dir, &config);
    db.initialize(&config.seed_user).unwrap();
    let expenses = db.list_expenses(user_id).unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].category, "Saúde");
}

#[test]
fn test_repair_after_damage() {
    let dir = TempDir::new().unwrap();
    let config = test_config();
    let db = open_store(&dir, &config);
    let user_id = db.initialize(&config.seed_user).unwrap().seeded_user.unwrap();

    db.add_income(
        user_id,
        &NewIncome {
            description: "Salário".to_string(),
            amount: 1200.0,
            category: "Trabalho".to_string(),
            date: date(2024, 5, 1),
            notes: None,
        },
    )
    .unwrap();

    {
        let conn = db.conn().unwrap();
        conn.execute_batch("DROP TABLE Investments; DROP TABLE RecurringExpenses;")
            .unwrap();
    }
    assert!(db.probe_table(Table::Investments).is_err());

    assert!(db.validate_and_repair().unwrap());
    assert_eq!(db.probe_table(Table::Investments).unwrap(), 0);
    assert_eq!(db.probe_table(Table::RecurringExpenses).unwrap(), 0);

    // Untouched tables keep their rows
    assert_eq!(db.probe_table(Table::Incomes).unwrap(), 1);
}

#[test]
fn test_reset_keeps_only_seed_user() {
    let dir = TempDir::new().unwrap();
    let config = test_config();
    let db = open_store(&dir, &config);
    let user_id = db.initialize(&config.seed_user).unwrap().seeded_user.unwrap();

    db.create_savings_target(
        user_id,
        &NewSavingsTarget {
            name: "Férias".to_string(),
            description: None,
            target_amount: 800.0,
            initial_amount: 100.0,
            category: None,
            start_date: date(2024, 1, 1),
            end_date: Some(date(2024, 7, 1)),
        },
    )
    .unwrap();

    db.reset_store(&config.seed_user).unwrap();

    let stats = db.store_stats().unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.savings_targets, 0);
    assert_eq!(stats.savings_updates, 0);
    assert!(db.authenticate("teste", "teste123").unwrap().is_some());
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn test_month_reports() {
    let dir = TempDir::new().unwrap();
    let config = test_config();
    let db = open_store(&dir, &config);
    let user_id = db.initialize(&config.seed_user).unwrap().seeded_user.unwrap();

    for (description, amount, category, on) in [
        ("Renda", 500.0, "Casa", date(2024, 5, 1)),
        ("Mercearia", 80.0, "Comida", date(2024, 5, 4)),
        ("Jantar", 35.0, "Comida", date(2024, 5, 9)),
        ("Livro", 15.0, "Lazer", date(2024, 5, 10)),
    ] {
        db.add_expense(
            user_id,
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

    db.add_recurring_expense(
        user_id,
        &NewRecurringExpense {
            description: "Ginásio".to_string(),
            amount: 30.0,
            category: "Saúde".to_string(),
            frequency: Frequency::Monthly,
            start_date: date(2024, 1, 20),
            end_date: None,
            notes: None,
        },
    )
    .unwrap();

    let today = date(2024, 5, 10);
    let dash = Dashboard::load(&db, user_id, today, config.dashboard.clone())
        .await
        .unwrap();
    assert_eq!(dash.total_expenses, 630.0);
    assert_eq!(dash.recent_expenses.len(), 3);
    assert_eq!(dash.recent_expenses[0].description, "Livro");
    assert_eq!(dash.upcoming.len(), 1);
    assert_eq!(dash.upcoming[0].due, date(2024, 5, 20));
    assert_eq!(dash.recurring_commitment, 30.0);

    let analysis = MonthlyAnalysis::load(&db, user_id, 2024, 5, today).await.unwrap();
    assert_eq!(analysis.expense_count, 4);
    assert_eq!(analysis.days_counted, 10);
    assert_eq!(analysis.daily_average, 63.0);
    assert_eq!(analysis.expense_categories[0].category, "Casa");

    let categories = db
        .expenses_by_category(user_id, DateRange::month(2024, 5).unwrap())
        .unwrap();
    let share: f64 = categories.iter().map(|c| c.percentage).sum();
    assert!((share - 100.0).abs() < 1e-6);
}
