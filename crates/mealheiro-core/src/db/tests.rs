//! Database tests

use super::*;
use crate::config::SeedUser;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rusqlite::params;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.pt", username),
            password: "segredo123".to_string(),
            full_name: None,
        }
    }

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user_id = db.register_user(&new_user("ana")).unwrap();
        (db, user_id)
    }

    fn expense(description: &str, amount: f64, category: &str, on: NaiveDate) -> NewExpense {
        NewExpense {
            description: description.to_string(),
            amount,
            category: category.to_string(),
            date: on,
            notes: None,
        }
    }

    fn recurring(description: &str, amount: f64, frequency: Frequency, start: NaiveDate) -> NewRecurringExpense {
        NewRecurringExpense {
            description: description.to_string(),
            amount,
            category: "Casa".to_string(),
            frequency,
            start_date: start,
            end_date: None,
            notes: None,
        }
    }

    fn savings_target(target_amount: f64, initial_amount: f64) -> NewSavingsTarget {
        NewSavingsTarget {
            name: "Férias".to_string(),
            description: None,
            target_amount,
            initial_amount,
            category: Some("Lazer".to_string()),
            start_date: date(2024, 1, 1),
            end_date: Some(date(2024, 8, 1)),
        }
    }

    fn drop_table(db: &Database, table: Table) {
        let conn = db.conn().unwrap();
        conn.execute_batch(&format!("DROP TABLE {}", table.as_str()))
            .unwrap();
    }

    fn recurring_index_count(db: &Database) -> i64 {
        let conn = db.conn().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'RecurringExpenses' AND name LIKE 'IX_RecurringExpenses_%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    // ========== Bootstrap ==========

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        let stats = db.store_stats().unwrap();
        assert_eq!(stats.users, 0);
        assert_eq!(stats.expenses, 0);
        assert_eq!(stats.recurring_expenses, 0);
        assert!(db.test_connection());
    }

    #[test]
    fn test_recurring_table_layout() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        let columns: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('RecurringExpenses')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(columns, 12);
        drop(conn);

        assert_eq!(recurring_index_count(&db), 10);
    }

    #[test]
    fn test_initialize_seeds_demo_user_once() {
        let db = Database::in_memory().unwrap();
        let seed = SeedUser::default();

        let first = db.initialize(&seed).unwrap();
        assert!(first.seeded_user.is_some());
        assert!(first.recurring_ready);

        let second = db.initialize(&seed).unwrap();
        assert!(second.seeded_user.is_none());
        assert_eq!(db.count_users().unwrap(), 1);

        let demo = db.authenticate(&seed.username, &seed.password).unwrap();
        assert!(demo.is_some());
    }

    #[test]
    fn test_initialize_does_not_seed_when_users_exist() {
        let (db, _) = setup();
        let report = db.initialize(&SeedUser::default()).unwrap();
        assert!(report.seeded_user.is_none());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let (db, user) = setup();
        db.add_recurring_expense(user, &recurring("Renda", 650.0, Frequency::Monthly, date(2024, 1, 1)))
            .unwrap();

        assert!(db.migrate_recurring_expense_table().unwrap());
        let rows_after_first = db.probe_table(Table::RecurringExpenses).unwrap();
        let indexes_after_first = recurring_index_count(&db);

        assert!(db.migrate_recurring_expense_table().unwrap());
        assert_eq!(db.probe_table(Table::RecurringExpenses).unwrap(), rows_after_first);
        assert_eq!(recurring_index_count(&db), indexes_after_first);
        assert_eq!(rows_after_first, 1);
    }

    #[test]
    fn test_migration_recreates_dropped_table() {
        let db = Database::in_memory().unwrap();
        drop_table(&db, Table::RecurringExpenses);
        assert!(db.probe_table(Table::RecurringExpenses).is_err());

        assert!(db.migrate_recurring_expense_table().unwrap());
        assert_eq!(db.probe_table(Table::RecurringExpenses).unwrap(), 0);
        assert_eq!(recurring_index_count(&db), 10);
    }

    #[test]
    fn test_validate_and_repair_after_recurring_drop() {
        let (db, user) = setup();
        db.add_expense(user, &expense("Café", 1.2, "Comida", date(2024, 3, 1)))
            .unwrap();
        drop_table(&db, Table::RecurringExpenses);

        assert!(db.validate_and_repair().unwrap());
        assert_eq!(db.probe_table(Table::RecurringExpenses).unwrap(), 0);
        // Unrelated data survives
        assert_eq!(db.list_expenses(user).unwrap().len(), 1);
    }

    #[test]
    fn test_test_connection_repairs_recurring() {
        let db = Database::in_memory().unwrap();
        drop_table(&db, Table::RecurringExpenses);

        assert!(db.test_connection());
        assert!(db.probe_table(Table::RecurringExpenses).is_ok());
    }

    #[test]
    fn test_test_connection_fails_without_essential_table() {
        let db = Database::in_memory().unwrap();
        drop_table(&db, Table::Notes);
        assert!(!db.test_connection());
    }

    #[test]
    fn test_validate_and_repair_restores_essential_table() {
        let (db, user) = setup();
        db.add_expense(user, &expense("Café", 1.2, "Comida", date(2024, 3, 1)))
            .unwrap();
        drop_table(&db, Table::Notes);

        assert!(db.validate_and_repair().unwrap());
        assert_eq!(db.probe_table(Table::Notes).unwrap(), 0);
        assert_eq!(db.list_expenses(user).unwrap().len(), 1);
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_validate_and_repair_restores_non_essential_tables() {
        let db = Database::in_memory().unwrap();
        drop_table(&db, Table::Incomes);
        drop_table(&db, Table::Investments);

        assert!(db.validate_and_repair().unwrap());
        assert!(db.probe_table(Table::Incomes).is_ok());
        assert!(db.probe_table(Table::Investments).is_ok());
    }

    #[test]
    fn test_force_migration_clears_recurring() {
        let (db, user) = setup();
        db.add_recurring_expense(user, &recurring("Ginásio", 35.0, Frequency::Monthly, date(2024, 1, 5)))
            .unwrap();

        assert!(db.force_migration().unwrap());
        assert!(db.list_recurring_expenses(user, false).unwrap().is_empty());
        assert_eq!(recurring_index_count(&db), 10);
    }

    #[test]
    fn test_reset_store_leaves_only_seed_user() {
        let (db, user) = setup();
        db.register_user(&new_user("rui")).unwrap();
        db.add_expense(user, &expense("Café", 1.2, "Comida", date(2024, 3, 1)))
            .unwrap();
        db.add_income(
            user,
            &NewIncome {
                description: "Salário".to_string(),
                amount: 1500.0,
                category: "Trabalho".to_string(),
                date: date(2024, 3, 1),
                notes: None,
            },
        )
        .unwrap();
        db.add_recurring_expense(user, &recurring("Renda", 650.0, Frequency::Monthly, date(2024, 1, 1)))
            .unwrap();
        let target = db.create_savings_target(user, &savings_target(500.0, 50.0)).unwrap();
        db.add_to_savings_target(target, 25.0, None).unwrap();
        db.add_note(
            user,
            &NewNote {
                title: "Ideia".to_string(),
                content: "Trocar de operador".to_string(),
                tags: None,
            },
        )
        .unwrap();

        let seed = SeedUser::default();
        db.reset_store(&seed).unwrap();

        let stats = db.store_stats().unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.expenses, 0);
        assert_eq!(stats.incomes, 0);
        assert_eq!(stats.recurring_expenses, 0);
        assert_eq!(stats.savings_targets, 0);
        assert_eq!(stats.savings_updates, 0);
        assert_eq!(stats.investments, 0);
        assert_eq!(stats.notes, 0);

        let remaining = db.list_users().unwrap();
        assert_eq!(remaining[0].username, seed.username);
    }

    #[test]
    fn test_reset_is_visible_through_clones() {
        let (db, _) = setup();
        let clone = db.clone();
        db.reset_store(&SeedUser::default()).unwrap();
        assert_eq!(clone.count_users().unwrap(), 1);
        assert!(clone.get_user_by_username("ana").unwrap().is_none());
    }

    #[test]
    fn test_reset_at_replaces_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.db");
        std::fs::write(&path, b"this is not a sqlite database at all").unwrap();
        assert!(Database::open(&path).is_err());

        let db = Database::reset_at(&path, &DatabaseConfig::default(), &SeedUser::default())
            .unwrap();
        assert_eq!(db.count_users().unwrap(), 1);
        assert!(db.test_connection());
    }

    #[test]
    fn test_store_file_removal_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.db");
        assert!(remove_store_files(&path).is_ok());

        std::fs::write(&path, b"x").unwrap();
        std::fs::write(dir.path().join("gone.db-wal"), b"x").unwrap();
        remove_store_files(&path).unwrap();
        assert!(!path.exists());
        assert!(!dir.path().join("gone.db-wal").exists());
    }

    #[test]
    fn test_reset_at_fails_when_store_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep.txt"), b"data").unwrap();

        let result = Database::reset_at(&path, &DatabaseConfig::default(), &SeedUser::default());
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(path.join("keep.txt").exists());
    }

    #[test]
    fn test_validate_and_repair_recreates_unreachable_store() {
        let (db, user) = setup();
        db.add_expense(user, &expense("Café", 1.2, "Comida", date(2024, 3, 1)))
            .unwrap();

        // Close every connection and leave garbage where the store was
        drop(db.pool.write().unwrap().take());
        std::fs::write(db.path(), b"this is not a sqlite database at all").unwrap();
        assert!(db.conn().is_err());

        assert!(db.validate_and_repair().unwrap());
        let stats = db.store_stats().unwrap();
        assert_eq!(stats.users, 0);
        assert_eq!(stats.expenses, 0);
        assert_eq!(recurring_index_count(&db), 10);
        assert!(db.test_connection());
    }

    #[test]
    fn test_initialize_survives_invalid_seed_user() {
        let db = Database::in_memory().unwrap();
        let seed = SeedUser {
            password: "1234".to_string(),
            ..SeedUser::default()
        };

        let report = db.initialize(&seed).unwrap();
        assert!(report.seeded_user.is_none());
        assert!(report.recurring_ready);
        assert_eq!(db.count_users().unwrap(), 0);
        assert!(db.test_connection());
    }

    // ========== Users ==========

    #[test]
    fn test_hash_password_is_sha256_hex() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_register_and_authenticate() {
        let (db, id) = setup();

        let stored = db.get_user(id).unwrap().unwrap();
        assert_ne!(stored.password_hash, "segredo123");
        assert!(stored.last_login.is_none());

        assert!(db.authenticate("ana", "errada").unwrap().is_none());
        assert!(db.authenticate("ninguem", "segredo123").unwrap().is_none());

        let by_email = db.authenticate("ana@example.pt", "segredo123").unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert!(by_email.last_login.is_some());
        assert!(db.get_user(id).unwrap().unwrap().last_login.is_some());
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let (db, _) = setup();

        let same_name = NewUser {
            email: "outra@example.pt".to_string(),
            ..new_user("ana")
        };
        assert!(matches!(db.register_user(&same_name), Err(Error::InvalidData(_))));

        let same_email = NewUser {
            username: "ana2".to_string(),
            ..new_user("ana")
        };
        assert!(matches!(db.register_user(&same_email), Err(Error::InvalidData(_))));
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn test_change_password() {
        let (db, id) = setup();

        assert!(matches!(
            db.change_password(id, "errada", "novasenha"),
            Err(Error::Auth(_))
        ));
        assert!(matches!(
            db.change_password(id, "segredo123", "abc"),
            Err(Error::InvalidData(_))
        ));

        db.change_password(id, "segredo123", "novasenha").unwrap();
        assert!(db.authenticate("ana", "segredo123").unwrap().is_none());
        assert!(db.authenticate("ana", "novasenha").unwrap().is_some());
    }

    #[test]
    fn test_update_user_profile() {
        let (db, id) = setup();
        let other = db.register_user(&new_user("rui")).unwrap();

        db.update_user_profile(id, "ana.silva@example.pt", Some("Ana Silva"))
            .unwrap();
        let user = db.get_user(id).unwrap().unwrap();
        assert_eq!(user.email, "ana.silva@example.pt");
        assert_eq!(user.display_name(), "Ana Silva");

        assert!(matches!(
            db.update_user_profile(other, "ana.silva@example.pt", None),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            db.update_user_profile(999, "x@example.pt", None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_user_cascades() {
        let (db, id) = setup();
        let keep = db.register_user(&new_user("rui")).unwrap();

        db.add_expense(id, &expense("Café", 1.2, "Comida", date(2024, 3, 1)))
            .unwrap();
        db.add_expense(keep, &expense("Pão", 0.8, "Comida", date(2024, 3, 1)))
            .unwrap();
        let target = db.create_savings_target(id, &savings_target(100.0, 10.0)).unwrap();
        db.add_to_savings_target(target, 5.0, Some("extra")).unwrap();
        db.add_recurring_expense(id, &recurring("Renda", 650.0, Frequency::Monthly, date(2024, 1, 1)))
            .unwrap();

        db.delete_user(id).unwrap();

        let stats = db.store_stats().unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.expenses, 1);
        assert_eq!(stats.savings_targets, 0);
        assert_eq!(stats.savings_updates, 0);
        assert_eq!(stats.recurring_expenses, 0);

        assert!(matches!(db.delete_user(id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_ensure_seed_user_only_on_empty_store() {
        let db = Database::in_memory().unwrap();
        let seed = SeedUser::default();

        let id = db.ensure_seed_user(&seed).unwrap();
        assert!(id.is_some());
        assert!(db.ensure_seed_user(&seed).unwrap().is_none());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    // ========== Expenses & Incomes ==========

    #[test]
    fn test_sum_expenses_excludes_out_of_range() {
        let (db, user) = setup();
        db.add_expense(user, &expense("Almoço", 10.00, "Comida", date(2024, 3, 5)))
            .unwrap();
        db.add_expense(user, &expense("Livro", 25.50, "Lazer", date(2024, 3, 31)))
            .unwrap();
        db.add_expense(user, &expense("Jantar", 40.00, "Comida", date(2024, 4, 1)))
            .unwrap();

        let march = DateRange::month(2024, 3).unwrap();
        assert_eq!(db.sum_expenses(user, march).unwrap(), 35.50);
        assert_eq!(db.list_expenses_in_range(user, march).unwrap().len(), 2);
    }

    #[test]
    fn test_sums_are_per_user() {
        let (db, ana) = setup();
        let rui = db.register_user(&new_user("rui")).unwrap();
        db.add_expense(ana, &expense("Almoço", 10.0, "Comida", date(2024, 3, 5)))
            .unwrap();
        db.add_expense(rui, &expense("Almoço", 99.0, "Comida", date(2024, 3, 5)))
            .unwrap();

        let march = DateRange::month(2024, 3).unwrap();
        assert_eq!(db.sum_expenses(ana, march).unwrap(), 10.0);
        assert_eq!(db.sum_incomes(ana, march).unwrap(), 0.0);
    }

    #[test]
    fn test_expense_crud() {
        let (db, user) = setup();
        let id = db
            .add_expense(user, &expense("Café", 1.2, "Comida", date(2024, 3, 1)))
            .unwrap();

        let mut edit = expense("Café duplo", 1.8, "Comida", date(2024, 3, 2));
        edit.notes = Some("  ".to_string());
        db.update_expense(id, &edit).unwrap();

        let stored = db.get_expense(id).unwrap().unwrap();
        assert_eq!(stored.description, "Café duplo");
        assert_eq!(stored.amount, 1.8);
        assert_eq!(stored.date, date(2024, 3, 2));
        assert_eq!(stored.notes, None);

        assert!(db.add_expense(user, &expense("Nada", -3.0, "Comida", date(2024, 3, 1))).is_err());

        db.delete_expense(id).unwrap();
        assert!(db.get_expense(id).unwrap().is_none());
        assert!(matches!(db.delete_expense(id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_recent_expenses_newest_first() {
        let (db, user) = setup();
        for day in 1..=6 {
            db.add_expense(user, &expense("Café", 1.0, "Comida", date(2024, 3, day)))
                .unwrap();
        }
        let recent = db.recent_expenses(user, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].date, date(2024, 3, 6));
        assert_eq!(recent[2].date, date(2024, 3, 4));
    }

    #[test]
    fn test_expenses_by_category() {
        let (db, user) = setup();
        db.add_expense(user, &expense("Almoço", 30.0, "Comida", date(2024, 3, 5)))
            .unwrap();
        db.add_expense(user, &expense("Jantar", 45.0, "Comida", date(2024, 3, 6)))
            .unwrap();
        db.add_expense(user, &expense("Cinema", 25.0, "Lazer", date(2024, 3, 7)))
            .unwrap();

        let totals = db
            .expenses_by_category(user, DateRange::month(2024, 3).unwrap())
            .unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "Comida");
        assert_eq!(totals[0].amount, 75.0);
        assert_eq!(totals[0].count, 2);
        assert!((totals[0].percentage - 75.0).abs() < 1e-9);
        assert!((totals[1].percentage - 25.0).abs() < 1e-9);

        assert_eq!(db.expense_categories(user).unwrap(), vec!["Comida", "Lazer"]);
    }

    #[test]
    fn test_expense_trend_fills_empty_months() {
        let (db, user) = setup();
        db.add_expense(user, &expense("Luz", 30.0, "Casa", date(2024, 2, 10)))
            .unwrap();
        db.add_expense(user, &expense("Almoço", 10.0, "Comida", date(2024, 3, 5)))
            .unwrap();
        db.add_expense(user, &expense("Livro", 25.5, "Lazer", date(2024, 3, 15)))
            .unwrap();
        db.add_expense(user, &expense("Futuro", 99.0, "Lazer", date(2024, 4, 1)))
            .unwrap();

        let trend = db.expense_trend(user, 3, date(2024, 3, 15)).unwrap();
        let labels: Vec<&str> = trend.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(trend[0].amount, 0.0);
        assert_eq!(trend[0].count, 0);
        assert_eq!(trend[1].amount, 30.0);
        assert_eq!(trend[2].amount, 35.5);
    }

    #[test]
    fn test_income_crud_and_trend() {
        let (db, user) = setup();
        let salary = NewIncome {
            description: "Salário".to_string(),
            amount: 1500.0,
            category: "Trabalho".to_string(),
            date: date(2023, 12, 28),
            notes: Some("Dezembro".to_string()),
        };
        let id = db.add_income(user, &salary).unwrap();
        db.add_income(
            user,
            &NewIncome {
                date: date(2024, 1, 28),
                notes: None,
                ..salary.clone()
            },
        )
        .unwrap();

        let stored = db.get_income(id).unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("Dezembro"));

        // Trend crosses the year boundary
        let trend = db.income_trend(user, 2, date(2024, 1, 31)).unwrap();
        assert_eq!(trend[0].label, "2023-12");
        assert_eq!(trend[0].amount, 1500.0);
        assert_eq!(trend[1].label, "2024-01");

        db.update_income(
            id,
            &NewIncome {
                amount: 1600.0,
                ..salary
            },
        )
        .unwrap();
        assert_eq!(
            db.sum_incomes(user, DateRange::month(2023, 12).unwrap()).unwrap(),
            1600.0
        );
        assert_eq!(db.incomes_by_category(user, DateRange::month(2023, 12).unwrap()).unwrap().len(), 1);
        assert_eq!(db.income_categories(user).unwrap(), vec!["Trabalho"]);
        assert_eq!(db.recent_incomes(user, 1).unwrap()[0].date, date(2024, 1, 28));
        assert_eq!(db.list_incomes(user).unwrap().len(), 2);

        db.delete_income(id).unwrap();
        assert_eq!(
            db.list_incomes_in_range(user, DateRange::month(2023, 12).unwrap())
                .unwrap()
                .len(),
            0
        );
    }

    // ========== Recurring ==========

    #[test]
    fn test_recurring_crud() {
        let (db, user) = setup();
        let id = db
            .add_recurring_expense(user, &recurring("Renda", 650.0, Frequency::Monthly, date(2024, 1, 15)))
            .unwrap();

        let stored = db.get_recurring_expense(id).unwrap().unwrap();
        assert_eq!(stored.frequency, Frequency::Monthly);
        assert!(stored.is_active);
        assert_eq!(stored.last_processed, None);

        let mut edit = recurring("Renda", 700.0, Frequency::Quarterly, date(2024, 1, 15));
        edit.end_date = Some(date(2024, 12, 31));
        db.update_recurring_expense(id, &edit).unwrap();
        let stored = db.get_recurring_expense(id).unwrap().unwrap();
        assert_eq!(stored.amount, 700.0);
        assert_eq!(stored.frequency, Frequency::Quarterly);
        assert_eq!(stored.end_date, Some(date(2024, 12, 31)));

        db.set_recurring_active(id, false).unwrap();
        assert!(db.list_recurring_expenses(user, true).unwrap().is_empty());
        assert_eq!(db.list_recurring_expenses(user, false).unwrap().len(), 1);

        db.delete_recurring_expense(id).unwrap();
        assert!(matches!(db.delete_recurring_expense(id), Err(Error::NotFound(_))));
        assert!(matches!(db.set_recurring_active(id, true), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_recurring_rejects_end_before_start() {
        let (db, user) = setup();
        let mut item = recurring("Renda", 650.0, Frequency::Monthly, date(2024, 5, 1));
        item.end_date = Some(date(2024, 4, 1));
        assert!(matches!(
            db.add_recurring_expense(user, &item),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_unknown_stored_frequency_reads_as_monthly() {
        let (db, user) = setup();
        {
            let conn = db.conn().unwrap();
            conn.execute(
                "INSERT INTO RecurringExpenses (Description, Amount, Category, Frequency, StartDate, UserId) VALUES (?, ?, ?, ?, ?, ?)",
                params!["Revista", 5.0, "Lazer", "Fortnightly", "2024-01-15", user],
            )
            .unwrap();
        }

        let items = db.list_recurring_expenses(user, false).unwrap();
        assert_eq!(items[0].frequency, Frequency::Monthly);
        assert_eq!(items[0].next_occurrence(date(2024, 3, 10)), Some(date(2024, 3, 15)));
    }

    #[test]
    fn test_recurring_access_repairs_missing_table() {
        let (db, user) = setup();
        drop_table(&db, Table::RecurringExpenses);

        assert!(db.list_recurring_expenses(user, false).unwrap().is_empty());

        drop_table(&db, Table::RecurringExpenses);
        let id = db
            .add_recurring_expense(user, &recurring("Renda", 650.0, Frequency::Monthly, date(2024, 1, 1)))
            .unwrap();
        assert!(db.get_recurring_expense(id).unwrap().is_some());
    }

    #[test]
    fn test_recurring_constraint_failure_is_not_retried() {
        let (db, _) = setup();
        let attempts = std::cell::Cell::new(0);

        let result = db.with_recurring_repair(|conn| {
            attempts.set(attempts.get() + 1);
            conn.execute(
                "INSERT INTO RecurringExpenses (Description, Amount, Category, Frequency, StartDate, UserId) VALUES (?, ?, ?, ?, ?, ?)",
                params!["Renda", 650.0, "Casa", "Monthly", "2024-01-01", 9999],
            )?;
            Ok(())
        });

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(attempts.get(), 1);
        assert_eq!(db.probe_table(Table::RecurringExpenses).unwrap(), 0);
    }

    #[test]
    fn test_recurring_missing_table_is_retried_once() {
        let (db, _) = setup();
        drop_table(&db, Table::RecurringExpenses);
        let attempts = std::cell::Cell::new(0);

        let count = db
            .with_recurring_repair(|conn| {
                attempts.set(attempts.get() + 1);
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM RecurringExpenses", [], |row| row.get(0))?;
                Ok(n)
            })
            .unwrap();

        assert_eq!(count, 0);
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_upcoming_recurring_and_commitment() {
        let (db, user) = setup();
        let today = date(2024, 3, 10);

        let rent = db
            .add_recurring_expense(user, &recurring("Renda", 650.0, Frequency::Monthly, date(2024, 1, 15)))
            .unwrap();
        db.add_recurring_expense(user, &recurring("Seguro", 240.0, Frequency::Yearly, date(2023, 6, 1)))
            .unwrap();
        let gym = db
            .add_recurring_expense(user, &recurring("Ginásio", 10.0, Frequency::Weekly, date(2024, 1, 1)))
            .unwrap();
        db.set_recurring_active(gym, false).unwrap();

        let upcoming = db.upcoming_recurring(user, today, 30).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].recurring_id, rent);
        assert_eq!(upcoming[0].due, date(2024, 3, 15));
        assert_eq!(upcoming[0].days_until, 5);

        let later = db.upcoming_recurring(user, today, 90).unwrap();
        assert_eq!(later.len(), 2);
        assert_eq!(later[1].due, date(2024, 6, 1));

        // 650 monthly + 240 yearly, paused gym excluded
        assert_eq!(db.monthly_recurring_commitment(user, today).unwrap(), 670.0);
    }

    // ========== Savings ==========

    #[test]
    fn test_savings_updates_keep_invariants() {
        let (db, user) = setup();
        let id = db.create_savings_target(user, &savings_target(100.0, 20.0)).unwrap();

        let target = db.get_savings_target(id).unwrap().unwrap();
        assert_eq!(target.current_amount, 20.0);
        assert!(!target.is_completed);

        db.add_to_savings_target(id, 50.0, Some("Março")).unwrap();
        let change = db.add_to_savings_target(id, 40.0, None).unwrap();
        assert_eq!(change.new_amount, 110.0);

        let target = db.get_savings_target(id).unwrap().unwrap();
        assert!(target.is_completed);
        assert!(target.completed_at.is_some());

        let change = db.add_to_savings_target(id, -500.0, Some("Carro avariou")).unwrap();
        assert_eq!(change.new_amount, 0.0);
        assert_eq!(change.amount_added, -110.0);

        let target = db.get_savings_target(id).unwrap().unwrap();
        assert_eq!(target.current_amount, 0.0);
        assert!(!target.is_completed);
        assert!(target.completed_at.is_none());

        db.set_savings_amount(id, 100.0, None).unwrap();
        let target = db.get_savings_target(id).unwrap().unwrap();
        assert!(target.is_completed);

        let history = db.savings_history(id).unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history.last().unwrap().note.as_deref(), Some("Initial amount"));
        for entry in &history {
            assert_eq!(
                round_cents(entry.previous_amount + entry.amount_added),
                entry.new_amount
            );
            assert!(entry.new_amount >= 0.0);
        }
    }

    #[test]
    fn test_savings_target_without_initial_amount_has_no_history() {
        let (db, user) = setup();
        let id = db.create_savings_target(user, &savings_target(100.0, 0.0)).unwrap();
        assert!(db.savings_history(id).unwrap().is_empty());
        assert!(matches!(
            db.add_to_savings_target(999, 10.0, None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_savings_target_recomputes_completion() {
        let (db, user) = setup();
        let id = db.create_savings_target(user, &savings_target(100.0, 80.0)).unwrap();

        db.update_savings_target(id, &savings_target(60.0, 0.0)).unwrap();
        let target = db.get_savings_target(id).unwrap().unwrap();
        assert_eq!(target.current_amount, 80.0);
        assert!(target.is_completed);

        db.update_savings_target(id, &savings_target(200.0, 0.0)).unwrap();
        let target = db.get_savings_target(id).unwrap().unwrap();
        assert!(!target.is_completed);
        assert!(target.completed_at.is_none());
    }

    #[test]
    fn test_delete_savings_target_removes_history() {
        let (db, user) = setup();
        let id = db.create_savings_target(user, &savings_target(100.0, 30.0)).unwrap();
        db.add_to_savings_target(id, 10.0, None).unwrap();

        db.delete_savings_target(id).unwrap();
        assert!(db.get_savings_target(id).unwrap().is_none());
        assert_eq!(db.probe_table(Table::SavingsUpdateHistories).unwrap(), 0);
    }

    #[test]
    fn test_savings_summary() {
        let (db, user) = setup();
        db.create_savings_target(user, &savings_target(100.0, 100.0)).unwrap();
        db.create_savings_target(user, &savings_target(300.0, 100.0)).unwrap();

        let summary = db.savings_summary(user).unwrap();
        assert_eq!(summary.target_count, 2);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.total_saved, 200.0);
        assert_eq!(summary.total_target, 400.0);
        assert_eq!(summary.overall_progress, 50.0);

        let targets = db.list_savings_targets(user).unwrap();
        assert!(!targets[0].is_completed);
        assert!(targets[1].is_completed);
    }

    // ========== Investments ==========

    fn investment(name: &str, kind: InvestmentType, quantity: f64, price: f64) -> NewInvestment {
        NewInvestment {
            name: name.to_string(),
            symbol: None,
            investment_type: kind,
            quantity,
            purchase_price: price,
            current_price: None,
            currency: "eur".to_string(),
            purchase_date: date(2024, 1, 2),
            notes: None,
        }
    }

    #[test]
    fn test_investment_crud_and_portfolio() {
        let (db, user) = setup();
        let etf = db
            .add_investment(user, &investment("World ETF", InvestmentType::Etf, 10.0, 80.0))
            .unwrap();
        let stock = db
            .add_investment(user, &investment("EDP", InvestmentType::Stock, 5.0, 20.0))
            .unwrap();

        let stored = db.get_investment(etf).unwrap().unwrap();
        assert_eq!(stored.amount, 800.0);
        assert_eq!(stored.currency, "EUR");
        assert!(stored.last_updated.is_none());

        db.update_investment_price(stock, 30.0).unwrap();
        let stored = db.get_investment(stock).unwrap().unwrap();
        assert_eq!(stored.current_value(), 150.0);
        assert!(stored.last_updated.is_some());

        let summary = db.portfolio_summary(user).unwrap();
        assert_eq!(summary.investment_count, 2);
        assert_eq!(summary.total_invested, 900.0);
        assert_eq!(summary.current_value, 950.0);
        assert_eq!(summary.profit_loss, 50.0);
        assert_eq!(summary.by_type[0].category, "ETF");
        let share: f64 = summary.by_type.iter().map(|t| t.percentage).sum();
        assert!((share - 100.0).abs() < 1e-9);

        let mut edit = investment("World ETF", InvestmentType::Etf, 12.0, 80.0);
        edit.symbol = Some("iwda".to_string());
        db.update_investment(etf, &edit).unwrap();
        let stored = db.get_investment(etf).unwrap().unwrap();
        assert_eq!(stored.amount, 960.0);
        assert_eq!(stored.symbol.as_deref(), Some("IWDA"));

        assert!(matches!(db.update_investment_price(999, 1.0), Err(Error::NotFound(_))));
        assert!(db.update_investment_price(etf, 0.0).is_err());

        db.delete_investment(etf).unwrap();
        assert_eq!(db.list_investments(user).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_portfolio() {
        let (db, user) = setup();
        let summary = db.portfolio_summary(user).unwrap();
        assert_eq!(summary.investment_count, 0);
        assert_eq!(summary.profit_loss_percentage, 0.0);
        assert!(summary.by_type.is_empty());
    }

    // ========== Notes ==========

    fn note(title: &str, content: &str, tags: Option<&str>) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.map(String::from),
        }
    }

    #[test]
    fn test_note_crud_and_tags() {
        let (db, user) = setup();
        let id = db
            .add_note(user, &note("Casa", "Pagar renda dia 15", Some(" casa , ,contas")))
            .unwrap();

        let stored = db.get_note(id).unwrap().unwrap();
        assert_eq!(stored.tags.as_deref(), Some("casa, contas"));
        assert!(stored.updated_at.is_none());

        db.update_note(id, &note("Casa", "Renda paga", Some(""))).unwrap();
        let stored = db.get_note(id).unwrap().unwrap();
        assert_eq!(stored.tags, None);
        assert!(stored.updated_at.is_some());

        db.delete_note(id).unwrap();
        assert!(db.list_notes(user).unwrap().is_empty());
        assert!(matches!(db.update_note(id, &note("x", "", None)), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_search_notes() {
        let (db, user) = setup();
        db.add_note(user, &note("Plano 100% poupança", "", Some("Objetivos")))
            .unwrap();
        db.add_note(user, &note("Renda", "Aumento de 2% em 2025", Some("casa")))
            .unwrap();
        db.add_note(user, &note("Lista", "Compras", None)).unwrap();

        assert_eq!(db.search_notes(user, "renda").unwrap().len(), 1);
        assert_eq!(db.search_notes(user, "100%").unwrap().len(), 1);
        assert_eq!(db.search_notes(user, "%").unwrap().len(), 2);
        assert_eq!(db.search_notes(user, "CASA").unwrap().len(), 1);

        let tagged = db.notes_with_tag(user, "objetivos").unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].title, "Plano 100% poupança");
    }
}
