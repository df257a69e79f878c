//! Store bootstrap, health probes and repair
//!
//! A table counts as healthy when `SELECT COUNT(*)` against it succeeds.
//! Nothing here asks for confirmation; destructive calls are gated by the caller.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{remove_store_files, schema, Database, Table};
use crate::config::{DatabaseConfig, SeedUser};
use crate::error::{Error, Result};
use crate::models::StoreStats;

/// Outcome of `Database::initialize`
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    /// Id of the demo user, when this run created it
    pub seeded_user: Option<i64>,
    /// Whether RecurringExpenses answered a count after migration
    pub recurring_ready: bool,
}

impl Database {
    /// Count the rows of `table`; an error means the table is missing or broken
    pub fn probe_table(&self, table: Table) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.as_str()),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Ensure the schema exists, migrate recurring expenses and seed the demo user
    ///
    /// Fails only when the schema cannot be created. A seeding failure is
    /// logged and reported as `seeded_user: None`.
    pub fn initialize(&self, seed: &SeedUser) -> Result<InitReport> {
        self.create_schema()?;

        let recurring_ready = self.migrate_logged();
        let seeded_user = match self.ensure_seed_user(seed) {
            Ok(id) => id,
            Err(e) => {
                error!(username = %seed.username, error = %e, "Failed to seed demo user");
                None
            }
        };

        info!(
            path = %self.path().display(),
            seeded = seeded_user.is_some(),
            recurring_ready,
            "Store initialized"
        );

        Ok(InitReport {
            seeded_user,
            recurring_ready,
        })
    }

    /// Whether the store is reachable and the core tables answer a count
    ///
    /// On success RecurringExpenses is checked too and migrated if broken.
    pub fn test_connection(&self) -> bool {
        for table in Table::essential() {
            if let Err(e) = self.probe_table(*table) {
                warn!(table = %table, error = %e, "Connection test failed");
                return false;
            }
        }

        if let Err(e) = self.probe_table(Table::RecurringExpenses) {
            warn!(error = %e, "RecurringExpenses probe failed, migrating");
            self.migrate_logged();
        }

        true
    }

    /// Re-check the store and repair what can be repaired
    ///
    /// Returns `Ok(false)` only when RecurringExpenses could not be repaired.
    /// An essential table that stays broken after repair is `Error::Schema`.
    pub fn validate_and_repair(&self) -> Result<bool> {
        if !self.is_reachable() {
            error!(path = %self.path().display(), "Store unreachable, recreating");
            self.recreate_store()?;
        }

        for table in Table::essential() {
            if !self.repair_table(*table)? {
                error!(table = %table, "Essential table unusable after repair");
                return Err(Error::Schema(format!(
                    "table {} is unusable after repair",
                    table
                )));
            }
        }

        for table in Table::non_essential() {
            match self.repair_table(*table) {
                Ok(true) => {}
                Ok(false) => warn!(table = %table, "Table still broken, feature degraded"),
                Err(e) => warn!(table = %table, error = %e, "Repair failed, feature degraded"),
            }
        }

        let recurring_ok = match self.probe_table(Table::RecurringExpenses) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "RecurringExpenses broken, migrating");
                self.migrate_logged()
            }
        };

        if recurring_ok {
            info!("Store validated");
        }
        Ok(recurring_ok)
    }

    /// Create RecurringExpenses and its indexes if the table does not answer
    ///
    /// Safe to run repeatedly. Index failures are logged and tolerated.
    pub fn migrate_recurring_expense_table(&self) -> Result<bool> {
        match self.probe_table(Table::RecurringExpenses) {
            Ok(count) => {
                debug!(rows = count, "RecurringExpenses present");
                return Ok(true);
            }
            Err(e) => warn!(error = %e, "RecurringExpenses missing or broken, creating"),
        }

        {
            let conn = self.conn()?;
            conn.execute_batch(schema::RECURRING_EXPENSES_TABLE)?;
            for (name, sql) in schema::RECURRING_EXPENSE_INDEXES {
                match conn.execute_batch(sql) {
                    Ok(()) => debug!(index = name, "Index ensured"),
                    Err(e) => warn!(index = name, error = %e, "Failed to create index"),
                }
            }
        }

        match self.probe_table(Table::RecurringExpenses) {
            Ok(_) => {
                info!("RecurringExpenses migrated");
                Ok(true)
            }
            Err(e) => {
                error!(error = %e, "RecurringExpenses still unusable after migration");
                Ok(false)
            }
        }
    }

    /// Drop RecurringExpenses and rebuild it empty
    ///
    /// Destroys every recurring expense.
    pub fn force_migration(&self) -> Result<bool> {
        {
            let conn = self.conn()?;
            if let Err(e) = conn.execute_batch("DROP TABLE IF EXISTS RecurringExpenses") {
                warn!(error = %e, "Failed to drop RecurringExpenses");
            }
        }
        warn!("RecurringExpenses dropped for forced migration");
        self.migrate_recurring_expense_table()
    }

    /// Delete the store and start over with only the demo user
    pub fn reset_store(&self, seed: &SeedUser) -> Result<()> {
        warn!(path = %self.path().display(), "Resetting store, all data will be lost");
        self.recreate_store()?;
        self.migrate_logged();
        self.ensure_seed_user(seed)?;
        info!("Store reset");
        Ok(())
    }

    /// Reset the store at `path` without opening it first
    ///
    /// For stores so damaged that `Database::open_with` fails.
    pub fn reset_at(path: &Path, options: &DatabaseConfig, seed: &SeedUser) -> Result<Self> {
        warn!(path = %path.display(), "Recreating store from scratch");
        remove_store_files(path)?;
        let db = Self::open_with(path, options)?;
        db.migrate_logged();
        db.ensure_seed_user(seed)?;
        Ok(db)
    }

    /// Row counts for every table
    pub fn store_stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            users: self.probe_table(Table::Users)?,
            expenses: self.probe_table(Table::Expenses)?,
            incomes: self.probe_table(Table::Incomes)?,
            recurring_expenses: self.probe_table(Table::RecurringExpenses)?,
            savings_targets: self.probe_table(Table::SavingsTargets)?,
            savings_updates: self.probe_table(Table::SavingsUpdateHistories)?,
            investments: self.probe_table(Table::Investments)?,
            notes: self.probe_table(Table::Notes)?,
        })
    }

    fn is_reachable(&self) -> bool {
        let conn = match self.conn() {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "No connection to store");
                return false;
            }
        };
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| error!(error = %e, "Store did not answer"))
            .is_ok()
    }

    /// Probe, re-create the base schema on failure, probe again
    fn repair_table(&self, table: Table) -> Result<bool> {
        match self.probe_table(table) {
            Ok(count) => {
                debug!(table = %table, rows = count, "Table healthy");
                return Ok(true);
            }
            Err(e) => warn!(table = %table, error = %e, "Table missing or broken, repairing"),
        }

        {
            let conn = self.conn()?;
            conn.execute_batch(schema::BASE_SCHEMA)?;
        }

        Ok(self.probe_table(table).is_ok())
    }

    /// Run the recurring migration, logging instead of propagating failure
    fn migrate_logged(&self) -> bool {
        match self.migrate_recurring_expense_table() {
            Ok(ready) => ready,
            Err(e) => {
                error!(error = %e, "RecurringExpenses migration failed");
                false
            }
        }
    }
}
