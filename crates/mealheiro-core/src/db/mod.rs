//! Database access layer with connection pooling and self-repairing schema
//!
//! This module is organized by domain:
//! - `schema` - DDL for every table, including the recurring-expense table
//! - `bootstrap` - Store initialization, health probes, repair and reset
//! - `users` - Registration, authentication and profiles
//! - `expenses` / `incomes` - Ledger CRUD and period aggregates
//! - `recurring` - Recurring expense schedules
//! - `savings` - Savings targets and their update history
//! - `investments` - Portfolio holdings
//! - `notes` - Free-form notes with tags

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, error};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

mod aggregates;
mod bootstrap;
mod expenses;
mod incomes;
mod investments;
mod notes;
mod recurring;
mod savings;
pub mod schema;
mod users;

pub use bootstrap::InitReport;
pub use users::hash_password;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Tables in the store, in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Expenses,
    Incomes,
    SavingsTargets,
    SavingsUpdateHistories,
    Notes,
    Investments,
    RecurringExpenses,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Expenses => "Expenses",
            Self::Incomes => "Incomes",
            Self::SavingsTargets => "SavingsTargets",
            Self::SavingsUpdateHistories => "SavingsUpdateHistories",
            Self::Notes => "Notes",
            Self::Investments => "Investments",
            Self::RecurringExpenses => "RecurringExpenses",
        }
    }

    pub fn all() -> &'static [Table] {
        &[
            Self::Users,
            Self::Expenses,
            Self::Incomes,
            Self::SavingsTargets,
            Self::SavingsUpdateHistories,
            Self::Notes,
            Self::Investments,
            Self::RecurringExpenses,
        ]
    }

    /// Tables whose loss makes the store unusable
    pub fn essential() -> &'static [Table] {
        &[Self::Users, Self::Expenses, Self::SavingsTargets, Self::Notes]
    }

    /// Tables whose loss only degrades a feature
    pub fn non_essential() -> &'static [Table] {
        &[Self::Incomes, Self::Investments, Self::SavingsUpdateHistories]
    }

    pub fn is_essential(&self) -> bool {
        Self::essential().contains(self)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Format a timestamp the way SQLite's CURRENT_TIMESTAMP does
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parse a stored DATE column
pub(crate) fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_optional_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

/// Database wrapper with connection pooling
///
/// Clones share the same pool. The pool sits behind a lock so the store can
/// be recreated in place without invalidating existing handles.
#[derive(Clone)]
pub struct Database {
    pool: Arc<RwLock<Option<DbPool>>>,
    /// Path to the database file
    db_path: PathBuf,
    options: DatabaseConfig,
}

impl Database {
    /// Open (creating if needed) the store at `path` with default pool settings
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &DatabaseConfig::default())
    }

    /// Open the store with explicit pool settings and create the base schema
    pub fn open_with(path: impl AsRef<Path>, options: &DatabaseConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = build_pool(&db_path, options)?;
        let db = Self {
            pool: Arc::new(RwLock::new(Some(pool))),
            db_path,
            options: options.clone(),
        };
        db.create_schema()?;

        Ok(db)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a unique temporary file rather than `:memory:` because every
    /// pooled connection must see the same store.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "mealheiro_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any leftovers from an earlier run
        remove_store_files(&path)?;

        Self::open(path)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        let guard = self
            .pool
            .read()
            .map_err(|_| Error::Unavailable("connection pool lock poisoned".to_string()))?;
        let pool = guard
            .as_ref()
            .ok_or_else(|| Error::Unavailable("store is closed".to_string()))?;
        Ok(pool.get()?)
    }

    /// Create every table and index that does not exist yet
    pub fn create_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(schema::PRAGMAS)?;
        conn.execute_batch(schema::BASE_SCHEMA)?;
        conn.execute_batch(schema::RECURRING_EXPENSES_TABLE)?;
        for (_, sql) in schema::RECURRING_EXPENSE_INDEXES {
            conn.execute_batch(sql)?;
        }
        debug!(path = %self.db_path.display(), "Database schema ensured");
        Ok(())
    }

    /// Drop the pool, delete the store files and start over with an empty schema
    pub(crate) fn recreate_store(&self) -> Result<()> {
        let mut guard = self
            .pool
            .write()
            .map_err(|_| Error::Unavailable("connection pool lock poisoned".to_string()))?;

        // Close idle connections before the files go away
        drop(guard.take());
        if let Err(e) = remove_store_files(&self.db_path) {
            error!(path = %self.db_path.display(), error = %e, "Failed to delete store files");
            *guard = build_pool(&self.db_path, &self.options).ok();
            return Err(e);
        }

        *guard = Some(build_pool(&self.db_path, &self.options)?);
        drop(guard);

        self.create_schema()
    }
}

fn build_pool(path: &Path, options: &DatabaseConfig) -> Result<DbPool> {
    // Foreign keys are per-connection in SQLite
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(options.pool_size)
        .connection_timeout(Duration::from_secs(options.connection_timeout_secs))
        .build(manager)?;
    Ok(pool)
}

/// Remove the database file and its WAL/journal sidecars
///
/// Files that are already gone are fine; any other failure is returned.
fn remove_store_files(path: &Path) -> Result<()> {
    remove_if_exists(path)?;
    for suffix in ["-wal", "-shm", "-journal"] {
        let mut sidecar = path.as_os_str().to_os_string();
        sidecar.push(suffix);
        remove_if_exists(&PathBuf::from(sidecar))?;
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests;
