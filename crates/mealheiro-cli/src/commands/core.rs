//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `load_config` / `resolve_db_path` - Config and store location resolution
//! - `open_db` - Open, initialize and validate the store, offering a reset on failure
//! - `current_user` - Pick the user the command acts as
//! - `cmd_init` - Initialize the store

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use mealheiro_core::models::User;
use mealheiro_core::{Config, Database, InitReport};
use tracing::{error, info, warn};

/// Load config from `--config`, the data dir override or the embedded defaults
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    Config::load(config_path).context("Failed to load config")
}

/// `--db` wins over `MEALHEIRO_DB`, which wins over the config file
pub fn resolve_db_path(config: &Config, db_override: Option<&Path>) -> Result<PathBuf> {
    match db_override {
        Some(path) => Ok(path.to_path_buf()),
        None => config
            .database_path()
            .context("Failed to resolve database path"),
    }
}

/// Open the store without initializing it
pub fn open_store(config: &Config, db_path: &Path) -> Result<Database> {
    Database::open_with(db_path, &config.database)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}

/// Open the store ready for use, asking on the terminal whether to reset it
/// if it cannot be opened or initialized
pub fn open_db(config: &Config, db_path: &Path) -> Result<Database> {
    open_db_with(config, db_path, ask_reset).map(|(db, _)| db)
}

/// Open, initialize and validate the store
///
/// `reset` decides, given a description of the failure, whether to wipe the
/// store and continue (`true`) or abort (`false`).
pub fn open_db_with<F>(config: &Config, db_path: &Path, mut reset: F) -> Result<(Database, InitReport)>
where
    F: FnMut(&str) -> Result<bool>,
{
    let db = match Database::open_with(db_path, &config.database) {
        Ok(db) => db,
        Err(e) => {
            error!(path = %db_path.display(), error = %e, "Failed to open store");
            if !reset(&format!("Could not open the store: {}", e))? {
                bail!("Aborted, store at {} left untouched", db_path.display());
            }
            Database::reset_at(db_path, &config.database, &config.seed_user)
                .context("Failed to recreate store")?
        }
    };

    match prepare_store(&db, config) {
        Ok(report) => Ok((db, report)),
        Err(e) => {
            error!(error = %e, "Store initialization failed");
            if !reset(&format!("The store could not be initialized: {}", e))? {
                bail!("Aborted, store at {} left untouched", db_path.display());
            }
            db.reset_store(&config.seed_user)
                .context("Failed to reset store")?;
            let report = prepare_store(&db, config).context("Store still unusable after reset")?;
            Ok((db, report))
        }
    }
}

fn prepare_store(db: &Database, config: &Config) -> mealheiro_core::Result<InitReport> {
    let report = db.initialize(&config.seed_user)?;

    if !db.test_connection() {
        warn!("Connection test failed, validating store");
        if !db.validate_and_repair()? {
            warn!("Recurring expenses unavailable, related features disabled");
        }
    }

    Ok(report)
}

fn ask_reset(problem: &str) -> Result<bool> {
    eprintln!("❌ {}", problem);
    print!("   [r]eset the store (all data will be lost) or [a]bort? ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer == "r" || answer == "reset")
}

/// The user named by `--user`, or the first user in the store
pub fn current_user(db: &Database, username: Option<&str>) -> Result<User> {
    match username {
        Some(name) => db
            .get_user_by_username(name)?
            .ok_or_else(|| anyhow::anyhow!("User not found: {}", name)),
        None => db.list_users()?.into_iter().next().ok_or_else(|| {
            anyhow::anyhow!("No users yet. Create one with: mealheiro users register")
        }),
    }
}

pub fn cmd_init(config: &Config, db_path: &Path) -> Result<()> {
    println!("🔧 Initializing store at {}...", db_path.display());

    let (db, report) = open_db_with(config, db_path, ask_reset)?;

    if report.seeded_user.is_some() {
        println!(
            "   Created demo user '{}' (password: {})",
            config.seed_user.username, config.seed_user.password
        );
    } else {
        println!("   Users: {}", db.count_users()?);
    }
    if !report.recurring_ready {
        println!("   ⚠️  Recurring expenses unavailable. Try: mealheiro migrate");
    }

    info!(path = %db_path.display(), "Init complete");
    println!("✅ Store initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Record an expense: mealheiro expenses add 12.50 \"Almoço\" -c Comida");
    println!("  2. See the month: mealheiro dashboard");

    Ok(())
}
