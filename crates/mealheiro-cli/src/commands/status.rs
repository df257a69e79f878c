//! Store maintenance command implementations (status, doctor, migrate, reset)

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mealheiro_core::{Config, Database, Table};

use super::{confirm, open_store};

pub fn cmd_status(config: &Config, db_path: &Path) -> Result<()> {
    println!();
    println!("📊 Mealheiro Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());
    match &config.source {
        Some(path) => println!("   Config: {}", path.display()),
        None => println!("   Config: (built-in defaults)"),
    }

    if !db_path.exists() {
        println!("   Size: (store not initialized, run 'mealheiro init')");
        println!();
        return Ok(());
    }

    if let Ok(metadata) = fs::metadata(db_path) {
        let size_kb = metadata.len() as f64 / 1024.0;
        if size_kb < 1024.0 {
            println!("   Size: {:.1} KB", size_kb);
        } else {
            println!("   Size: {:.1} MB", size_kb / 1024.0);
        }
    }

    match open_store(config, db_path) {
        Ok(db) => match db.store_stats() {
            Ok(stats) => {
                println!();
                println!("   Users: {}", stats.users);
                println!("   Expenses: {}", stats.expenses);
                println!("   Incomes: {}", stats.incomes);
                println!("   Recurring expenses: {}", stats.recurring_expenses);
                println!(
                    "   Savings targets: {} ({} updates)",
                    stats.savings_targets, stats.savings_updates
                );
                println!("   Investments: {}", stats.investments);
                println!("   Notes: {}", stats.notes);
            }
            Err(e) => {
                println!();
                println!("   ⚠️  Some tables are unreadable: {}", e);
                println!("      Run 'mealheiro doctor' to repair them");
            }
        },
        Err(e) => {
            println!();
            println!("   ❌ Error opening store: {:#}", e);
        }
    }

    println!();
    Ok(())
}

fn print_probes(db: &Database) -> usize {
    let mut broken = 0;
    for table in Table::all() {
        let kind = if table.is_essential() { "essential" } else { "optional" };
        match db.probe_table(*table) {
            Ok(count) => println!("   ✅ {:24} {:>6} rows  ({})", table.as_str(), count, kind),
            Err(e) => {
                broken += 1;
                println!("   ❌ {:24} {}  ({})", table.as_str(), e, kind);
            }
        }
    }
    broken
}

/// Probe every table, repair, and report what changed
pub fn cmd_doctor(db: &Database) -> Result<()> {
    println!();
    println!("🩺 Store check");
    println!("   ─────────────────────────────────────────────────────────────");

    let broken = print_probes(db);
    if broken == 0 {
        println!();
        println!("✅ doctor: no issues found");
        return Ok(());
    }

    println!();
    println!("🔧 Repairing {} table(s)...", broken);
    let recurring_ok = db
        .validate_and_repair()
        .context("Repair failed, run 'mealheiro reset' to start over")?;

    println!();
    let still_broken = print_probes(db);
    println!();
    if still_broken == 0 && recurring_ok {
        println!("✅ doctor: store repaired");
    } else {
        println!(
            "⚠️  doctor: {} table(s) still broken, related features stay disabled",
            still_broken
        );
    }

    Ok(())
}

/// Create (or with `force`, rebuild) the recurring expenses table
pub fn cmd_migrate(db: &Database, force: bool, yes: bool) -> Result<()> {
    let ok = if force {
        if !yes
            && !confirm(
                "⚠️  This will DROP the recurring expenses table and every entry in it.\n\nAre you sure?",
            )?
        {
            println!("Cancelled.");
            return Ok(());
        }
        db.force_migration()?
    } else {
        db.migrate_recurring_expense_table()?
    };

    if ok {
        println!("✅ Recurring expenses table ready.");
    } else {
        anyhow::bail!("Recurring expenses table is still unusable after migration");
    }
    Ok(())
}

/// Delete the store and start over with only the demo user
pub fn cmd_reset(config: &Config, db_path: &Path, yes: bool) -> Result<()> {
    if !yes
        && !confirm(
            "⚠️  This will DELETE the entire store and start fresh.\n   All users, expenses, savings and notes will be lost.\n\nAre you sure?",
        )?
    {
        println!("Cancelled.");
        return Ok(());
    }

    Database::reset_at(db_path, &config.database, &config.seed_user)
        .with_context(|| format!("Failed to reset store at {}", db_path.display()))?;

    println!("✅ Store reset complete.");
    println!(
        "   Demo user: {} (password: {})",
        config.seed_user.username, config.seed_user.password
    );

    Ok(())
}
