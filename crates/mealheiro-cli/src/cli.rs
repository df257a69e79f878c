//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mealheiro - Personal finance tracker
#[derive(Parser)]
#[command(name = "mealheiro")]
#[command(about = "Track expenses, incomes, savings and investments", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (overrides MEALHEIRO_DB and the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (defaults to <data dir>/mealheiro/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Username to act as (defaults to the first user)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the store and the demo user
    Init,

    /// Show store location, size and row counts
    Status,

    /// Probe every table and repair what is broken
    Doctor,

    /// Create the recurring expenses table if it is missing
    Migrate {
        /// Drop and rebuild the table (deletes all recurring expenses)
        #[arg(long)]
        force: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete the store and start over with only the demo user
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage user profiles
    Users {
        #[command(subcommand)]
        action: Option<UsersAction>,
    },

    /// Manage expenses (add, list, delete, categories)
    Expenses {
        #[command(subcommand)]
        action: Option<ExpensesAction>,
    },

    /// Manage incomes (add, list, delete)
    Incomes {
        #[command(subcommand)]
        action: Option<IncomesAction>,
    },

    /// Manage recurring expenses
    Recurring {
        #[command(subcommand)]
        action: Option<RecurringAction>,
    },

    /// Manage savings targets
    Savings {
        #[command(subcommand)]
        action: Option<SavingsAction>,
    },

    /// Manage investments
    Investments {
        #[command(subcommand)]
        action: Option<InvestmentsAction>,
    },

    /// Manage notes
    Notes {
        #[command(subcommand)]
        action: Option<NotesAction>,
    },

    /// Show the dashboard for the current month
    Dashboard {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyse one month against the month before
    Analysis {
        /// Month to analyse (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show income, expenses and balance per month
    Trend {
        /// Number of months (defaults to dashboard.trend_months)
        #[arg(short, long)]
        months: Option<u32>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List user profiles
    List,

    /// Register a new user
    Register {
        /// Login name
        username: String,

        /// Email address
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Full name
        #[arg(long)]
        full_name: Option<String>,
    },

    /// Check a username (or email) and password
    Login {
        /// Username or email
        login: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },

    /// Change the current user's password
    Passwd {
        /// Current password
        #[arg(long)]
        current: String,

        /// New password (at least 6 characters)
        #[arg(long)]
        new: String,
    },
}

#[derive(Subcommand)]
pub enum ExpensesAction {
    /// Record an expense
    Add {
        /// Amount spent
        amount: f64,

        /// What it was for
        description: String,

        /// Category
        #[arg(short, long, default_value = "Outros")]
        category: String,

        /// Date (YYYY-MM-DD, DD/MM/YYYY or "today")
        #[arg(short, long, default_value = "today")]
        date: String,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List expenses
    List {
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Maximum number of entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: i64,
    },

    /// List the categories in use
    Categories,
}

#[derive(Subcommand)]
pub enum IncomesAction {
    /// Record an income
    Add {
        /// Amount received
        amount: f64,

        /// Where it came from
        description: String,

        /// Category
        #[arg(short, long, default_value = "Outros")]
        category: String,

        /// Date (YYYY-MM-DD, DD/MM/YYYY or "today")
        #[arg(short, long, default_value = "today")]
        date: String,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List incomes
    List {
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Maximum number of entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete an income
    Delete {
        /// Income ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum RecurringAction {
    /// Add a recurring expense
    Add {
        /// Amount per occurrence
        amount: f64,

        /// What it is for
        description: String,

        /// Category
        #[arg(short, long, default_value = "Outros")]
        category: String,

        /// daily, weekly, monthly, quarterly or yearly
        #[arg(short, long, default_value = "monthly")]
        frequency: String,

        /// First occurrence (YYYY-MM-DD, DD/MM/YYYY or "today")
        #[arg(short, long, default_value = "today")]
        start: String,

        /// Last possible occurrence
        #[arg(short, long)]
        end: Option<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List recurring expenses
    List {
        /// Include paused entries
        #[arg(long)]
        all: bool,
    },

    /// Pause a recurring expense
    Pause {
        /// Recurring expense ID
        id: i64,
    },

    /// Resume a paused recurring expense
    Resume {
        /// Recurring expense ID
        id: i64,
    },

    /// Delete a recurring expense
    Delete {
        /// Recurring expense ID
        id: i64,
    },

    /// Show payments due soon
    Upcoming {
        /// Look-ahead window in days (defaults to dashboard.upcoming_days)
        #[arg(short, long)]
        days: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum SavingsAction {
    /// Create a savings target
    Add {
        /// Target name
        name: String,

        /// Amount to reach
        target: f64,

        /// Amount already saved
        #[arg(short, long, default_value = "0")]
        initial: f64,

        /// Deadline (YYYY-MM-DD, DD/MM/YYYY or "today")
        #[arg(short, long)]
        end: Option<String>,

        /// Category
        #[arg(short, long)]
        category: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// List savings targets
    List,

    /// Add money to a target (negative to withdraw)
    Deposit {
        /// Target ID
        id: i64,

        /// Amount to add
        #[arg(allow_hyphen_values = true)]
        amount: f64,

        /// Note stored in the history
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Set a target's saved amount
    Set {
        /// Target ID
        id: i64,

        /// New saved amount
        amount: f64,

        /// Note stored in the history
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Show a target's update history
    History {
        /// Target ID
        id: i64,
    },

    /// Delete a target and its history
    Delete {
        /// Target ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum InvestmentsAction {
    /// Add an investment
    Add {
        /// Name
        name: String,

        /// Units bought
        quantity: f64,

        /// Price per unit at purchase
        price: f64,

        /// Ticker symbol
        #[arg(short, long)]
        symbol: Option<String>,

        /// stock, etf, fund, bond, crypto, deposit, realestate or other
        #[arg(short = 't', long = "type", default_value = "other")]
        investment_type: String,

        /// Current price per unit
        #[arg(long)]
        current: Option<f64>,

        /// Currency (3 letters)
        #[arg(long, default_value = "EUR")]
        currency: String,

        /// Purchase date (YYYY-MM-DD, DD/MM/YYYY or "today")
        #[arg(short, long, default_value = "today")]
        date: String,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List investments with the portfolio summary
    List,

    /// Update the current price of an investment
    Price {
        /// Investment ID
        id: i64,

        /// Current price per unit
        price: f64,
    },

    /// Delete an investment
    Delete {
        /// Investment ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum NotesAction {
    /// Write a note
    Add {
        /// Title
        title: String,

        /// Body text
        #[arg(short, long, default_value = "")]
        content: String,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// List notes
    List {
        /// Only notes with this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Search titles, bodies and tags
    Search {
        /// Text to look for
        text: String,
    },

    /// Delete a note
    Delete {
        /// Note ID
        id: i64,
    },
}
