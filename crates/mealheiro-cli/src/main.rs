//! Mealheiro CLI - Personal finance tracker
//!
//! Usage:
//!   mealheiro init                        Create the store and the demo user
//!   mealheiro expenses add 12.50 "Almoço" Record an expense
//!   mealheiro dashboard                   Show the current month
//!   mealheiro doctor                      Check and repair the store

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use mealheiro_core::models::{
    Frequency, InvestmentType, NewExpense, NewIncome, NewInvestment, NewNote,
    NewRecurringExpense, NewSavingsTarget, NewUser,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let db_path = commands::resolve_db_path(&config, cli.db.as_deref())?;
    let today = commands::today();

    match cli.command {
        Commands::Init => commands::cmd_init(&config, &db_path),
        Commands::Status => commands::cmd_status(&config, &db_path),
        Commands::Doctor => {
            let db = commands::open_store(&config, &db_path)?;
            commands::cmd_doctor(&db)
        }
        Commands::Migrate { force, yes } => {
            let db = commands::open_store(&config, &db_path)?;
            commands::cmd_migrate(&db, force, yes)
        }
        Commands::Reset { yes } => commands::cmd_reset(&config, &db_path, yes),
        Commands::Users { action } => {
            let db = commands::open_db(&config, &db_path)?;
            match action {
                None | Some(UsersAction::List) => commands::cmd_users_list(&db),
                Some(UsersAction::Register {
                    username,
                    email,
                    password,
                    full_name,
                }) => commands::cmd_users_register(
                    &db,
                    NewUser {
                        username,
                        email,
                        password,
                        full_name,
                    },
                )
                .map(|_| ()),
                Some(UsersAction::Login { login, password }) => {
                    commands::cmd_users_login(&db, &login, &password)
                }
                Some(UsersAction::Passwd { current, new }) => {
                    let user = commands::current_user(&db, cli.user.as_deref())?;
                    commands::cmd_users_passwd(&db, user.id, &current, &new)
                }
            }
        }
        Commands::Expenses { action } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            match action {
                None => commands::cmd_expenses_list(&db, user.id, None, 20),
                Some(ExpensesAction::Add {
                    amount,
                    description,
                    category,
                    date,
                    notes,
                }) => commands::cmd_expenses_add(
                    &db,
                    user.id,
                    NewExpense {
                        description,
                        amount,
                        category,
                        date: commands::parse_date(&date)?,
                        notes,
                    },
                )
                .map(|_| ()),
                Some(ExpensesAction::List { month, limit }) => {
                    let month = month.as_deref().map(commands::parse_month).transpose()?;
                    commands::cmd_expenses_list(&db, user.id, month, limit)
                }
                Some(ExpensesAction::Delete { id }) => {
                    commands::cmd_expenses_delete(&db, user.id, id)
                }
                Some(ExpensesAction::Categories) => {
                    commands::cmd_expenses_categories(&db, user.id)
                }
            }
        }
        Commands::Incomes { action } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            match action {
                None => commands::cmd_incomes_list(&db, user.id, None, 20),
                Some(IncomesAction::Add {
                    amount,
                    description,
                    category,
                    date,
                    notes,
                }) => commands::cmd_incomes_add(
                    &db,
                    user.id,
                    NewIncome {
                        description,
                        amount,
                        category,
                        date: commands::parse_date(&date)?,
                        notes,
                    },
                )
                .map(|_| ()),
                Some(IncomesAction::List { month, limit }) => {
                    let month = month.as_deref().map(commands::parse_month).transpose()?;
                    commands::cmd_incomes_list(&db, user.id, month, limit)
                }
                Some(IncomesAction::Delete { id }) => {
                    commands::cmd_incomes_delete(&db, user.id, id)
                }
            }
        }
        Commands::Recurring { action } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            match action {
                None => commands::cmd_recurring_list(&db, user.id, false, today),
                Some(RecurringAction::Add {
                    amount,
                    description,
                    category,
                    frequency,
                    start,
                    end,
                    notes,
                }) => {
                    let frequency: Frequency =
                        frequency.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                    commands::cmd_recurring_add(
                        &db,
                        user.id,
                        NewRecurringExpense {
                            description,
                            amount,
                            category,
                            frequency,
                            start_date: commands::parse_date(&start)?,
                            end_date: end.as_deref().map(commands::parse_date).transpose()?,
                            notes,
                        },
                    )
                    .map(|_| ())
                }
                Some(RecurringAction::List { all }) => {
                    commands::cmd_recurring_list(&db, user.id, all, today)
                }
                Some(RecurringAction::Pause { id }) => {
                    commands::cmd_recurring_set_active(&db, user.id, id, false)
                }
                Some(RecurringAction::Resume { id }) => {
                    commands::cmd_recurring_set_active(&db, user.id, id, true)
                }
                Some(RecurringAction::Delete { id }) => {
                    commands::cmd_recurring_delete(&db, user.id, id)
                }
                Some(RecurringAction::Upcoming { days }) => commands::cmd_recurring_upcoming(
                    &db,
                    user.id,
                    today,
                    days.unwrap_or(config.dashboard.upcoming_days),
                ),
            }
        }
        Commands::Savings { action } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            match action {
                None | Some(SavingsAction::List) => commands::cmd_savings_list(&db, user.id, today),
                Some(SavingsAction::Add {
                    name,
                    target,
                    initial,
                    end,
                    category,
                    description,
                }) => commands::cmd_savings_add(
                    &db,
                    user.id,
                    NewSavingsTarget {
                        name,
                        description,
                        target_amount: target,
                        initial_amount: initial,
                        category,
                        start_date: today,
                        end_date: end.as_deref().map(commands::parse_date).transpose()?,
                    },
                )
                .map(|_| ()),
                Some(SavingsAction::Deposit { id, amount, note }) => {
                    commands::cmd_savings_deposit(&db, user.id, id, amount, note.as_deref())
                }
                Some(SavingsAction::Set { id, amount, note }) => {
                    commands::cmd_savings_set(&db, user.id, id, amount, note.as_deref())
                }
                Some(SavingsAction::History { id }) => {
                    commands::cmd_savings_history(&db, user.id, id)
                }
                Some(SavingsAction::Delete { id }) => {
                    commands::cmd_savings_delete(&db, user.id, id)
                }
            }
        }
        Commands::Investments { action } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            match action {
                None | Some(InvestmentsAction::List) => {
                    commands::cmd_investments_list(&db, user.id)
                }
                Some(InvestmentsAction::Add {
                    name,
                    quantity,
                    price,
                    symbol,
                    investment_type,
                    current,
                    currency,
                    date,
                    notes,
                }) => {
                    let investment_type: InvestmentType = investment_type
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!(e))?;
                    commands::cmd_investments_add(
                        &db,
                        user.id,
                        NewInvestment {
                            name,
                            symbol,
                            investment_type,
                            quantity,
                            purchase_price: price,
                            current_price: current,
                            currency,
                            purchase_date: commands::parse_date(&date)?,
                            notes,
                        },
                    )
                    .map(|_| ())
                }
                Some(InvestmentsAction::Price { id, price }) => {
                    commands::cmd_investments_price(&db, user.id, id, price)
                }
                Some(InvestmentsAction::Delete { id }) => {
                    commands::cmd_investments_delete(&db, user.id, id)
                }
            }
        }
        Commands::Notes { action } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            match action {
                None => commands::cmd_notes_list(&db, user.id, None),
                Some(NotesAction::Add {
                    title,
                    content,
                    tags,
                }) => commands::cmd_notes_add(
                    &db,
                    user.id,
                    NewNote {
                        title,
                        content,
                        tags,
                    },
                )
                .map(|_| ()),
                Some(NotesAction::List { tag }) => {
                    commands::cmd_notes_list(&db, user.id, tag.as_deref())
                }
                Some(NotesAction::Search { text }) => {
                    commands::cmd_notes_search(&db, user.id, &text)
                }
                Some(NotesAction::Delete { id }) => commands::cmd_notes_delete(&db, user.id, id),
            }
        }
        Commands::Dashboard { json } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            commands::cmd_dashboard(&db, user.id, today, &config.dashboard, json).await
        }
        Commands::Analysis { month, json } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            let month = month.as_deref().map(commands::parse_month).transpose()?;
            commands::cmd_analysis(&db, user.id, month, today, json).await
        }
        Commands::Trend { months, json } => {
            let db = commands::open_db(&config, &db_path)?;
            let user = commands::current_user(&db, cli.user.as_deref())?;
            let months = months.unwrap_or(config.dashboard.trend_months);
            commands::cmd_trend(&db, user.id, months, today, json).await
        }
    }
}
