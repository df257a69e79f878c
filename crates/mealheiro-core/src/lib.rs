//! Mealheiro Core Library
//!
//! Shared functionality for the Mealheiro personal finance tracker:
//! - Domain models (expenses, incomes, recurring expenses, savings, investments, notes)
//! - Database access with a self-repairing schema
//! - Store bootstrap, health probes and reset
//! - View aggregation for dashboards, monthly analysis and chart series
//! - TOML configuration with embedded defaults

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod views;

pub use config::{Config, DashboardConfig, DatabaseConfig, SeedUser};
pub use db::{hash_password, Database, InitReport, Table};
pub use error::{Error, Result};
pub use views::{ChartPoint, ChartSeries, Charts, Dashboard, MonthOverMonth, MonthlyAnalysis};
