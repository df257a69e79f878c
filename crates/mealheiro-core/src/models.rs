//! Domain models for Mealheiro

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Round to whole cents, matching the store's DECIMAL(18,2) columns
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidData(format!("{} is required", field)));
    }
    limit_text(field, value, max)
}

fn limit_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::InvalidData(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn limit_optional(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) => limit_text(field, v, max),
        None => Ok(()),
    }
}

fn require_positive(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidData(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(())
}

// ========== Users ==========

/// A local user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Full name when set, username otherwise
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

/// Registration data for a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        require_text("Username", &self.username, 50)?;
        require_text("Email", &self.email, 100)?;
        if !self.email.contains('@') {
            return Err(Error::InvalidData(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        if self.password.chars().count() < 6 {
            return Err(Error::InvalidData(
                "Password must be at least 6 characters".to_string(),
            ));
        }
        limit_optional("Full name", self.full_name.as_deref(), 100)
    }
}

// ========== Expenses & Incomes ==========

/// A single expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for creating or editing an expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<()> {
        validate_entry(
            &self.description,
            self.amount,
            &self.category,
            self.notes.as_deref(),
        )
    }
}

/// A single income
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for creating or editing an income
#[derive(Debug, Clone)]
pub struct NewIncome {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

impl NewIncome {
    pub fn validate(&self) -> Result<()> {
        validate_entry(
            &self.description,
            self.amount,
            &self.category,
            self.notes.as_deref(),
        )
    }
}

fn validate_entry(description: &str, amount: f64, category: &str, notes: Option<&str>) -> Result<()> {
    require_text("Description", description, 200)?;
    require_positive("Amount", amount)?;
    require_text("Category", category, 50)?;
    limit_optional("Notes", notes, 500)
}

// ========== Recurring Expenses ==========

/// Cadence of a recurring expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Yearly => "Yearly",
        }
    }

    pub fn all() -> &'static [Frequency] {
        &[
            Self::Daily,
            Self::Weekly,
            Self::Monthly,
            Self::Quarterly,
            Self::Yearly,
        ]
    }

    /// Parse a stored or user-supplied cadence, treating anything unknown as monthly
    pub fn parse_or_monthly(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// How many occurrences of this cadence fit in one month, on average
    pub fn occurrences_per_month(&self) -> f64 {
        match self {
            Self::Daily => 365.0 / 12.0,
            Self::Weekly => 52.0 / 12.0,
            Self::Monthly => 1.0,
            Self::Quarterly => 1.0 / 3.0,
            Self::Yearly => 1.0 / 12.0,
        }
    }

    /// The occurrence one cadence after `date`
    ///
    /// Month-based cadences clamp to the end of a shorter month, and the
    /// clamped day carries into later steps (Jan 31 → Feb 29 → Mar 29).
    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Daily => date.checked_add_days(Days::new(1)),
            Self::Weekly => date.checked_add_days(Days::new(7)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Quarterly => date.checked_add_months(Months::new(3)),
            Self::Yearly => date.checked_add_months(Months::new(12)),
        }
    }

    /// First occurrence on or after `today` for a schedule starting at `start`
    pub fn first_on_or_after(&self, start: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
        if start >= today {
            return Some(start);
        }

        // Day-based cadences never clamp, so the step count can be jumped
        let days = (today - start).num_days();
        let mut current = match self {
            Self::Daily => return Some(today),
            Self::Weekly => {
                let weeks = (days + 6) / 7;
                return start.checked_add_days(Days::new(u64::try_from(weeks * 7).ok()?));
            }
            _ => start,
        };

        while current < today {
            current = self.advance(current)?;
        }
        Some(current)
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "diario" | "diário" | "diaria" | "diária" => Ok(Self::Daily),
            "weekly" | "semanal" => Ok(Self::Weekly),
            "monthly" | "mensal" => Ok(Self::Monthly),
            "quarterly" | "trimestral" => Ok(Self::Quarterly),
            "yearly" | "annual" | "annually" | "anual" => Ok(Self::Yearly),
            _ => Err(format!(
                "Unknown frequency: {} (valid: daily, weekly, monthly, quarterly, yearly)",
                s
            )),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expense that repeats on a fixed cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringExpense {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Carried for compatibility; nothing in Mealheiro advances it
    pub last_processed: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl RecurringExpense {
    /// Next due date on or after `today`, if the schedule is still running
    pub fn next_occurrence(&self, today: NaiveDate) -> Option<NaiveDate> {
        if !self.is_active {
            return None;
        }
        if matches!(self.end_date, Some(end) if end < today) {
            return None;
        }

        let next = self.frequency.first_on_or_after(self.start_date, today)?;
        match self.end_date {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    /// Amount normalized to a monthly cost
    pub fn monthly_equivalent(&self) -> f64 {
        round_cents(self.amount * self.frequency.occurrences_per_month())
    }

    pub fn is_due_within(&self, today: NaiveDate, days: i64) -> bool {
        self.next_occurrence(today)
            .map(|due| (due - today).num_days() <= days)
            .unwrap_or(false)
    }
}

/// Data for creating or editing a recurring expense
#[derive(Debug, Clone)]
pub struct NewRecurringExpense {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewRecurringExpense {
    pub fn validate(&self) -> Result<()> {
        validate_entry(
            &self.description,
            self.amount,
            &self.category,
            self.notes.as_deref(),
        )?;
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(Error::InvalidData(
                    "End date must not be before the start date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A recurring expense due inside an upcoming window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingPayment {
    pub recurring_id: i64,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub due: NaiveDate,
    pub days_until: i64,
}

// ========== Savings ==========

/// A savings goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsTarget {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    pub category: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Result of moving a target's current amount
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsChange {
    pub previous_amount: f64,
    pub new_amount: f64,
    /// Actual delta after clamping, so `previous + added == new`
    pub amount_added: f64,
}

impl SavingsTarget {
    /// Progress toward the target, capped at 100
    pub fn progress_percentage(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).clamp(0.0, 100.0)
    }

    pub fn remaining_amount(&self) -> f64 {
        round_cents((self.target_amount - self.current_amount).max(0.0))
    }

    /// Days left until the end date (negative once overdue)
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.end_date.map(|end| (end - today).num_days())
    }

    /// Set the current amount, clamped at zero, and recompute completion
    pub fn apply_amount(&mut self, amount: f64, now: DateTime<Utc>) -> SavingsChange {
        let previous_amount = self.current_amount;
        let new_amount = round_cents(amount.max(0.0));
        self.current_amount = new_amount;
        self.recompute_completion(now);

        SavingsChange {
            previous_amount,
            new_amount,
            amount_added: round_cents(new_amount - previous_amount),
        }
    }

    pub fn recompute_completion(&mut self, now: DateTime<Utc>) {
        let completed = self.current_amount >= self.target_amount;
        if completed && !self.is_completed {
            self.completed_at = Some(now);
        } else if !completed {
            self.completed_at = None;
        }
        self.is_completed = completed;
    }
}

/// Data for creating or editing a savings target
#[derive(Debug, Clone)]
pub struct NewSavingsTarget {
    pub name: String,
    pub description: Option<String>,
    pub target_amount: f64,
    /// Only used on creation; edits go through the amount operations
    pub initial_amount: f64,
    pub category: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl NewSavingsTarget {
    pub fn validate(&self) -> Result<()> {
        require_text("Name", &self.name, 100)?;
        limit_optional("Description", self.description.as_deref(), 500)?;
        limit_optional("Category", self.category.as_deref(), 50)?;
        require_positive("Target amount", self.target_amount)?;
        if !self.initial_amount.is_finite() {
            return Err(Error::InvalidData("Initial amount must be a number".to_string()));
        }
        Ok(())
    }
}

/// One entry in a target's append-only ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsUpdate {
    pub id: i64,
    pub savings_target_id: i64,
    pub amount_added: f64,
    pub previous_amount: f64,
    pub new_amount: f64,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Totals across a user's savings targets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub target_count: i64,
    pub completed_count: i64,
    pub total_saved: f64,
    pub total_target: f64,
    pub overall_progress: f64,
}

// ========== Investments ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InvestmentType {
    Stock,
    Etf,
    Fund,
    Bond,
    Crypto,
    Deposit,
    RealEstate,
    #[default]
    Other,
}

impl InvestmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "Stock",
            Self::Etf => "ETF",
            Self::Fund => "Fund",
            Self::Bond => "Bond",
            Self::Crypto => "Crypto",
            Self::Deposit => "Deposit",
            Self::RealEstate => "RealEstate",
            Self::Other => "Other",
        }
    }

    pub fn all() -> &'static [InvestmentType] {
        &[
            Self::Stock,
            Self::Etf,
            Self::Fund,
            Self::Bond,
            Self::Crypto,
            Self::Deposit,
            Self::RealEstate,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for InvestmentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" | "stocks" | "acoes" | "ações" => Ok(Self::Stock),
            "etf" => Ok(Self::Etf),
            "fund" | "fundo" => Ok(Self::Fund),
            "bond" | "bonds" | "obrigacoes" | "obrigações" => Ok(Self::Bond),
            "crypto" | "cripto" => Ok(Self::Crypto),
            "deposit" | "deposito" | "depósito" => Ok(Self::Deposit),
            "realestate" | "real_estate" | "imobiliario" | "imobiliário" => Ok(Self::RealEstate),
            "other" | "outro" => Ok(Self::Other),
            _ => Err(format!("Unknown investment type: {}", s)),
        }
    }
}

impl std::fmt::Display for InvestmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A holding in the user's portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub symbol: Option<String>,
    pub investment_type: InvestmentType,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: Option<f64>,
    /// Amount invested at entry (quantity × purchase price)
    pub amount: f64,
    pub currency: String,
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Investment {
    pub fn current_value(&self) -> f64 {
        match self.current_price {
            Some(price) => round_cents(self.quantity * price),
            None => self.amount,
        }
    }

    pub fn profit_loss(&self) -> f64 {
        round_cents(self.current_value() - self.amount)
    }

    pub fn profit_loss_percentage(&self) -> f64 {
        if self.amount > 0.0 {
            self.profit_loss() / self.amount * 100.0
        } else {
            0.0
        }
    }
}

/// Data for creating or editing an investment
#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub name: String,
    pub symbol: Option<String>,
    pub investment_type: InvestmentType,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: Option<f64>,
    pub currency: String,
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
}

impl NewInvestment {
    pub fn validate(&self) -> Result<()> {
        require_text("Name", &self.name, 100)?;
        limit_optional("Symbol", self.symbol.as_deref(), 20)?;
        require_positive("Quantity", self.quantity)?;
        require_positive("Purchase price", self.purchase_price)?;
        if let Some(price) = self.current_price {
            require_positive("Current price", price)?;
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidData(format!(
                "Currency must be a 3-letter code: {}",
                self.currency
            )));
        }
        limit_optional("Notes", self.notes.as_deref(), 500)
    }

    pub fn invested_amount(&self) -> f64 {
        round_cents(self.quantity * self.purchase_price)
    }
}

/// Portfolio totals for one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub investment_count: i64,
    pub total_invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
    pub by_type: Vec<CategoryTotal>,
}

// ========== Notes ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Note {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(split_tags)
            .unwrap_or_default()
    }
}

/// Split a comma-separated tag string into trimmed, non-empty tags
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Option<String>,
}

impl NewNote {
    pub fn validate(&self) -> Result<()> {
        require_text("Title", &self.title, 200)?;
        limit_text("Content", &self.content, 5000)?;
        limit_optional("Tags", self.tags.as_deref(), 500)
    }
}

// ========== Report Models ==========

/// An inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Last day of the month containing `date`
pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(Error::InvalidData(format!(
                "Invalid range: {} is after {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// The whole calendar month
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidData(format!("Invalid month: {}-{}", year, month)))?;
        Ok(Self::containing(first))
    }

    /// The calendar month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            from: first_of_month(date),
            to: last_of_month(date),
        }
    }

    /// The calendar month before this range's start
    pub fn previous_month(&self) -> Self {
        let prev = first_of_month(self.from).pred_opt().unwrap_or(self.from);
        Self::containing(prev)
    }

    /// `months` whole calendar months ending with the month containing `today`
    pub fn last_months(today: NaiveDate, months: u32) -> Self {
        let back = months.saturating_sub(1);
        let from = first_of_month(today)
            .checked_sub_months(Months::new(back))
            .unwrap_or_else(|| first_of_month(today));
        Self {
            from,
            to: last_of_month(today),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Number of days in the window, both ends included
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// "YYYY-MM" label of the starting month
    pub fn month_label(&self) -> String {
        format!("{:04}-{:02}", self.from.year(), self.from.month())
    }
}

/// Amount grouped under one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
    pub count: i64,
    pub percentage: f64,
}

/// Amount for one calendar month in a trend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub amount: f64,
    pub count: i64,
}

/// Row counts per table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub users: i64,
    pub expenses: i64,
    pub incomes: i64,
    pub recurring_expenses: i64,
    pub savings_targets: i64,
    pub savings_updates: i64,
    pub investments: i64,
    pub notes: i64,
}
