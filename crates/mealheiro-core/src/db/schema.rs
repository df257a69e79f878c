//! Table and index definitions
//!
//! Table and column names are part of the on-disk layout shared with existing
//! installations, so they keep their PascalCase spelling.

/// Connection-level pragmas applied when the schema is ensured
pub const PRAGMAS: &str = r#"
    -- Enable foreign keys
    PRAGMA foreign_keys = ON;

    -- WAL mode: readers don't block writers
    -- Note: creates -wal and -shm sidecar files alongside the database
    PRAGMA journal_mode = WAL;

    -- Synchronous NORMAL: safe for most power-loss scenarios in WAL mode
    PRAGMA synchronous = NORMAL;

    -- Store temp tables in memory (faster grouping queries)
    PRAGMA temp_store = MEMORY;
"#;

/// Every table except RecurringExpenses, which has its own migration
pub const BASE_SCHEMA: &str = r#"
    -- Users (local profiles)
    CREATE TABLE IF NOT EXISTS Users (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Username VARCHAR(50) NOT NULL UNIQUE,
        Email VARCHAR(100) NOT NULL UNIQUE,
        PasswordHash VARCHAR(255) NOT NULL,
        FullName VARCHAR(100) NULL,
        CreatedAt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        LastLogin DATETIME NULL
    );

    CREATE UNIQUE INDEX IF NOT EXISTS IX_Users_Username ON Users(Username);
    CREATE UNIQUE INDEX IF NOT EXISTS IX_Users_Email ON Users(Email);

    -- Expenses
    CREATE TABLE IF NOT EXISTS Expenses (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Description VARCHAR(200) NOT NULL,
        Amount DECIMAL(18,2) NOT NULL,
        Category VARCHAR(50) NOT NULL,
        Date DATE NOT NULL,
        Notes VARCHAR(500) NULL,
        CreatedAt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UserId INTEGER NOT NULL,
        FOREIGN KEY (UserId) REFERENCES Users(Id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS IX_Expenses_UserId ON Expenses(UserId);
    CREATE INDEX IF NOT EXISTS IX_Expenses_Date ON Expenses(Date);
    CREATE INDEX IF NOT EXISTS IX_Expenses_Category ON Expenses(Category);
    CREATE INDEX IF NOT EXISTS IX_Expenses_UserId_Date ON Expenses(UserId, Date);

    -- Incomes
    CREATE TABLE IF NOT EXISTS Incomes (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Description VARCHAR(200) NOT NULL,
        Amount DECIMAL(18,2) NOT NULL,
        Category VARCHAR(50) NOT NULL,
        Date DATE NOT NULL,
        Notes VARCHAR(500) NULL,
        CreatedAt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UserId INTEGER NOT NULL,
        FOREIGN KEY (UserId) REFERENCES Users(Id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS IX_Incomes_UserId ON Incomes(UserId);
    CREATE INDEX IF NOT EXISTS IX_Incomes_Date ON Incomes(Date);
    CREATE INDEX IF NOT EXISTS IX_Incomes_UserId_Date ON Incomes(UserId, Date);

    -- Savings targets
    CREATE TABLE IF NOT EXISTS SavingsTargets (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Name VARCHAR(100) NOT NULL,
        Description VARCHAR(500) NULL,
        TargetAmount DECIMAL(18,2) NOT NULL,
        CurrentAmount DECIMAL(18,2) NOT NULL DEFAULT 0,
        Category VARCHAR(50) NULL,
        StartDate DATE NOT NULL,
        EndDate DATE NULL,
        IsCompleted INTEGER NOT NULL DEFAULT 0,
        CompletedAt DATETIME NULL,
        CreatedAt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UserId INTEGER NOT NULL,
        FOREIGN KEY (UserId) REFERENCES Users(Id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS IX_SavingsTargets_UserId ON SavingsTargets(UserId);
    CREATE INDEX IF NOT EXISTS IX_SavingsTargets_IsCompleted ON SavingsTargets(IsCompleted);

    -- Savings update history (append-only ledger per target)
    CREATE TABLE IF NOT EXISTS SavingsUpdateHistories (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        SavingsTargetId INTEGER NOT NULL,
        AmountAdded DECIMAL(18,2) NOT NULL,
        PreviousAmount DECIMAL(18,2) NOT NULL,
        NewAmount DECIMAL(18,2) NOT NULL,
        Note VARCHAR(200) NULL,
        UpdatedAt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (SavingsTargetId) REFERENCES SavingsTargets(Id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS IX_SavingsUpdateHistories_SavingsTargetId ON SavingsUpdateHistories(SavingsTargetId);
    CREATE INDEX IF NOT EXISTS IX_SavingsUpdateHistories_UpdatedAt ON SavingsUpdateHistories(UpdatedAt);

    -- Notes
    CREATE TABLE IF NOT EXISTS Notes (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Title VARCHAR(200) NOT NULL,
        Content VARCHAR(5000) NOT NULL DEFAULT '',
        Tags VARCHAR(500) NULL,
        CreatedAt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UpdatedAt DATETIME NULL,
        UserId INTEGER NOT NULL,
        FOREIGN KEY (UserId) REFERENCES Users(Id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS IX_Notes_UserId ON Notes(UserId);
    CREATE INDEX IF NOT EXISTS IX_Notes_CreatedAt ON Notes(CreatedAt);

    -- Investments
    CREATE TABLE IF NOT EXISTS Investments (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Name VARCHAR(100) NOT NULL,
        Symbol VARCHAR(20) NULL,
        InvestmentType VARCHAR(50) NOT NULL DEFAULT 'Other',
        Quantity DECIMAL(18,6) NOT NULL,
        PurchasePrice DECIMAL(18,2) NOT NULL,
        CurrentPrice DECIMAL(18,2) NULL,
        Amount DECIMAL(18,2) NOT NULL,
        Currency VARCHAR(3) NOT NULL DEFAULT 'EUR',
        PurchaseDate DATE NOT NULL,
        Notes VARCHAR(500) NULL,
        CreatedAt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        LastUpdated DATETIME NULL,
        UserId INTEGER NOT NULL,
        FOREIGN KEY (UserId) REFERENCES Users(Id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS IX_Investments_UserId ON Investments(UserId);
    CREATE INDEX IF NOT EXISTS IX_Investments_InvestmentType ON Investments(InvestmentType);
"#;

/// Recurring expenses table, kept byte-for-byte compatible with existing stores
pub const RECURRING_EXPENSES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS RecurringExpenses (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Description VARCHAR(200) NOT NULL,
        Amount DECIMAL(18,2) NOT NULL,
        Category VARCHAR(50) NOT NULL,
        Frequency VARCHAR(20) NOT NULL DEFAULT 'Monthly',
        StartDate DATE NOT NULL,
        EndDate DATE NULL,
        LastProcessed DATE NULL,
        Notes VARCHAR(500) NULL,
        CreatedAt DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        IsActive INTEGER NOT NULL DEFAULT 1,
        UserId INTEGER NOT NULL,
        FOREIGN KEY (UserId) REFERENCES Users(Id) ON DELETE CASCADE
    )
"#;

/// The ten recurring-expense indexes, by name
pub const RECURRING_EXPENSE_INDEXES: [(&str, &str); 10] = [
    (
        "IX_RecurringExpenses_UserId",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_UserId ON RecurringExpenses(UserId)",
    ),
    (
        "IX_RecurringExpenses_Category",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_Category ON RecurringExpenses(Category)",
    ),
    (
        "IX_RecurringExpenses_Frequency",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_Frequency ON RecurringExpenses(Frequency)",
    ),
    (
        "IX_RecurringExpenses_StartDate",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_StartDate ON RecurringExpenses(StartDate)",
    ),
    (
        "IX_RecurringExpenses_EndDate",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_EndDate ON RecurringExpenses(EndDate)",
    ),
    (
        "IX_RecurringExpenses_IsActive",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_IsActive ON RecurringExpenses(IsActive)",
    ),
    (
        "IX_RecurringExpenses_LastProcessed",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_LastProcessed ON RecurringExpenses(LastProcessed)",
    ),
    (
        "IX_RecurringExpenses_CreatedAt",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_CreatedAt ON RecurringExpenses(CreatedAt)",
    ),
    (
        "IX_RecurringExpenses_UserId_IsActive",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_UserId_IsActive ON RecurringExpenses(UserId, IsActive)",
    ),
    (
        "IX_RecurringExpenses_IsActive_StartDate",
        "CREATE INDEX IF NOT EXISTS IX_RecurringExpenses_IsActive_StartDate ON RecurringExpenses(IsActive, StartDate)",
    ),
];
