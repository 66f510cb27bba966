pub const SCHEMA: &str = r#"
-- Business lines: named spending categories
CREATE TABLE IF NOT EXISTS business_lines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Cost centers: named organizational units that incur cost
CREATE TABLE IF NOT EXISTS cost_centers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Many-to-many relationship between cost centers and business lines.
-- A ledger entry may only pair a cost center with a business line that
-- appears here.
CREATE TABLE IF NOT EXISTS cost_center_business_lines (
    cost_center_id TEXT REFERENCES cost_centers(id) ON DELETE CASCADE,
    business_line_id TEXT REFERENCES business_lines(id) ON DELETE CASCADE,
    PRIMARY KEY (cost_center_id, business_line_id)
);

-- Planned spend. Structurally identical to expenses; kept as separate
-- tables so each side can be queried and aggregated independently.
CREATE TABLE IF NOT EXISTS budgets (
    id TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    entry_type TEXT NOT NULL CHECK (entry_type IN ('CAPEX', 'OPEX')),

    -- Deleting a referenced dimension detaches the entry, never deletes it
    business_line_id TEXT REFERENCES business_lines(id) ON DELETE SET NULL,
    cost_center_id TEXT REFERENCES cost_centers(id) ON DELETE SET NULL,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Actual spend
CREATE TABLE IF NOT EXISTS expenses (
    id TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    entry_type TEXT NOT NULL CHECK (entry_type IN ('CAPEX', 'OPEX')),

    business_line_id TEXT REFERENCES business_lines(id) ON DELETE SET NULL,
    cost_center_id TEXT REFERENCES cost_centers(id) ON DELETE SET NULL,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_ccbl_business_line ON cost_center_business_lines(business_line_id);
CREATE INDEX IF NOT EXISTS idx_budgets_period ON budgets(year, month);
CREATE INDEX IF NOT EXISTS idx_budgets_business_line ON budgets(business_line_id);
CREATE INDEX IF NOT EXISTS idx_budgets_cost_center ON budgets(cost_center_id);
CREATE INDEX IF NOT EXISTS idx_expenses_period ON expenses(year, month);
CREATE INDEX IF NOT EXISTS idx_expenses_business_line ON expenses(business_line_id);
CREATE INDEX IF NOT EXISTS idx_expenses_cost_center ON expenses(cost_center_id);
"#;
