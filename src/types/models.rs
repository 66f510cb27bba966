use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named organizational spending category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessLine {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A named organizational unit that incurs cost. Related to business lines
/// many-to-many through the association table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostCenter {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// CAPEX/OPEX classification of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Capex,
    Opex,
}

impl EntryType {
    /// Case-insensitive parse. Tolerates surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAPEX" => Some(Self::Capex),
            "OPEX" => Some(Self::Opex),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Capex => "CAPEX",
            Self::Opex => "OPEX",
        }
    }
}

/// Which of the two ledger tables an entry belongs to: planned spend
/// (budgets) or actual spend (expenses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Budget,
    Expense,
}

impl LedgerKind {
    /// Case-insensitive parse of an import `source` cell.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "budget" => Some(Self::Budget),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Budget => "budgets",
            Self::Expense => "expenses",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Expense => "expense",
        }
    }
}

/// A dated, typed, amount-bearing record. Budgets and expenses share this
/// shape; `LedgerKind` selects the destination table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub year: i32,
    pub month: i32,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_line_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_center_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-month CAPEX/OPEX totals for one ledger table.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTotal {
    pub month: i32,
    pub capex: f64,
    pub opex: f64,
}

/// Total spend attributed to one named dimension (business line or cost
/// center) over a report period.
#[derive(Debug, Clone, Serialize)]
pub struct NamedTotal {
    pub name: String,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_parse() {
        assert_eq!(EntryType::parse("CAPEX"), Some(EntryType::Capex));
        assert_eq!(EntryType::parse("  opex "), Some(EntryType::Opex));
        assert_eq!(EntryType::parse("Capex"), Some(EntryType::Capex));
        assert_eq!(EntryType::parse("capital"), None);
        assert_eq!(EntryType::parse(""), None);
    }

    #[test]
    fn test_ledger_kind_parse() {
        assert_eq!(LedgerKind::parse("Budget"), Some(LedgerKind::Budget));
        assert_eq!(LedgerKind::parse(" EXPENSE "), Some(LedgerKind::Expense));
        assert_eq!(LedgerKind::parse("actual"), None);
    }
}
