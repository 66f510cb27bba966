mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Business line operations
    fn create_business_line(&self, line: &BusinessLine) -> Result<()>;
    fn get_business_line(&self, id: &str) -> Result<Option<BusinessLine>>;
    fn get_business_line_by_name(&self, name: &str) -> Result<Option<BusinessLine>>;
    fn list_business_lines(&self) -> Result<Vec<BusinessLine>>;
    fn update_business_line(&self, line: &BusinessLine) -> Result<()>;
    fn delete_business_line(&self, id: &str) -> Result<bool>;

    // Cost center operations
    fn create_cost_center(&self, center: &CostCenter) -> Result<()>;
    fn get_cost_center(&self, id: &str) -> Result<Option<CostCenter>>;
    fn get_cost_center_by_name(&self, name: &str) -> Result<Option<CostCenter>>;
    fn list_cost_centers(&self) -> Result<Vec<CostCenter>>;
    fn update_cost_center(&self, center: &CostCenter) -> Result<()>;
    fn delete_cost_center(&self, id: &str) -> Result<bool>;

    // Cost center <-> business line M2M operations
    fn add_association(&self, cost_center_id: &str, business_line_id: &str) -> Result<()>;
    fn remove_association(&self, cost_center_id: &str, business_line_id: &str) -> Result<bool>;
    fn set_cost_center_business_lines(
        &self,
        cost_center_id: &str,
        business_line_ids: &[String],
    ) -> Result<()>;
    fn list_cost_center_business_lines(&self, cost_center_id: &str) -> Result<Vec<BusinessLine>>;
    /// All `(cost_center_id, business_line_id)` pairs. The import pipeline
    /// fetches these once up front rather than probing per row.
    fn list_associations(&self) -> Result<Vec<(String, String)>>;
    fn association_exists(&self, cost_center_id: &str, business_line_id: &str) -> Result<bool>;

    // Ledger entry operations, parameterized by destination table
    fn create_entry(&self, kind: LedgerKind, entry: &LedgerEntry) -> Result<()>;
    fn get_entry(&self, kind: LedgerKind, id: &str) -> Result<Option<LedgerEntry>>;
    fn list_entries(
        &self,
        kind: LedgerKind,
        year: Option<i32>,
        month: Option<i32>,
    ) -> Result<Vec<LedgerEntry>>;
    fn update_entry(&self, kind: LedgerKind, entry: &LedgerEntry) -> Result<()>;
    fn delete_entry(&self, kind: LedgerKind, id: &str) -> Result<bool>;
    /// Inserts both batches in a single transaction spanning the two ledger
    /// tables. All rows become visible together or not at all.
    fn insert_import_batch(&self, budgets: &[LedgerEntry], expenses: &[LedgerEntry]) -> Result<()>;

    // Report aggregations
    fn monthly_totals(&self, kind: LedgerKind, year: i32) -> Result<Vec<MonthlyTotal>>;
    fn totals_by_business_line(&self, kind: LedgerKind, year: i32) -> Result<Vec<NamedTotal>>;
    fn totals_by_cost_center(&self, kind: LedgerKind, year: i32) -> Result<Vec<NamedTotal>>;

    fn close(&self) -> Result<()>;
}
