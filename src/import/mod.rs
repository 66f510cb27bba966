//! Spreadsheet/CSV import reconciliation pipeline.
//!
//! Two-phase: the whole file is parsed and every row validated in memory
//! first; only a fully clean file is persisted, in a single transaction
//! spanning both ledger tables. Any row error blocks the entire file, so one
//! upload attempt surfaces the maximal amount of actionable feedback.
//!
//! There is no deduplication: re-importing the same file after a successful
//! run creates duplicate entries, since a ledger line has no natural
//! external key.

mod tabular;
mod validate;

pub use tabular::{FileKind, RawRow, normalize_header};
pub use validate::{ReferenceData, RowFailure, ValidatedEntry, scrub_amount, validate_row};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::Store;
use crate::types::{LedgerEntry, LedgerKind};

/// At most this many row errors are spelled out in a failure message; the
/// rest are summarized as a count.
pub const MAX_DISPLAYED_ERRORS: usize = 10;

/// Hard cap on data rows per upload; the whole file is held in memory.
pub const MAX_ROWS: usize = 10_000;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type (expected .csv or .xlsx)")]
    UnsupportedFileType,

    #[error("could not read file: {0}")]
    CorruptFile(String),

    #[error("the file contains no data rows")]
    EmptyInput,

    #[error("the file has too many rows ({0}, maximum {MAX_ROWS})")]
    TooManyRows(usize),

    /// Every data row failed validation.
    #[error("{}", format_failures("No valid rows to import", .failures))]
    NoValidRows { failures: Vec<RowFailure> },

    /// Some rows were valid, but at least one failed; nothing is inserted.
    #[error("{}", format_failures("Import aborted, no rows were saved", .failures))]
    RowErrors { failures: Vec<RowFailure> },

    #[error("import failed while saving: {0}")]
    Persistence(String),
}

fn format_failures(header: &str, failures: &[RowFailure]) -> String {
    let mut lines: Vec<String> = failures
        .iter()
        .take(MAX_DISPLAYED_ERRORS)
        .map(RowFailure::message)
        .collect();
    if failures.len() > MAX_DISPLAYED_ERRORS {
        lines.push(format!(
            "(+{} more errors)",
            failures.len() - MAX_DISPLAYED_ERRORS
        ));
    }
    format!("{header}:\n{}", lines.join("\n"))
}

/// Uniform result surfaced to the caller. Every pipeline error is folded
/// into `{success: false, message}`; nothing propagates as a panic.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Debug)]
struct ImportSummary {
    budget_rows: usize,
    expense_rows: usize,
}

pub fn import_file(store: &dyn Store, filename: &str, data: &[u8]) -> ImportOutcome {
    match run(store, filename, data) {
        Ok(summary) => {
            tracing::info!(
                "imported {} budget and {} expense entries from '{}'",
                summary.budget_rows,
                summary.expense_rows,
                filename
            );
            ImportOutcome {
                success: true,
                message: format!(
                    "Imported {} budget entries and {} expense entries",
                    summary.budget_rows, summary.expense_rows
                ),
            }
        }
        Err(err) => {
            tracing::warn!("import of '{}' failed: {}", filename, err);
            ImportOutcome {
                success: false,
                message: err.to_string(),
            }
        }
    }
}

fn run(store: &dyn Store, filename: &str, data: &[u8]) -> Result<ImportSummary, ImportError> {
    let kind = FileKind::from_name(filename).ok_or(ImportError::UnsupportedFileType)?;

    let rows = tabular::parse_rows(kind, data)?;
    if rows.is_empty() {
        return Err(ImportError::EmptyInput);
    }
    if rows.len() > MAX_ROWS {
        return Err(ImportError::TooManyRows(rows.len()));
    }

    // One round trip for reference data, one transactional round trip to
    // insert; the row loop never touches the store.
    let refs = ReferenceData::load(store).map_err(|e| ImportError::Persistence(e.to_string()))?;

    let now = Utc::now();
    let mut budgets = Vec::new();
    let mut expenses = Vec::new();
    let mut failures = Vec::new();

    for row in &rows {
        match validate_row(row, &refs) {
            Ok(valid) => {
                let entry = LedgerEntry {
                    id: Uuid::new_v4().to_string(),
                    description: valid.description,
                    amount: valid.amount,
                    year: valid.year,
                    month: valid.month,
                    entry_type: valid.entry_type,
                    business_line_id: valid.business_line_id,
                    cost_center_id: valid.cost_center_id,
                    created_at: now,
                    updated_at: now,
                };
                match valid.kind {
                    LedgerKind::Budget => budgets.push(entry),
                    LedgerKind::Expense => expenses.push(entry),
                }
            }
            Err(failure) => failures.push(failure),
        }
    }

    if !failures.is_empty() {
        let valid = budgets.len() + expenses.len();
        return Err(if valid == 0 {
            ImportError::NoValidRows { failures }
        } else {
            ImportError::RowErrors { failures }
        });
    }

    store
        .insert_import_batch(&budgets, &expenses)
        .map_err(|e| ImportError::Persistence(e.to_string()))?;

    Ok(ImportSummary {
        budget_rows: budgets.len(),
        expense_rows: expenses.len(),
    })
}
