use std::collections::{HashMap, HashSet};

use super::tabular::RawRow;
use crate::error::Result as StoreResult;
use crate::store::Store;
use crate::types::{EntryType, LedgerKind};

/// Reference data snapshot, fetched once per import before the row loop so
/// name resolution and the association check never touch the store per row.
pub struct ReferenceData {
    business_lines: HashMap<String, String>,
    cost_centers: HashMap<String, String>,
    associations: HashSet<(String, String)>,
}

impl ReferenceData {
    pub fn load(store: &dyn Store) -> StoreResult<Self> {
        let business_lines = store
            .list_business_lines()?
            .into_iter()
            .map(|l| (l.name.to_lowercase(), l.id))
            .collect();
        let cost_centers = store
            .list_cost_centers()?
            .into_iter()
            .map(|c| (c.name.to_lowercase(), c.id))
            .collect();
        let associations = store.list_associations()?.into_iter().collect();

        Ok(Self {
            business_lines,
            cost_centers,
            associations,
        })
    }
}

/// All errors found in a single row. Validation never short-circuits, so one
/// upload attempt surfaces every problem in the row at once.
#[derive(Debug)]
pub struct RowFailure {
    pub row: usize,
    pub errors: Vec<String>,
}

impl RowFailure {
    #[must_use]
    pub fn message(&self) -> String {
        format!("Row {}: {}", self.row, self.errors.join("; "))
    }
}

/// A fully validated entry plus its routing tag, ready to persist.
#[derive(Debug)]
pub struct ValidatedEntry {
    pub kind: LedgerKind,
    pub description: String,
    pub amount: f64,
    pub year: i32,
    pub month: i32,
    pub entry_type: EntryType,
    pub business_line_id: Option<String>,
    pub cost_center_id: Option<String>,
}

/// Strips everything that is not a digit, `.` or `-` before parsing, so
/// `"$1,200.50"` comes out as `1200.50`.
#[must_use]
pub fn scrub_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn non_blank<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    row.get(column).map(str::trim).filter(|v| !v.is_empty())
}

fn is_null_literal(value: &str) -> bool {
    value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("undefined")
}

/// Resolves an optional reference cell to `(id, display_name)`. Absent,
/// blank, and literal null cells resolve to nothing without complaint; a
/// present name that matches no known entity is an error.
fn resolve(
    row: &RawRow,
    column: &str,
    names: &HashMap<String, String>,
    errors: &mut Vec<String>,
) -> Option<(String, String)> {
    let raw = non_blank(row, column)?;
    if is_null_literal(raw) {
        return None;
    }
    match names.get(&raw.to_lowercase()) {
        Some(id) => Some((id.clone(), raw.to_string())),
        None => {
            errors.push(format!("unknown {column} '{raw}'"));
            None
        }
    }
}

/// Runs every field rule independently and accumulates all failures; a row
/// either converts cleanly or reports its full list of problems.
pub fn validate_row(
    row: &RawRow,
    refs: &ReferenceData,
) -> std::result::Result<ValidatedEntry, RowFailure> {
    let mut errors = Vec::new();

    let description = match non_blank(row, "description") {
        Some(v) => Some(v.to_string()),
        None => {
            errors.push("missing or empty 'description'".to_string());
            None
        }
    };

    let amount = match non_blank(row, "amount") {
        Some(raw) => match scrub_amount(raw) {
            Some(v) if v > 0.0 => Some(v),
            Some(v) => {
                errors.push(format!("amount must be positive: '{raw}' parsed as {v}"));
                None
            }
            None => {
                errors.push(format!("invalid amount '{raw}'"));
                None
            }
        },
        None => {
            errors.push("missing or empty 'amount'".to_string());
            None
        }
    };

    let year = match non_blank(row, "year") {
        Some(raw) => match raw.parse::<i32>() {
            Ok(y) if (1900..=2100).contains(&y) => Some(y),
            _ => {
                errors.push(format!("invalid year '{raw}' (expected 1900-2100)"));
                None
            }
        },
        None => {
            errors.push("missing or empty 'year'".to_string());
            None
        }
    };

    let month = match non_blank(row, "month") {
        Some(raw) => match raw.parse::<i32>() {
            Ok(m) if (1..=12).contains(&m) => Some(m),
            _ => {
                errors.push(format!("invalid month '{raw}' (expected 1-12)"));
                None
            }
        },
        None => {
            errors.push("missing or empty 'month'".to_string());
            None
        }
    };

    let entry_type = match non_blank(row, "type") {
        Some(raw) => match EntryType::parse(raw) {
            Some(t) => Some(t),
            None => {
                errors.push(format!("invalid type '{raw}' (expected CAPEX or OPEX)"));
                None
            }
        },
        None => {
            errors.push("missing or empty 'type'".to_string());
            None
        }
    };

    // Routing: absent or blank defaults to Budget. An invalid non-empty value
    // is a hard row error rather than a silent default.
    let kind = match non_blank(row, "source") {
        Some(raw) => match LedgerKind::parse(raw) {
            Some(k) => k,
            None => {
                errors.push(format!("invalid source '{raw}' (expected Budget or Expense)"));
                LedgerKind::Budget
            }
        },
        None => LedgerKind::Budget,
    };

    let business_line = resolve(row, "business line", &refs.business_lines, &mut errors);
    let cost_center = resolve(row, "cost center", &refs.cost_centers, &mut errors);

    // Only checked when both sides resolved; a one-sided reference is fine
    if let (Some((bl_id, bl_name)), Some((cc_id, cc_name))) = (&business_line, &cost_center) {
        if !refs.associations.contains(&(cc_id.clone(), bl_id.clone())) {
            errors.push(format!(
                "cost center '{cc_name}' is not associated with business line '{bl_name}'"
            ));
        }
    }

    if errors.is_empty() {
        if let (Some(description), Some(amount), Some(year), Some(month), Some(entry_type)) =
            (description, amount, year, month, entry_type)
        {
            return Ok(ValidatedEntry {
                kind,
                description,
                amount,
                year,
                month,
                entry_type,
                business_line_id: business_line.map(|(id, _)| id),
                cost_center_id: cost_center.map(|(id, _)| id),
            });
        }
    }

    Err(RowFailure {
        row: row.number,
        errors,
    })
}
