use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Maps UNIQUE/PRIMARY KEY violations on creates to `AlreadyExists`.
fn map_constraint(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::AlreadyExists
        }
        other => Error::Database(other),
    }
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let type_str: String = row.get(5)?;
    let entry_type = EntryType::parse(&type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("invalid entry type: {type_str}").into(),
        )
    })?;

    Ok(LedgerEntry {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        year: row.get(3)?,
        month: row.get(4)?,
        entry_type,
        business_line_id: row.get(6)?,
        cost_center_id: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

const ENTRY_COLUMNS: &str = "id, description, amount, year, month, entry_type, \
                             business_line_id, cost_center_id, created_at, updated_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Business line operations

    fn create_business_line(&self, line: &BusinessLine) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO business_lines (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![line.id, line.name, format_datetime(&line.created_at)],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn get_business_line(&self, id: &str) -> Result<Option<BusinessLine>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, created_at FROM business_lines WHERE id = ?1",
            params![id],
            |row| {
                Ok(BusinessLine {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_business_line_by_name(&self, name: &str) -> Result<Option<BusinessLine>> {
        let conn = self.conn();
        conn.query_row(
            // COLLATE NOCASE on the column makes this lookup case-insensitive
            "SELECT id, name, created_at FROM business_lines WHERE name = ?1",
            params![name],
            |row| {
                Ok(BusinessLine {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_business_lines(&self) -> Result<Vec<BusinessLine>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, created_at FROM business_lines ORDER BY name")?;

        let rows = stmt.query_map([], |row| {
            Ok(BusinessLine {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_business_line(&self, line: &BusinessLine) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE business_lines SET name = ?1 WHERE id = ?2",
            params![line.name, line.id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_business_line(&self, id: &str) -> Result<bool> {
        // Ledger FKs are ON DELETE SET NULL: entries are detached, not removed
        let rows = self
            .conn()
            .execute("DELETE FROM business_lines WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Cost center operations

    fn create_cost_center(&self, center: &CostCenter) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO cost_centers (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![center.id, center.name, format_datetime(&center.created_at)],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn get_cost_center(&self, id: &str) -> Result<Option<CostCenter>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, created_at FROM cost_centers WHERE id = ?1",
            params![id],
            |row| {
                Ok(CostCenter {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_cost_center_by_name(&self, name: &str) -> Result<Option<CostCenter>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, created_at FROM cost_centers WHERE name = ?1",
            params![name],
            |row| {
                Ok(CostCenter {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_cost_centers(&self) -> Result<Vec<CostCenter>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, created_at FROM cost_centers ORDER BY name")?;

        let rows = stmt.query_map([], |row| {
            Ok(CostCenter {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_cost_center(&self, center: &CostCenter) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE cost_centers SET name = ?1 WHERE id = ?2",
            params![center.name, center.id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_cost_center(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM cost_centers WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Cost center <-> business line M2M operations

    fn add_association(&self, cost_center_id: &str, business_line_id: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO cost_center_business_lines (cost_center_id, business_line_id)
                 VALUES (?1, ?2)",
                params![cost_center_id, business_line_id],
            )
            .map_err(map_constraint)?;
        Ok(())
    }

    fn remove_association(&self, cost_center_id: &str, business_line_id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM cost_center_business_lines
             WHERE cost_center_id = ?1 AND business_line_id = ?2",
            params![cost_center_id, business_line_id],
        )?;
        Ok(rows > 0)
    }

    fn set_cost_center_business_lines(
        &self,
        cost_center_id: &str,
        business_line_ids: &[String],
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM cost_center_business_lines WHERE cost_center_id = ?1",
            params![cost_center_id],
        )?;
        for business_line_id in business_line_ids {
            tx.execute(
                "INSERT OR IGNORE INTO cost_center_business_lines (cost_center_id, business_line_id)
                 VALUES (?1, ?2)",
                params![cost_center_id, business_line_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_cost_center_business_lines(&self, cost_center_id: &str) -> Result<Vec<BusinessLine>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT bl.id, bl.name, bl.created_at
             FROM business_lines bl
             JOIN cost_center_business_lines ccbl ON ccbl.business_line_id = bl.id
             WHERE ccbl.cost_center_id = ?1
             ORDER BY bl.name",
        )?;

        let rows = stmt.query_map(params![cost_center_id], |row| {
            Ok(BusinessLine {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_associations(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT cost_center_id, business_line_id FROM cost_center_business_lines")?;

        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn association_exists(&self, cost_center_id: &str, business_line_id: &str) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cost_center_business_lines
             WHERE cost_center_id = ?1 AND business_line_id = ?2",
            params![cost_center_id, business_line_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Ledger entry operations

    fn create_entry(&self, kind: LedgerKind, entry: &LedgerEntry) -> Result<()> {
        self.conn().execute(
            &format!(
                "INSERT INTO {} ({ENTRY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                kind.table()
            ),
            params![
                entry.id,
                entry.description,
                entry.amount,
                entry.year,
                entry.month,
                entry.entry_type.as_str(),
                entry.business_line_id,
                entry.cost_center_id,
                format_datetime(&entry.created_at),
                format_datetime(&entry.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_entry(&self, kind: LedgerKind, id: &str) -> Result<Option<LedgerEntry>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {ENTRY_COLUMNS} FROM {} WHERE id = ?1",
                kind.table()
            ),
            params![id],
            entry_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_entries(
        &self,
        kind: LedgerKind,
        year: Option<i32>,
        month: Option<i32>,
    ) -> Result<Vec<LedgerEntry>> {
        let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM {} WHERE 1=1", kind.table());
        let mut args: Vec<&dyn rusqlite::ToSql> = Vec::new();

        if let Some(ref y) = year {
            sql.push_str(" AND year = ?");
            args.push(y);
        }
        if let Some(ref m) = month {
            sql.push_str(" AND month = ?");
            args.push(m);
        }
        sql.push_str(" ORDER BY year, month, created_at");

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(&args[..], entry_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_entry(&self, kind: LedgerKind, entry: &LedgerEntry) -> Result<()> {
        let rows = self.conn().execute(
            &format!(
                "UPDATE {} SET description = ?1, amount = ?2, year = ?3, month = ?4,
                 entry_type = ?5, business_line_id = ?6, cost_center_id = ?7, updated_at = ?8
                 WHERE id = ?9",
                kind.table()
            ),
            params![
                entry.description,
                entry.amount,
                entry.year,
                entry.month,
                entry.entry_type.as_str(),
                entry.business_line_id,
                entry.cost_center_id,
                format_datetime(&entry.updated_at),
                entry.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_entry(&self, kind: LedgerKind, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
            params![id],
        )?;
        Ok(rows > 0)
    }

    fn insert_import_batch(
        &self,
        budgets: &[LedgerEntry],
        expenses: &[LedgerEntry],
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        for (kind, batch) in [
            (LedgerKind::Budget, budgets),
            (LedgerKind::Expense, expenses),
        ] {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({ENTRY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                kind.table()
            ))?;
            for entry in batch {
                stmt.execute(params![
                    entry.id,
                    entry.description,
                    entry.amount,
                    entry.year,
                    entry.month,
                    entry.entry_type.as_str(),
                    entry.business_line_id,
                    entry.cost_center_id,
                    format_datetime(&entry.created_at),
                    format_datetime(&entry.updated_at),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    // Report aggregations

    fn monthly_totals(&self, kind: LedgerKind, year: i32) -> Result<Vec<MonthlyTotal>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT month,
                    SUM(CASE WHEN entry_type = 'CAPEX' THEN amount ELSE 0 END),
                    SUM(CASE WHEN entry_type = 'OPEX' THEN amount ELSE 0 END)
             FROM {} WHERE year = ?1 GROUP BY month ORDER BY month",
            kind.table()
        ))?;

        let rows = stmt.query_map(params![year], |row| {
            Ok(MonthlyTotal {
                month: row.get(0)?,
                capex: row.get(1)?,
                opex: row.get(2)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn totals_by_business_line(&self, kind: LedgerKind, year: i32) -> Result<Vec<NamedTotal>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT bl.name, SUM(e.amount) AS total
             FROM {} e
             JOIN business_lines bl ON bl.id = e.business_line_id
             WHERE e.year = ?1
             GROUP BY bl.id ORDER BY total DESC",
            kind.table()
        ))?;

        let rows = stmt.query_map(params![year], |row| {
            Ok(NamedTotal {
                name: row.get(0)?,
                total: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn totals_by_cost_center(&self, kind: LedgerKind, year: i32) -> Result<Vec<NamedTotal>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT cc.name, SUM(e.amount) AS total
             FROM {} e
             JOIN cost_centers cc ON cc.id = e.cost_center_id
             WHERE e.year = ?1
             GROUP BY cc.id ORDER BY total DESC",
            kind.table()
        ))?;

        let rows = stmt.query_map(params![year], |row| {
            Ok(NamedTotal {
                name: row.get(0)?,
                total: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
