//! Dynamic per-sheet value tables.
//!
//! Each sheet owns one physical table holding its raw/editable cell matrix.
//! Table and column names are derived from analyzer-supplied strings, so
//! everything is sanitized before it reaches SQL, and the mapping
//! sheet id → physical table name lives in `value_tables_registry`.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};

use crate::storage::{Result, ValueTable};

/// Name the surrogate primary key uses in every value table. Logical columns
/// colliding with it are stored under a `data_` prefix.
const SURROGATE_ID: &str = "id";
const RESERVED_RENAME: &str = "data_id";

/// Reduce an arbitrary string to a safe SQL identifier: non-alphanumeric
/// characters become `_`, an empty result becomes `_empty`, and a leading
/// digit gets a `tbl_` prefix.
pub(crate) fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() {
        out.push_str("_empty");
    }
    if out.as_bytes()[0].is_ascii_digit() {
        out.insert_str(0, "tbl_");
    }
    out
}

/// Sanitize column names, renaming collisions with the surrogate id and
/// deduplicating repeats with a numeric suffix.
pub(crate) fn sanitize_columns(column_names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(column_names.len());
    for name in column_names {
        let mut col = sanitize_identifier(name);
        if col.eq_ignore_ascii_case(SURROGATE_ID) {
            col = RESERVED_RENAME.to_string();
        }
        // SQL column names compare case-insensitively.
        let taken = |cand: &str, out: &[String]| out.iter().any(|c| c.eq_ignore_ascii_case(cand));
        if taken(&col, &out) {
            let mut n = 2;
            while taken(&format!("{col}_{n}"), &out) {
                n += 1;
            }
            col = format!("{col}_{n}");
        }
        out.push(col);
    }
    out
}

/// Resolve (and register on first use) the physical table name for a sheet.
/// The name is derived from the sheet name; a registry collision with a
/// different sheet is resolved by appending the sheet id.
pub(crate) fn table_name_for(
    tx: &Transaction<'_>,
    sheet_id: i64,
    sheet_name: &str,
) -> Result<String> {
    if let Some(existing) = registered_table(tx, sheet_id)? {
        return Ok(existing);
    }

    let mut name = format!("values_{}", sanitize_identifier(sheet_name));
    let taken: Option<i64> = tx
        .query_row(
            "SELECT sheet_id FROM value_tables_registry WHERE table_name = ?1",
            params![&name],
            |r| r.get(0),
        )
        .optional()?;
    if taken.is_some() {
        name = format!("{name}_{sheet_id}");
    }

    tx.execute(
        "INSERT OR IGNORE INTO value_tables_registry (sheet_id, table_name) VALUES (?1, ?2)",
        params![sheet_id, &name],
    )?;
    Ok(name)
}

fn registered_table(conn: &Connection, sheet_id: i64) -> Result<Option<String>> {
    let name = conn
        .query_row(
            "SELECT table_name FROM value_tables_registry WHERE sheet_id = ?1",
            params![sheet_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(name)
}

pub(crate) fn physical_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(1))?;
    let mut cols = Vec::new();
    for name in rows {
        let name = name?;
        if name != SURROGATE_ID {
            cols.push(name);
        }
    }
    Ok(cols)
}

/// Create the value table if needed. A table whose column set differs from
/// the requested one is dropped and recreated; old rows never survive a
/// shape change.
pub(crate) fn ensure_table(tx: &Transaction<'_>, table: &str, columns: &[String]) -> Result<()> {
    if table_exists(tx, table)? {
        let existing = physical_columns(tx, table)?;
        if existing == columns {
            return Ok(());
        }
        log::warn!("value table {table} column set changed, dropping and recreating");
        tx.execute(&format!("DROP TABLE \"{table}\""), [])?;
    }

    let mut defs = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    defs.extend(columns.iter().map(|c| format!("\"{c}\" TEXT")));
    tx.execute(
        &format!("CREATE TABLE \"{table}\" ({})", defs.join(", ")),
        [],
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Replace the sheet's rows wholesale. `rows` are already coerced to their
/// canonical text form; short rows are padded with NULL.
pub(crate) fn replace_rows(
    tx: &Transaction<'_>,
    sheet_id: i64,
    sheet_name: &str,
    column_names: &[String],
    rows: &[Vec<Option<String>>],
) -> Result<()> {
    let table = table_name_for(tx, sheet_id, sheet_name)?;
    let columns = sanitize_columns(column_names);
    ensure_table(tx, &table, &columns)?;

    tx.execute(&format!("DELETE FROM \"{table}\""), [])?;
    if columns.is_empty() {
        return Ok(());
    }

    let column_list = columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = tx.prepare(&format!(
        "INSERT INTO \"{table}\" ({column_list}) VALUES ({placeholders})"
    ))?;

    for row in rows {
        let mut tuple: Vec<SqlValue> = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            tuple.push(match row.get(i) {
                Some(Some(text)) => SqlValue::Text(text.clone()),
                _ => SqlValue::Null,
            });
        }
        stmt.execute(params_from_iter(tuple.iter()))?;
    }
    Ok(())
}

/// Load the sheet's rows in insertion order. A sheet without a value table
/// yields an empty structure, not an error.
pub(crate) fn load_rows(conn: &Connection, sheet_id: i64) -> Result<ValueTable> {
    let table = match registered_table(conn, sheet_id)? {
        Some(table) => table,
        None => return Ok(ValueTable::default()),
    };
    let columns = physical_columns(conn, &table)?;
    if columns.is_empty() {
        return Ok(ValueTable::default());
    }

    let column_list = columns
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {column_list} FROM \"{table}\" ORDER BY id"
    ))?;
    let mapped = stmt.query_map([], |r| {
        let mut row = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            row.push(r.get::<_, Option<String>>(i)?);
        }
        Ok(row)
    })?;

    let mut rows = Vec::new();
    for row in mapped {
        rows.push(row?);
    }

    // Reverse the reserved-column rename so callers see their logical names.
    let column_names = columns
        .into_iter()
        .map(|c| {
            if c == RESERVED_RENAME {
                SURROGATE_ID.to_string()
            } else {
                c
            }
        })
        .collect();

    Ok(ValueTable { column_names, rows })
}
