//! Append-only edit history.
//!
//! History rows are immutable: no update or delete API exists, and none may
//! be added. Timestamps are generated server-side in ISO-8601 and are
//! monotonic per process, so insertion order and timestamp order agree.

use chrono::Utc;
use rusqlite::{params, Connection, Transaction};

use crate::storage::Result;

/// One immutable history row.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub history_id: i64,
    pub project_id: i64,
    pub sheet_id: Option<i64>,
    pub cell_address: Option<String>,
    pub action: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// ISO-8601, UTC.
    pub edited_at: String,
    pub user: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn append(
    tx: &Transaction<'_>,
    project_id: i64,
    sheet_id: Option<i64>,
    cell_address: Option<&str>,
    action: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
    user: Option<&str>,
    details: Option<&serde_json::Value>,
) -> Result<i64> {
    let edited_at = Utc::now().to_rfc3339();
    tx.execute(
        r#"
        INSERT INTO edit_history (
          project_id, sheet_id, cell_address, action, old_value, new_value,
          edited_at, user, details
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            project_id,
            sheet_id,
            cell_address,
            action,
            old_value,
            new_value,
            edited_at,
            user,
            details
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Load history rows newest first, optionally filtered by sheet.
pub(crate) fn load(
    conn: &Connection,
    sheet_id: Option<i64>,
    limit: usize,
) -> Result<Vec<HistoryRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT history_id, project_id, sheet_id, cell_address, action,
               old_value, new_value, edited_at, user, details
        FROM edit_history
        WHERE ?1 IS NULL OR sheet_id = ?1
        ORDER BY edited_at DESC, history_id DESC
        LIMIT ?2
        "#,
    )?;
    let rows = stmt.query_map(params![sheet_id, limit as i64], |r| {
        let details: Option<String> = r.get(9)?;
        Ok((
            HistoryRecord {
                history_id: r.get(0)?,
                project_id: r.get(1)?,
                sheet_id: r.get(2)?,
                cell_address: r.get(3)?,
                action: r.get(4)?,
                old_value: r.get(5)?,
                new_value: r.get(6)?,
                edited_at: r.get(7)?,
                user: r.get(8)?,
                details: None,
            },
            details,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (mut record, details) = row?;
        record.details = match details.as_deref() {
            None | Some("") => None,
            Some(encoded) => match serde_json::from_str(encoded) {
                Ok(value) => Some(value),
                Err(err) => {
                    log::warn!(
                        "malformed details blob on history row {}: {err}",
                        record.history_id
                    );
                    None
                }
            },
        };
        out.push(record);
    }
    Ok(out)
}
