//! Formula store: one row per formula cell plus its serialized reference
//! list.

use celldb_model::FormulaRecord;
use rusqlite::{params, Connection, Transaction};

use crate::storage::Result;

/// Replace a sheet's formulas wholesale. Reference lists are stored as JSON
/// string arrays.
pub(crate) fn replace_formulas(
    tx: &Transaction<'_>,
    sheet_id: i64,
    formulas: &[FormulaRecord],
) -> Result<()> {
    tx.execute("DELETE FROM formulas WHERE sheet_id = ?1", params![sheet_id])?;

    let mut stmt = tx.prepare(
        r#"
        INSERT INTO formulas (sheet_id, cell, formula, "references")
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )?;
    for record in formulas {
        let references = serde_json::to_string(&record.references)?;
        stmt.execute(params![sheet_id, record.cell, record.formula, references])?;
    }
    Ok(())
}

/// Load a sheet's formulas. A malformed reference encoding degrades to an
/// empty list with a warning; the row itself is still returned.
pub(crate) fn load_formulas(conn: &Connection, sheet_id: i64) -> Result<Vec<FormulaRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT cell, formula, "references"
        FROM formulas
        WHERE sheet_id = ?1
        ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map(params![sheet_id], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (cell, formula, references) = row?;
        let references = match references.as_deref() {
            None | Some("") => Vec::new(),
            Some(encoded) => match serde_json::from_str::<Vec<String>>(encoded) {
                Ok(refs) => refs,
                Err(err) => {
                    log::warn!("malformed reference list for formula cell {cell}: {err}");
                    Vec::new()
                }
            },
        };
        out.push(FormulaRecord {
            cell,
            formula,
            references,
        });
    }
    Ok(out)
}
