use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use celldb_model::{
    col_to_name, A1ParseError, CellRef, Chart, DocumentAnalysis, FormulaRecord, RawCell, Scalar,
    SheetAnalysis, StyledRange,
};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};
use thiserror::Error;

use crate::history::HistoryRecord;
use crate::{charts, formulas, history, schema, styles, values};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("project not found: {0}")]
    ProjectNotFound(i64),
    #[error("sheet not found: {0}")]
    SheetNotFound(i64),
    #[error("no sheet named {0:?}")]
    SheetNameNotFound(String),
    #[error("invalid cell address: {0}")]
    Address(#[from] A1ParseError),
    #[error("no cell at {address} in sheet {sheet_id}")]
    CellNotFound { sheet_id: i64, address: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMeta {
    pub id: i64,
    pub name: String,
    /// ISO-8601, UTC.
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetMeta {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub sheet_index: i64,
    pub max_row: Option<i64>,
    pub max_column: Option<i64>,
    pub structure: Option<serde_json::Value>,
}

/// Rows of one sheet value table, in insertion order, with the reserved
/// surrogate-id rename already reversed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Handle to one project database. Cloning shares the underlying connection;
/// the store is single-writer and all operations are synchronous.
#[derive(Debug, Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_uri(uri: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(uri, flags)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ---- projects ----

    pub fn create_project(&self, name: &str) -> Result<ProjectMeta> {
        let created_at = Utc::now().to_rfc3339();
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            "INSERT INTO projects (name, created_at) VALUES (?1, ?2)",
            params![name, created_at],
        )?;
        Ok(ProjectMeta {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            created_at,
        })
    }

    pub fn find_project(&self, name: &str) -> Result<Option<ProjectMeta>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let row = conn
            .query_row(
                "SELECT id, name, created_at FROM projects WHERE name = ?1",
                params![name],
                |r| {
                    Ok(ProjectMeta {
                        id: r.get(0)?,
                        name: r.get(1)?,
                        created_at: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn get_project(&self, id: i64) -> Result<ProjectMeta> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let row = conn
            .query_row(
                "SELECT id, name, created_at FROM projects WHERE id = ?1",
                params![id],
                |r| {
                    Ok(ProjectMeta {
                        id: r.get(0)?,
                        name: r.get(1)?,
                        created_at: r.get(2)?,
                    })
                },
            )
            .optional()?;
        row.ok_or(StorageError::ProjectNotFound(id))
    }

    pub fn set_project_metadata(&self, project_id: i64, key: &str, value: &str) -> Result<()> {
        self.get_project(project_id)?;
        let conn = self.conn.lock().expect("storage mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO project_metadata (project_id, key, value)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(project_id, key) DO UPDATE SET value = excluded.value
            "#,
            params![project_id, key, value],
        )?;
        Ok(())
    }

    pub fn project_metadata(&self, project_id: i64) -> Result<BTreeMap<String, String>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT key, value FROM project_metadata WHERE project_id = ?1 ORDER BY key",
        )?;
        let rows = stmt.query_map(params![project_id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, Option<String>>(1)?))
        })?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            if let Some(value) = value {
                out.insert(key, value);
            }
        }
        Ok(out)
    }

    // ---- sheets ----

    pub fn list_sheets(&self, project_id: i64) -> Result<Vec<SheetMeta>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_id, name, sheet_index, max_row, max_column, structure
            FROM sheets
            WHERE project_id = ?1
            ORDER BY sheet_index, id
            "#,
        )?;
        let rows = stmt.query_map(params![project_id], sheet_meta_from_row)?;
        let mut sheets = Vec::new();
        for sheet in rows {
            sheets.push(sheet?);
        }
        Ok(sheets)
    }

    pub fn get_sheet(&self, sheet_id: i64) -> Result<SheetMeta> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        get_sheet_conn(&conn, sheet_id)
    }

    pub fn find_sheet(&self, project_id: i64, name: &str) -> Result<Option<SheetMeta>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let row = conn
            .query_row(
                r#"
                SELECT id, project_id, name, sheet_index, max_row, max_column, structure
                FROM sheets
                WHERE project_id = ?1 AND name = ?2
                "#,
                params![project_id, name],
                sheet_meta_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Rename a sheet in the registry. The physical value table keeps its
    /// registered name; the registry mapping stays valid.
    pub fn rename_sheet(&self, project_id: i64, old_name: &str, new_name: &str) -> Result<()> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let changed = conn.execute(
            "UPDATE sheets SET name = ?3 WHERE project_id = ?1 AND name = ?2",
            params![project_id, old_name, new_name],
        )?;
        if changed == 0 {
            return Err(StorageError::SheetNameNotFound(old_name.to_string()));
        }
        Ok(())
    }

    // ---- per-sheet stores ----

    pub fn save_value_rows(
        &self,
        sheet_id: i64,
        sheet_name: &str,
        column_names: &[String],
        rows: &[Vec<Option<Scalar>>],
    ) -> Result<()> {
        let coerced: Vec<Vec<Option<String>>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(Scalar::canonical_text))
                    .collect()
            })
            .collect();

        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;
        values::replace_rows(&tx, sheet_id, sheet_name, column_names, &coerced)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_value_rows(&self, sheet_id: i64) -> Result<ValueTable> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        values::load_rows(&conn, sheet_id)
    }

    pub fn save_styled_ranges(&self, sheet_id: i64, ranges: &[StyledRange]) -> Result<()> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;
        styles::replace_styled_ranges(&tx, sheet_id, ranges)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_styled_ranges(&self, sheet_id: i64) -> Result<Vec<StyledRange>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        styles::load_styled_ranges(&conn, sheet_id)
    }

    pub fn save_formulas(&self, sheet_id: i64, formulas: &[FormulaRecord]) -> Result<()> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;
        formulas::replace_formulas(&tx, sheet_id, formulas)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_formulas(&self, sheet_id: i64) -> Result<Vec<FormulaRecord>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        formulas::load_formulas(&conn, sheet_id)
    }

    pub fn save_charts(&self, sheet_id: i64, charts: &[Chart]) -> Result<()> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;
        charts::replace_charts(&tx, sheet_id, charts)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_charts(&self, sheet_id: i64) -> Result<Vec<Chart>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        charts::load_charts(&conn, sheet_id)
    }

    pub fn save_merged_ranges(&self, sheet_id: i64, ranges: &[String]) -> Result<()> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;
        replace_merged_ranges_tx(&tx, sheet_id, ranges)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_merged_ranges(&self, sheet_id: i64) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT range_address FROM merged_cells_ranges WHERE sheet_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![sheet_id], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    // ---- history ----

    #[allow(clippy::too_many_arguments)]
    pub fn append_history(
        &self,
        project_id: i64,
        sheet_id: Option<i64>,
        cell_address: Option<&str>,
        action: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        user: Option<&str>,
        details: Option<&serde_json::Value>,
    ) -> Result<i64> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;
        let id = history::append(
            &tx,
            project_id,
            sheet_id,
            cell_address,
            action,
            old_value,
            new_value,
            user,
            details,
        )?;
        tx.commit()?;
        Ok(id)
    }

    pub fn load_history(&self, sheet_id: Option<i64>, limit: usize) -> Result<Vec<HistoryRecord>> {
        let conn = self.conn.lock().expect("storage mutex poisoned");
        history::load(&conn, sheet_id, limit)
    }

    // ---- cell edits ----

    /// Update one cell of a sheet's value table, identified by A1 address,
    /// and append an edit-history record in the same transaction.
    pub fn update_cell(
        &self,
        sheet_id: i64,
        address: &str,
        new_value: Option<&Scalar>,
        user: Option<&str>,
    ) -> Result<()> {
        let cell = CellRef::from_a1(address)?;
        let new_text = new_value.map(Scalar::canonical_text);

        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let sheet = get_sheet_conn(&conn, sheet_id)?;
        let tx = conn.transaction()?;

        let table = values::table_name_for(&tx, sheet_id, &sheet.name)?;
        let columns = values::physical_columns(&tx, &table)?;
        let column = columns
            .get(cell.col as usize)
            .ok_or_else(|| StorageError::CellNotFound {
                sheet_id,
                address: address.to_string(),
            })?
            .clone();

        let row_id: Option<i64> = tx
            .query_row(
                &format!("SELECT id FROM \"{table}\" ORDER BY id LIMIT 1 OFFSET {}", cell.row),
                [],
                |r| r.get(0),
            )
            .optional()?;
        let row_id = row_id.ok_or_else(|| StorageError::CellNotFound {
            sheet_id,
            address: address.to_string(),
        })?;

        let old_text: Option<String> = tx.query_row(
            &format!("SELECT \"{column}\" FROM \"{table}\" WHERE id = ?1"),
            params![row_id],
            |r| r.get(0),
        )?;
        tx.execute(
            &format!("UPDATE \"{table}\" SET \"{column}\" = ?1 WHERE id = ?2"),
            params![new_text, row_id],
        )?;

        history::append(
            &tx,
            sheet.project_id,
            Some(sheet_id),
            Some(address),
            "update_cell",
            old_text.as_deref(),
            new_text.as_deref(),
            user,
            None,
        )?;

        tx.commit()?;
        Ok(())
    }

    // ---- analysis orchestration ----

    /// Persist one sheet's analysis atomically: sheet registry upsert, value
    /// rows, formulas, styled ranges, charts and merged ranges all commit or
    /// roll back together. Other sheets are unaffected either way.
    pub fn save_sheet_analysis(&self, project_id: i64, sheet: &SheetAnalysis) -> Result<i64> {
        let mut conn = self.conn.lock().expect("storage mutex poisoned");
        let tx = conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM projects WHERE id = ?1",
                params![project_id],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::ProjectNotFound(project_id));
        }

        let sheet_id = upsert_sheet_tx(&tx, project_id, sheet)?;

        let (column_names, rows) =
            tabulate_raw_cells(sheet.max_row, sheet.max_column, &sheet.raw_data);
        values::replace_rows(&tx, sheet_id, &sheet.name, &column_names, &rows)?;
        formulas::replace_formulas(&tx, sheet_id, &sheet.formulas)?;
        styles::replace_styled_ranges(&tx, sheet_id, &sheet.styled_ranges)?;
        charts::replace_charts(&tx, sheet_id, &sheet.charts)?;
        replace_merged_ranges_tx(&tx, sheet_id, &sheet.merged_cells)?;

        tx.commit()?;
        Ok(sheet_id)
    }

    /// Persist every sheet of an analyzed document, one transaction per
    /// sheet. The first failing sheet aborts the run; sheets already saved
    /// stay committed.
    pub fn save_analysis(
        &self,
        project_id: i64,
        analysis: &DocumentAnalysis,
    ) -> Result<Vec<i64>> {
        let mut sheet_ids = Vec::with_capacity(analysis.sheets.len());
        for sheet in &analysis.sheets {
            sheet_ids.push(self.save_sheet_analysis(project_id, sheet)?);
        }
        Ok(sheet_ids)
    }

    /// Get-or-create the project named by the document, then persist all of
    /// its sheets. Returns the project id.
    pub fn save_document(&self, analysis: &DocumentAnalysis) -> Result<i64> {
        let project = match self.find_project(&analysis.project_name)? {
            Some(project) => project,
            None => self.create_project(&analysis.project_name)?,
        };
        self.save_analysis(project.id, analysis)?;
        Ok(project.id)
    }
}

fn sheet_meta_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<SheetMeta> {
    let structure: Option<String> = r.get(6)?;
    Ok(SheetMeta {
        id: r.get(0)?,
        project_id: r.get(1)?,
        name: r.get(2)?,
        sheet_index: r.get(3)?,
        max_row: r.get(4)?,
        max_column: r.get(5)?,
        structure: structure.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

fn get_sheet_conn(conn: &Connection, sheet_id: i64) -> Result<SheetMeta> {
    let row = conn
        .query_row(
            r#"
            SELECT id, project_id, name, sheet_index, max_row, max_column, structure
            FROM sheets
            WHERE id = ?1
            "#,
            params![sheet_id],
            sheet_meta_from_row,
        )
        .optional()?;
    row.ok_or(StorageError::SheetNotFound(sheet_id))
}

fn upsert_sheet_tx(tx: &Transaction<'_>, project_id: i64, sheet: &SheetAnalysis) -> Result<i64> {
    tx.execute(
        r#"
        INSERT INTO sheets (project_id, name, sheet_index, max_row, max_column, structure)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(project_id, name) DO UPDATE SET
          sheet_index = excluded.sheet_index,
          max_row = excluded.max_row,
          max_column = excluded.max_column,
          structure = excluded.structure
        "#,
        params![
            project_id,
            sheet.name,
            sheet.index,
            sheet.max_row,
            sheet.max_column,
            sheet.structure
        ],
    )?;

    let id = tx.query_row(
        "SELECT id FROM sheets WHERE project_id = ?1 AND name = ?2",
        params![project_id, sheet.name],
        |r| r.get(0),
    )?;
    Ok(id)
}

fn replace_merged_ranges_tx(tx: &Transaction<'_>, sheet_id: i64, ranges: &[String]) -> Result<()> {
    tx.execute(
        "DELETE FROM merged_cells_ranges WHERE sheet_id = ?1",
        params![sheet_id],
    )?;
    let mut stmt = tx.prepare(
        "INSERT OR IGNORE INTO merged_cells_ranges (sheet_id, range_address) VALUES (?1, ?2)",
    )?;
    for range in ranges {
        stmt.execute(params![sheet_id, range])?;
    }
    Ok(())
}

/// Turn sparse analyzer cells into a rectangular row set under column-letter
/// names. Unparseable addresses are skipped with a warning.
fn tabulate_raw_cells(
    max_row: u32,
    max_column: u32,
    raw_data: &[RawCell],
) -> (Vec<String>, Vec<Vec<Option<String>>>) {
    let mut placed: Vec<(CellRef, String)> = Vec::with_capacity(raw_data.len());
    let mut rows = max_row as usize;
    let mut cols = max_column as usize;
    for cell in raw_data {
        match CellRef::from_a1(&cell.cell) {
            Ok(reference) => {
                rows = rows.max(reference.row as usize + 1);
                cols = cols.max(reference.col as usize + 1);
                placed.push((reference, cell.value.canonical_text()));
            }
            Err(err) => {
                log::warn!("skipping cell with unparseable address {:?}: {err}", cell.cell);
            }
        }
    }
    if rows == 0 || cols == 0 {
        return (Vec::new(), Vec::new());
    }

    let column_names = (0..cols as u32).map(col_to_name).collect();
    let mut matrix = vec![vec![None; cols]; rows];
    for (reference, text) in placed {
        matrix[reference.row as usize][reference.col as usize] = Some(text);
    }
    (column_names, matrix)
}
