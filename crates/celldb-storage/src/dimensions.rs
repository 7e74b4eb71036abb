//! Style dimension tables (fonts, fills, borders, alignments, protections).
//!
//! Each dimension row is an immutable value object deduplicated by its full
//! attribute tuple. SQLite's UNIQUE constraint treats NULLs as distinct, so
//! dedup is guaranteed by a NULL-safe `SELECT ... IS ?` before any insert,
//! not by the constraint alone.

use celldb_model::{AttrValue, StyleAttrs};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, OptionalExtension, Transaction};

use crate::storage::Result;

/// Descriptor for one dimension kind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Dimension {
    pub table: &'static str,
    /// Prefix that routes flat style attributes to this dimension
    /// (e.g. `font_` routes `font_b` to the `b` column of `fonts`).
    pub prefix: &'static str,
    pub columns: &'static [&'static str],
}

pub(crate) const FONT: Dimension = Dimension {
    table: "fonts",
    prefix: "font_",
    columns: &[
        "name",
        "sz",
        "b",
        "i",
        "u",
        "strike",
        "color",
        "color_theme",
        "color_tint",
        "vert_align",
        "scheme",
    ],
};

pub(crate) const FILL: Dimension = Dimension {
    table: "pattern_fills",
    prefix: "fill_",
    columns: &["pattern_type", "fg_color", "bg_color"],
};

pub(crate) const BORDER: Dimension = Dimension {
    table: "borders",
    prefix: "border_",
    columns: &[
        "left",
        "right",
        "top",
        "bottom",
        "diagonal",
        "left_color",
        "right_color",
        "top_color",
        "bottom_color",
        "diagonal_color",
    ],
};

pub(crate) const ALIGNMENT: Dimension = Dimension {
    table: "alignments",
    prefix: "alignment_",
    columns: &[
        "horizontal",
        "vertical",
        "wrap_text",
        "shrink_to_fit",
        "indent",
        "text_rotation",
    ],
};

pub(crate) const PROTECTION: Dimension = Dimension {
    table: "protections",
    prefix: "protection_",
    columns: &["locked", "hidden"],
};

pub(crate) fn attr_to_sql(value: &AttrValue) -> SqlValue {
    match value {
        AttrValue::Int(i) => SqlValue::Integer(*i),
        AttrValue::Real(r) => SqlValue::Real(*r),
        AttrValue::Text(s) => SqlValue::Text(s.clone()),
    }
}

pub(crate) fn sql_to_attr(value: SqlValue) -> Option<AttrValue> {
    match value {
        SqlValue::Integer(i) => Some(AttrValue::Int(i)),
        SqlValue::Real(r) => Some(AttrValue::Real(r)),
        SqlValue::Text(s) => Some(AttrValue::Text(s)),
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
}

/// Resolve `attrs` against one dimension table, creating the row if it does
/// not exist yet. An empty attribute map means the dimension is not applied
/// and yields `None`.
///
/// Repeated calls with identical attributes always return the same id. The
/// select runs first and uses `IS` so that absent attributes (stored as NULL)
/// compare equal.
pub(crate) fn get_or_create(
    tx: &Transaction<'_>,
    dim: &Dimension,
    attrs: &StyleAttrs,
) -> Result<Option<i64>> {
    if attrs.is_empty() {
        return Ok(None);
    }

    let mut tuple: Vec<SqlValue> = Vec::with_capacity(dim.columns.len());
    let mut known = 0usize;
    for col in dim.columns {
        match attrs.get(*col) {
            Some(value) => {
                known += 1;
                tuple.push(attr_to_sql(value));
            }
            None => tuple.push(SqlValue::Null),
        }
    }

    for key in attrs.keys() {
        if !dim.columns.contains(&key.as_str()) {
            log::warn!("ignoring unknown {} attribute {key:?}", dim.table);
        }
    }
    if known == 0 {
        return Ok(None);
    }

    let where_clause = dim
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| format!("\"{col}\" IS ?{}", i + 1))
        .collect::<Vec<_>>()
        .join(" AND ");

    let existing: Option<i64> = tx
        .query_row(
            &format!("SELECT id FROM {} WHERE {where_clause} LIMIT 1", dim.table),
            params_from_iter(tuple.iter()),
            |r| r.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(Some(id));
    }

    let column_list = dim
        .columns
        .iter()
        .map(|col| format!("\"{col}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=dim.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    tx.execute(
        &format!(
            "INSERT INTO {} ({column_list}) VALUES ({placeholders})",
            dim.table
        ),
        params_from_iter(tuple.iter()),
    )?;

    Ok(Some(tx.last_insert_rowid()))
}

/// Read one dimension row back as a flat attribute map with NULL columns
/// omitted. A dangling id (the row no longer exists) yields `None`.
pub(crate) fn load_attrs(
    conn: &rusqlite::Connection,
    dim: &Dimension,
    id: i64,
) -> Result<Option<StyleAttrs>> {
    let column_list = dim
        .columns
        .iter()
        .map(|col| format!("\"{col}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let attrs = conn
        .query_row(
            &format!("SELECT {column_list} FROM {} WHERE id = ?1", dim.table),
            [id],
            |r| {
                let mut attrs = StyleAttrs::new();
                for (i, col) in dim.columns.iter().enumerate() {
                    if let Some(value) = sql_to_attr(r.get::<_, SqlValue>(i)?) {
                        attrs.insert((*col).to_string(), value);
                    }
                }
                Ok(attrs)
            },
        )
        .optional()?;
    Ok(attrs)
}
