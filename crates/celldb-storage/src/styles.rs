//! Composite cell styles and styled ranges.
//!
//! A flat attribute map like `{"font_b": 1, "fill_fg_color": "FFFF00"}` is
//! partitioned by prefix into the five dimension tables, then the resulting
//! id tuple is deduplicated in `cell_styles` with the same NULL-safe
//! get-or-create used for dimensions.

use std::collections::HashMap;

use celldb_model::{AttrValue, StyleAttrs, StyledRange};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::dimensions::{self, ALIGNMENT, BORDER, FILL, FONT, PROTECTION};
use crate::storage::Result;

/// Bare (non-prefixed) scalar attributes stored directly on `cell_styles`.
const SCALAR_KEYS: [&str; 3] = ["num_fmt_id", "xf_id", "quote_prefix"];

#[derive(Debug, Default)]
struct Partitioned {
    font: StyleAttrs,
    fill: StyleAttrs,
    border: StyleAttrs,
    alignment: StyleAttrs,
    protection: StyleAttrs,
    scalars: [Option<i64>; 3],
}

fn partition(attrs: &StyleAttrs) -> Partitioned {
    let mut out = Partitioned::default();
    for (key, value) in attrs {
        if let Some(rest) = key.strip_prefix(FONT.prefix) {
            out.font.insert(rest.to_string(), value.clone());
        } else if let Some(rest) = key.strip_prefix(FILL.prefix) {
            out.fill.insert(rest.to_string(), value.clone());
        } else if let Some(rest) = key.strip_prefix(BORDER.prefix) {
            out.border.insert(rest.to_string(), value.clone());
        } else if let Some(rest) = key.strip_prefix(ALIGNMENT.prefix) {
            out.alignment.insert(rest.to_string(), value.clone());
        } else if let Some(rest) = key.strip_prefix(PROTECTION.prefix) {
            out.protection.insert(rest.to_string(), value.clone());
        } else if let Some(slot) = SCALAR_KEYS.iter().position(|k| k == key) {
            match value.as_int() {
                Some(i) => out.scalars[slot] = Some(i),
                None => log::warn!("style attribute {key:?} is not an integer, ignoring"),
            }
        } else {
            log::warn!("ignoring unknown style attribute {key:?}");
        }
    }
    out
}

/// Resolve a flat style attribute map to a deduplicated `cell_styles` id.
/// An entirely empty map yields `None` (no style applied).
pub(crate) fn get_or_create_cell_style(
    tx: &Transaction<'_>,
    attrs: &StyleAttrs,
) -> Result<Option<i64>> {
    let parts = partition(attrs);

    let font_id = dimensions::get_or_create(tx, &FONT, &parts.font)?;
    let fill_id = dimensions::get_or_create(tx, &FILL, &parts.fill)?;
    let border_id = dimensions::get_or_create(tx, &BORDER, &parts.border)?;
    let alignment_id = dimensions::get_or_create(tx, &ALIGNMENT, &parts.alignment)?;
    let protection_id = dimensions::get_or_create(tx, &PROTECTION, &parts.protection)?;
    let [num_fmt_id, xf_id, quote_prefix] = parts.scalars;

    if font_id.is_none()
        && fill_id.is_none()
        && border_id.is_none()
        && alignment_id.is_none()
        && protection_id.is_none()
        && num_fmt_id.is_none()
        && xf_id.is_none()
        && quote_prefix.is_none()
    {
        return Ok(None);
    }

    let existing: Option<i64> = tx
        .query_row(
            r#"
            SELECT id
            FROM cell_styles
            WHERE font_id IS ?1
              AND fill_id IS ?2
              AND border_id IS ?3
              AND alignment_id IS ?4
              AND protection_id IS ?5
              AND num_fmt_id IS ?6
              AND xf_id IS ?7
              AND quote_prefix IS ?8
            LIMIT 1
            "#,
            params![
                font_id,
                fill_id,
                border_id,
                alignment_id,
                protection_id,
                num_fmt_id,
                xf_id,
                quote_prefix
            ],
            |r| r.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        return Ok(Some(id));
    }

    tx.execute(
        r#"
        INSERT INTO cell_styles (
          font_id, fill_id, border_id, alignment_id, protection_id,
          num_fmt_id, xf_id, quote_prefix
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            font_id,
            fill_id,
            border_id,
            alignment_id,
            protection_id,
            num_fmt_id,
            xf_id,
            quote_prefix
        ],
    )?;

    Ok(Some(tx.last_insert_rowid()))
}

/// Replace a sheet's styled ranges wholesale. Duplicate identical triples are
/// a no-op, not an error.
pub(crate) fn replace_styled_ranges(
    tx: &Transaction<'_>,
    sheet_id: i64,
    ranges: &[StyledRange],
) -> Result<()> {
    tx.execute(
        "DELETE FROM styled_ranges WHERE sheet_id = ?1",
        params![sheet_id],
    )?;

    for entry in ranges {
        let style_id = match get_or_create_cell_style(tx, &entry.attrs)? {
            Some(id) => id,
            None => {
                log::warn!(
                    "styled range {:?} has no resolvable attributes, skipping",
                    entry.range
                );
                continue;
            }
        };
        tx.execute(
            r#"
            INSERT OR IGNORE INTO styled_ranges (sheet_id, range_address, style_id)
            VALUES (?1, ?2, ?3)
            "#,
            params![sheet_id, entry.range, style_id],
        )?;
    }

    Ok(())
}

/// Load a sheet's styled ranges in stored (insertion) order, reconstructing
/// one flat attribute map per range. NULL attributes are omitted. A range
/// whose style row is missing is skipped with a warning; one damaged entry
/// never fails the rest.
pub(crate) fn load_styled_ranges(conn: &Connection, sheet_id: i64) -> Result<Vec<StyledRange>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT range_address, style_id
        FROM styled_ranges
        WHERE sheet_id = ?1
        ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map(params![sheet_id], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
    })?;

    let mut cache: HashMap<i64, Option<StyleAttrs>> = HashMap::new();
    let mut out = Vec::new();
    for row in rows {
        let (range, style_id) = row?;
        let attrs = match cache.get(&style_id) {
            Some(attrs) => attrs.clone(),
            None => {
                let attrs = load_style_attrs(conn, style_id)?;
                cache.insert(style_id, attrs.clone());
                attrs
            }
        };
        match attrs {
            Some(attrs) => out.push(StyledRange { range, attrs }),
            None => {
                log::warn!(
                    "styled range {range:?} references missing style {style_id}, skipping"
                );
            }
        }
    }
    Ok(out)
}

fn load_style_attrs(conn: &Connection, style_id: i64) -> Result<Option<StyleAttrs>> {
    let row = conn
        .query_row(
            r#"
            SELECT font_id, fill_id, border_id, alignment_id, protection_id,
                   num_fmt_id, xf_id, quote_prefix
            FROM cell_styles
            WHERE id = ?1
            "#,
            params![style_id],
            |r| {
                Ok((
                    r.get::<_, Option<i64>>(0)?,
                    r.get::<_, Option<i64>>(1)?,
                    r.get::<_, Option<i64>>(2)?,
                    r.get::<_, Option<i64>>(3)?,
                    r.get::<_, Option<i64>>(4)?,
                    [
                        r.get::<_, Option<i64>>(5)?,
                        r.get::<_, Option<i64>>(6)?,
                        r.get::<_, Option<i64>>(7)?,
                    ],
                ))
            },
        )
        .optional()?;
    let Some((font_id, fill_id, border_id, alignment_id, protection_id, scalars)) = row else {
        return Ok(None);
    };

    let mut attrs = StyleAttrs::new();
    let dims = [
        (&FONT, font_id),
        (&FILL, fill_id),
        (&BORDER, border_id),
        (&ALIGNMENT, alignment_id),
        (&PROTECTION, protection_id),
    ];
    for (dim, id) in dims {
        if let Some(id) = id {
            match dimensions::load_attrs(conn, dim, id)? {
                Some(loaded) => {
                    for (key, value) in loaded {
                        attrs.insert(format!("{}{key}", dim.prefix), value);
                    }
                }
                None => {
                    log::warn!(
                        "style {style_id} references missing {} row {id}, dropping those attributes",
                        dim.table
                    );
                }
            }
        }
    }
    for (key, value) in SCALAR_KEYS.iter().zip(scalars) {
        if let Some(value) = value {
            attrs.insert((*key).to_string(), AttrValue::Int(value));
        }
    }
    Ok(Some(attrs))
}
