//! Export contract builder: turns stored project state back into the
//! renderer's JSON document.

use celldb_model::{
    col_to_name, AttrValue, CellRef, Chart, DataRole, ExportChart, ExportDocument, ExportFormula,
    ExportMetadata, ExportSeries, ExportSheet, ExportStyle, StyleAttrs,
};
use celldb_storage::Storage;
use serde_json::{json, Map, Value};

use crate::Result;

/// Author reported when the project carries no author metadata.
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Materialize sparse `(address, value)` cells into a dense row-major matrix
/// sized by the maximum row/column seen. Cells with unparseable addresses
/// are skipped with a warning.
pub fn dense_matrix<I, S>(cells: I) -> Vec<Vec<Option<String>>>
where
    I: IntoIterator<Item = (S, String)>,
    S: AsRef<str>,
{
    let mut placed: Vec<(CellRef, String)> = Vec::new();
    let mut rows = 0usize;
    let mut cols = 0usize;
    for (address, value) in cells {
        match CellRef::from_a1(address.as_ref()) {
            Ok(reference) => {
                rows = rows.max(reference.row as usize + 1);
                cols = cols.max(reference.col as usize + 1);
                placed.push((reference, value));
            }
            Err(err) => {
                log::warn!(
                    "skipping cell with unparseable address {:?}: {err}",
                    address.as_ref()
                );
            }
        }
    }

    let mut matrix = vec![vec![None; cols]; rows];
    for (reference, value) in placed {
        matrix[reference.row as usize][reference.col as usize] = Some(value);
    }
    matrix
}

/// Build the full export document for one project.
pub fn build_export_document(storage: &Storage, project_id: i64) -> Result<ExportDocument> {
    let project = storage.get_project(project_id)?;
    let metadata = storage.project_metadata(project_id)?;
    let author = metadata
        .get("author")
        .cloned()
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let mut sheets = Vec::new();
    for sheet in storage.list_sheets(project_id)? {
        sheets.push(build_sheet(storage, sheet.id, sheet.name)?);
    }

    Ok(ExportDocument {
        metadata: ExportMetadata {
            project_name: project.name,
            author,
            created_at: project.created_at,
        },
        sheets,
    })
}

fn build_sheet(storage: &Storage, sheet_id: i64, name: String) -> Result<ExportSheet> {
    let table = storage.load_value_rows(sheet_id)?;
    let mut sparse: Vec<(String, String)> = Vec::new();
    for (i, row) in table.rows.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                let address = format!("{}{}", col_to_name(j as u32), i + 1);
                sparse.push((address, value.clone()));
            }
        }
    }
    let data = dense_matrix(sparse);

    let formulas = storage
        .load_formulas(sheet_id)?
        .into_iter()
        .map(|record| ExportFormula {
            cell: record.cell,
            formula: ensure_formula_prefix(record.formula),
        })
        .collect();

    let styles = storage
        .load_styled_ranges(sheet_id)?
        .into_iter()
        .map(|entry| ExportStyle {
            style: nest_style_attrs(&entry.attrs),
            range: entry.range,
        })
        .collect();

    let charts = storage
        .load_charts(sheet_id)?
        .iter()
        .filter_map(export_chart)
        .collect();

    Ok(ExportSheet {
        name,
        data,
        formulas,
        styles,
        charts,
    })
}

fn ensure_formula_prefix(formula: String) -> String {
    if formula.starts_with('=') {
        formula
    } else {
        format!("={formula}")
    }
}

/// Nest a flat attribute map into the renderer's style object, renaming the
/// spreadsheet-internal short keys along the way (`font_b` → `font.bold`).
pub fn nest_style_attrs(attrs: &StyleAttrs) -> Value {
    let mut root = Map::new();
    let mut font = Map::new();
    let mut fill = Map::new();
    let mut border = Map::new();
    let mut alignment = Map::new();
    let mut protection = Map::new();

    for (key, value) in attrs {
        if let Some(rest) = key.strip_prefix("font_") {
            let (name, value) = match rest {
                "b" => ("bold", bool_value(value)),
                "i" => ("italic", bool_value(value)),
                "strike" => ("strike", bool_value(value)),
                "sz" => ("size", attr_value(value)),
                "u" => ("underline", attr_value(value)),
                other => (other, attr_value(value)),
            };
            font.insert(name.to_string(), value);
        } else if let Some(rest) = key.strip_prefix("fill_") {
            let name = if rest == "pattern_type" { "pattern" } else { rest };
            fill.insert(name.to_string(), attr_value(value));
        } else if let Some(rest) = key.strip_prefix("border_") {
            border.insert(rest.to_string(), attr_value(value));
        } else if let Some(rest) = key.strip_prefix("alignment_") {
            let value = match rest {
                "wrap_text" | "shrink_to_fit" => bool_value(value),
                _ => attr_value(value),
            };
            alignment.insert(rest.to_string(), value);
        } else if let Some(rest) = key.strip_prefix("protection_") {
            protection.insert(rest.to_string(), bool_value(value));
        } else {
            root.insert(key.clone(), attr_value(value));
        }
    }

    for (name, group) in [
        ("font", font),
        ("fill", fill),
        ("border", border),
        ("alignment", alignment),
        ("protection", protection),
    ] {
        if !group.is_empty() {
            root.insert(name.to_string(), Value::Object(group));
        }
    }
    Value::Object(root)
}

fn attr_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::Int(i) => json!(i),
        AttrValue::Real(r) => json!(r),
        AttrValue::Text(s) => json!(s),
    }
}

fn bool_value(value: &AttrValue) -> Value {
    match value {
        AttrValue::Int(i) => json!(*i != 0),
        AttrValue::Real(r) => json!(*r != 0.0),
        AttrValue::Text(s) => json!(s == "true" || s == "1"),
    }
}

/// Convert one stored chart to its contract form. Charts that cannot be
/// expressed (no type) are skipped with a warning rather than failing the
/// export.
fn export_chart(chart: &Chart) -> Option<ExportChart> {
    if chart.chart_type.is_empty() {
        log::warn!("skipping chart without a type");
        return None;
    }

    let position = match chart.anchor {
        Some(anchor) => anchor.to_a1(),
        None => {
            log::warn!(
                "chart of type {:?} has no usable anchor, defaulting to A1",
                chart.chart_type
            );
            "A1".to_string()
        }
    };

    let mut series = Vec::new();
    for entry in &chart.series {
        let values = entry
            .data_sources
            .iter()
            .find(|s| s.role == DataRole::Values)
            .map(|s| s.formula.clone());
        let categories = entry
            .data_sources
            .iter()
            .find(|s| s.role == DataRole::Categories)
            .map(|s| s.formula.clone());

        match values {
            Some(values) => series.push(ExportSeries {
                name: entry.title_ref.clone(),
                categories,
                values,
            }),
            None => {
                log::warn!(
                    "skipping series {} of chart {:?}: no values data source",
                    entry.idx,
                    chart.chart_type
                );
            }
        }
    }

    Some(ExportChart {
        chart_type: chart.chart_type.clone(),
        position,
        title: chart.title.clone(),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use celldb_model::StyleAttrs;

    #[test]
    fn sparse_to_dense_round_trip() {
        let matrix = dense_matrix(vec![
            ("A1".to_string(), "x".to_string()),
            ("C2".to_string(), "y".to_string()),
        ]);
        assert_eq!(
            matrix,
            vec![
                vec![Some("x".to_string()), None, None],
                vec![None, None, Some("y".to_string())],
            ]
        );
    }

    #[test]
    fn dense_matrix_skips_unparseable_addresses() {
        let matrix = dense_matrix(vec![
            ("bogus".to_string(), "ignored".to_string()),
            ("B1".to_string(), "kept".to_string()),
        ]);
        assert_eq!(matrix, vec![vec![None, Some("kept".to_string())]]);
    }

    #[test]
    fn style_nesting_renames_font_keys() {
        let mut attrs = StyleAttrs::new();
        attrs.insert("font_b".into(), AttrValue::Int(1));
        attrs.insert("font_sz".into(), AttrValue::Real(12.0));
        attrs.insert("font_color".into(), AttrValue::Text("FF0000".into()));
        attrs.insert("num_fmt_id".into(), AttrValue::Int(4));

        let style = nest_style_attrs(&attrs);
        assert_eq!(style["font"]["bold"], true);
        assert_eq!(style["font"]["size"], 12.0);
        assert_eq!(style["font"]["color"], "FF0000");
        assert_eq!(style["num_fmt_id"], 4);
    }

    #[test]
    fn formula_prefix_is_enforced() {
        assert_eq!(ensure_formula_prefix("SUM(A1)".into()), "=SUM(A1)");
        assert_eq!(ensure_formula_prefix("=SUM(A1)".into()), "=SUM(A1)");
    }
}
