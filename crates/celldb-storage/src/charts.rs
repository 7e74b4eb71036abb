//! Chart store: decomposes the chart object graph into
//! charts → chart_axes / chart_series → chart_data_sources rows.
//!
//! A sheet's charts are replaced wholesale on every save, deleting in
//! dependency order inside the caller's transaction. Data sources are linked
//! to series by the caller-supplied positional index, not by row id.

use celldb_model::{AxisRole, CellRef, Chart, ChartAxis, ChartDataSource, ChartSeries, DataRole};
use rusqlite::{params, Connection, Transaction};

use crate::storage::Result;

pub(crate) fn replace_charts(tx: &Transaction<'_>, sheet_id: i64, charts: &[Chart]) -> Result<()> {
    // Delete children before parents.
    tx.execute(
        "DELETE FROM chart_data_sources WHERE chart_id IN (SELECT id FROM charts WHERE sheet_id = ?1)",
        params![sheet_id],
    )?;
    tx.execute(
        "DELETE FROM chart_series WHERE chart_id IN (SELECT id FROM charts WHERE sheet_id = ?1)",
        params![sheet_id],
    )?;
    tx.execute(
        "DELETE FROM chart_axes WHERE chart_id IN (SELECT id FROM charts WHERE sheet_id = ?1)",
        params![sheet_id],
    )?;
    tx.execute("DELETE FROM charts WHERE sheet_id = ?1", params![sheet_id])?;

    for chart in charts {
        insert_chart(tx, sheet_id, chart)?;
    }
    Ok(())
}

fn insert_chart(tx: &Transaction<'_>, sheet_id: i64, chart: &Chart) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO charts (
          sheet_id, chart_type, title, anchor_row, anchor_col, width, height,
          style, legend_position, auto_scaling, plot_vis_only
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            sheet_id,
            chart.chart_type,
            chart.title,
            chart.anchor.map(|a| a.row),
            chart.anchor.map(|a| a.col),
            chart.width,
            chart.height,
            chart.style,
            chart.legend_position,
            chart.auto_scaling,
            chart.plot_vis_only
        ],
    )?;
    let chart_id = tx.last_insert_rowid();

    for axis in &chart.axes {
        tx.execute(
            r#"
            INSERT INTO chart_axes (
              chart_id, role, ax_id, position, hidden, title, num_fmt,
              major_tick_mark, minor_tick_mark, tick_label_position, crosses,
              crosses_at, major_unit, minor_unit, min, max, orientation,
              log_base, major_gridlines, minor_gridlines
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            "#,
            params![
                chart_id,
                axis.role.map(AxisRole::as_str),
                axis.ax_id,
                axis.position,
                axis.hidden,
                axis.title,
                axis.num_fmt,
                axis.major_tick_mark,
                axis.minor_tick_mark,
                axis.tick_label_position,
                axis.crosses,
                axis.crosses_at,
                axis.major_unit,
                axis.minor_unit,
                axis.min,
                axis.max,
                axis.orientation,
                axis.log_base,
                axis.major_gridlines,
                axis.minor_gridlines
            ],
        )?;
    }

    for series in &chart.series {
        tx.execute(
            r#"
            INSERT INTO chart_series (
              chart_id, idx, order_index, title_ref, shape, smooth,
              invert_if_negative
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                chart_id,
                series.idx,
                series.order,
                series.title_ref,
                series.shape,
                series.smooth,
                series.invert_if_negative
            ],
        )?;

        for source in &series.data_sources {
            tx.execute(
                r#"
                INSERT INTO chart_data_sources (chart_id, series_idx, role, formula)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![chart_id, series.idx, source.role.as_str(), source.formula],
            )?;
        }
    }
    Ok(())
}

/// Reconstruct a sheet's chart graphs. Partially populated axis/series rows
/// yield partial objects; rows with unrecognized role tags are skipped with
/// a warning.
pub(crate) fn load_charts(conn: &Connection, sheet_id: i64) -> Result<Vec<Chart>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, chart_type, title, anchor_row, anchor_col, width, height,
               style, legend_position, auto_scaling, plot_vis_only
        FROM charts
        WHERE sheet_id = ?1
        ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map(params![sheet_id], |r| {
        let anchor_row: Option<i64> = r.get(3)?;
        let anchor_col: Option<i64> = r.get(4)?;
        Ok((
            r.get::<_, i64>(0)?,
            Chart {
                chart_type: r.get(1)?,
                title: r.get(2)?,
                anchor: anchor_from_columns(anchor_row, anchor_col),
                width: r.get(5)?,
                height: r.get(6)?,
                style: r.get(7)?,
                legend_position: r.get(8)?,
                auto_scaling: r.get(9)?,
                plot_vis_only: r.get(10)?,
                axes: Vec::new(),
                series: Vec::new(),
            },
        ))
    })?;

    let mut charts = Vec::new();
    for row in rows {
        let (chart_id, mut chart) = row?;
        chart.axes = load_axes(conn, chart_id)?;
        chart.series = load_series(conn, chart_id)?;
        charts.push(chart);
    }
    Ok(charts)
}

fn anchor_from_columns(row: Option<i64>, col: Option<i64>) -> Option<CellRef> {
    match (row, col) {
        (Some(row), Some(col)) => {
            match (u32::try_from(row), u32::try_from(col)) {
                (Ok(row), Ok(col)) => Some(CellRef::new(row, col)),
                _ => {
                    log::warn!("chart anchor ({row}, {col}) out of range, ignoring");
                    None
                }
            }
        }
        _ => None,
    }
}

fn load_axes(conn: &Connection, chart_id: i64) -> Result<Vec<ChartAxis>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT role, ax_id, position, hidden, title, num_fmt, major_tick_mark,
               minor_tick_mark, tick_label_position, crosses, crosses_at,
               major_unit, minor_unit, min, max, orientation, log_base,
               major_gridlines, minor_gridlines
        FROM chart_axes
        WHERE chart_id = ?1
        ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map(params![chart_id], |r| {
        Ok((
            r.get::<_, Option<String>>(0)?,
            ChartAxis {
                role: None,
                ax_id: r.get(1)?,
                position: r.get(2)?,
                hidden: r.get(3)?,
                title: r.get(4)?,
                num_fmt: r.get(5)?,
                major_tick_mark: r.get(6)?,
                minor_tick_mark: r.get(7)?,
                tick_label_position: r.get(8)?,
                crosses: r.get(9)?,
                crosses_at: r.get(10)?,
                major_unit: r.get(11)?,
                minor_unit: r.get(12)?,
                min: r.get(13)?,
                max: r.get(14)?,
                orientation: r.get(15)?,
                log_base: r.get(16)?,
                major_gridlines: r.get(17)?,
                minor_gridlines: r.get(18)?,
            },
        ))
    })?;

    let mut axes = Vec::new();
    for row in rows {
        let (role, mut axis) = row?;
        axis.role = match role.as_deref() {
            None => None,
            Some(tag) => {
                let parsed = AxisRole::from_str(tag);
                if parsed.is_none() {
                    log::warn!("unrecognized axis role {tag:?} on chart {chart_id}");
                }
                parsed
            }
        };
        axes.push(axis);
    }
    Ok(axes)
}

fn load_series(conn: &Connection, chart_id: i64) -> Result<Vec<ChartSeries>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT idx, order_index, title_ref, shape, smooth, invert_if_negative
        FROM chart_series
        WHERE chart_id = ?1
        ORDER BY order_index, id
        "#,
    )?;
    let rows = stmt.query_map(params![chart_id], |r| {
        Ok(ChartSeries {
            idx: r.get(0)?,
            order: r.get(1)?,
            title_ref: r.get(2)?,
            shape: r.get(3)?,
            smooth: r.get(4)?,
            invert_if_negative: r.get(5)?,
            data_sources: Vec::new(),
        })
    })?;

    let mut series = Vec::new();
    for row in rows {
        let mut entry = row?;
        entry.data_sources = load_data_sources(conn, chart_id, entry.idx)?;
        series.push(entry);
    }
    Ok(series)
}

fn load_data_sources(
    conn: &Connection,
    chart_id: i64,
    series_idx: i64,
) -> Result<Vec<ChartDataSource>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT role, formula
        FROM chart_data_sources
        WHERE chart_id = ?1 AND series_idx = ?2
        ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map(params![chart_id, series_idx], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;

    let mut sources = Vec::new();
    for row in rows {
        let (role, formula) = row?;
        match DataRole::from_str(&role) {
            Some(role) => sources.push(ChartDataSource { role, formula }),
            None => {
                log::warn!(
                    "unrecognized data source role {role:?} on chart {chart_id} series {series_idx}, skipping"
                );
            }
        }
    }
    Ok(sources)
}
