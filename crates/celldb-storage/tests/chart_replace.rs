use celldb_model::{
    AxisRole, CellRef, Chart, ChartAxis, ChartDataSource, ChartSeries, DataRole, SheetAnalysis,
};
use celldb_storage::Storage;
use rusqlite::{Connection, OpenFlags};

fn chart(chart_type: &str, series: Vec<ChartSeries>) -> Chart {
    Chart {
        chart_type: chart_type.to_string(),
        title: None,
        anchor: Some(CellRef::new(0, 0)),
        width: None,
        height: None,
        style: None,
        legend_position: None,
        auto_scaling: None,
        plot_vis_only: None,
        axes: Vec::new(),
        series,
    }
}

fn series(idx: i64, order: i64, values: &str) -> ChartSeries {
    ChartSeries {
        idx,
        order,
        title_ref: None,
        shape: None,
        smooth: None,
        invert_if_negative: None,
        data_sources: vec![ChartDataSource {
            role: DataRole::Values,
            formula: values.to_string(),
        }],
    }
}

#[test]
fn saving_charts_replaces_previous_graph_without_residue() {
    let uri = "file:chart_replace?mode=memory&cache=shared";
    let storage = Storage::open_uri(uri).expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("Sheet1", 0))
        .expect("sheet");

    let mut first = chart("col", vec![series(0, 0, "Sheet1!B2:B5")]);
    first.axes = vec![ChartAxis {
        role: Some(AxisRole::Category),
        ..ChartAxis::default()
    }];
    storage.save_charts(sheet, &[first]).expect("first save");

    let second = chart("line", vec![series(0, 0, "Sheet1!C2:C5")]);
    storage.save_charts(sheet, &[second]).expect("second save");

    let loaded = storage.load_charts(sheet).expect("load charts");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].chart_type, "line");
    assert_eq!(loaded[0].series[0].data_sources[0].formula, "Sheet1!C2:C5");

    // No orphaned child rows from the replaced graph.
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(uri, flags).expect("open raw connection");
    for table in ["charts", "chart_series", "chart_data_sources"] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .expect("count rows");
        assert_eq!(count, 1, "{table} should hold exactly the new graph");
    }
    let axes: i64 = conn
        .query_row("SELECT COUNT(*) FROM chart_axes", [], |r| r.get(0))
        .expect("count axes");
    assert_eq!(axes, 0);
}

#[test]
fn series_reload_in_order_with_sources_linked_by_index() {
    let storage = Storage::open_in_memory().expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("Sheet1", 0))
        .expect("sheet");

    // Insert out of plot order; load must come back ordered.
    let mut s0 = series(0, 1, "Sheet1!B2:B5");
    s0.data_sources.push(ChartDataSource {
        role: DataRole::Categories,
        formula: "Sheet1!A2:A5".to_string(),
    });
    let s1 = series(1, 0, "Sheet1!C2:C5");

    storage
        .save_charts(sheet, &[chart("col", vec![s0, s1])])
        .expect("save charts");

    let loaded = storage.load_charts(sheet).expect("load charts");
    let loaded_series = &loaded[0].series;
    assert_eq!(loaded_series.len(), 2);
    assert_eq!(loaded_series[0].idx, 1, "ordered by plot order");
    assert_eq!(loaded_series[1].idx, 0);

    let s0_loaded = &loaded_series[1];
    assert_eq!(s0_loaded.data_sources.len(), 2);
    assert!(s0_loaded
        .data_sources
        .iter()
        .any(|s| s.role == DataRole::Categories && s.formula == "Sheet1!A2:A5"));
    assert_eq!(
        loaded_series[0].data_sources[0].formula, "Sheet1!C2:C5",
        "sources must be linked by series index"
    );
}

#[test]
fn unrecognized_data_source_role_is_skipped() {
    let uri = "file:chart_bad_role?mode=memory&cache=shared";
    let storage = Storage::open_uri(uri).expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("Sheet1", 0))
        .expect("sheet");
    storage
        .save_charts(sheet, &[chart("col", vec![series(0, 0, "Sheet1!B2:B5")])])
        .expect("save charts");

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(uri, flags).expect("open raw connection");
    conn.execute(
        r#"
        INSERT INTO chart_data_sources (chart_id, series_idx, role, formula)
        SELECT id, 0, 'bogus', 'Sheet1!D1:D5' FROM charts LIMIT 1
        "#,
        [],
    )
    .expect("inject bad role");

    let loaded = storage.load_charts(sheet).expect("load charts");
    let sources = &loaded[0].series[0].data_sources;
    assert_eq!(sources.len(), 1, "the damaged source row is skipped");
    assert_eq!(sources[0].role, DataRole::Values);
}
