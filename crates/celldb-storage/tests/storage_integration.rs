use celldb_model::{
    AttrValue, CellRef, Chart, ChartAxis, ChartDataSource, ChartSeries, AxisRole, DataRole,
    DocumentAnalysis, FormulaRecord, RawCell, Scalar, SheetAnalysis, StyleAttrs, StyledRange,
};
use celldb_storage::Storage;

fn bold() -> StyleAttrs {
    let mut attrs = StyleAttrs::new();
    attrs.insert("font_b".into(), AttrValue::Int(1));
    attrs
}

fn sales_sheet() -> SheetAnalysis {
    SheetAnalysis {
        name: "Sales".into(),
        index: 0,
        max_row: 3,
        max_column: 2,
        structure: Some(serde_json::json!({"header_rows": 1})),
        raw_data: vec![
            RawCell {
                cell: "A1".into(),
                value: Scalar::Text("Product".into()),
            },
            RawCell {
                cell: "B1".into(),
                value: Scalar::Text("Total".into()),
            },
            RawCell {
                cell: "A2".into(),
                value: Scalar::Text("Widget".into()),
            },
            RawCell {
                cell: "B2".into(),
                value: Scalar::Int(42),
            },
        ],
        formulas: vec![FormulaRecord {
            cell: "B3".into(),
            formula: "=SUM(B2:B2)".into(),
            references: vec!["B2:B2".into()],
        }],
        styled_ranges: vec![StyledRange {
            range: "A1:B1".into(),
            attrs: bold(),
        }],
        charts: vec![Chart {
            chart_type: "col".into(),
            title: Some("Totals".into()),
            anchor: Some(CellRef { row: 4, col: 0 }),
            width: Some(15.0),
            height: Some(7.5),
            style: Some(2),
            legend_position: Some("r".into()),
            auto_scaling: None,
            plot_vis_only: Some(true),
            axes: vec![ChartAxis {
                role: Some(AxisRole::Category),
                ..ChartAxis::default()
            }],
            series: vec![ChartSeries {
                idx: 0,
                order: 0,
                title_ref: Some("Sales!$B$1".into()),
                shape: None,
                smooth: None,
                invert_if_negative: None,
                data_sources: vec![
                    ChartDataSource {
                        role: DataRole::Categories,
                        formula: "Sales!$A$2:$A$2".into(),
                    },
                    ChartDataSource {
                        role: DataRole::Values,
                        formula: "Sales!$B$2:$B$2".into(),
                    },
                ],
            }],
        }],
        merged_cells: vec!["A1:B1".into()],
    }
}

#[test]
fn save_document_round_trips_every_facet() {
    let uri = "file:storage_integration?mode=memory&cache=shared";
    let storage = Storage::open_uri(uri).expect("open storage");

    let mut notes = SheetAnalysis::new("Notes", 1);
    notes.max_row = 1;
    notes.max_column = 1;
    notes.raw_data = vec![RawCell {
        cell: "A1".into(),
        value: Scalar::Bool(true),
    }];

    let analysis = DocumentAnalysis {
        project_name: "Q3 Report".into(),
        sheets: vec![sales_sheet(), notes],
    };

    let project_id = storage.save_document(&analysis).expect("save document");

    // Read everything back through a second handle on the same database.
    let reader = Storage::open_uri(uri).expect("second handle");
    let project = reader.get_project(project_id).expect("project");
    assert_eq!(project.name, "Q3 Report");

    let sheets = reader.list_sheets(project_id).expect("sheets");
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].name, "Sales");
    assert_eq!(sheets[1].name, "Notes");
    assert_eq!(sheets[0].max_row, Some(3));
    assert_eq!(sheets[0].max_column, Some(2));
    assert_eq!(
        sheets[0].structure,
        Some(serde_json::json!({"header_rows": 1}))
    );

    let sales = sheets[0].id;

    let table = reader.load_value_rows(sales).expect("values");
    assert_eq!(table.column_names, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[0][0].as_deref(), Some("Product"));
    assert_eq!(table.rows[1][1].as_deref(), Some("42"));
    assert_eq!(table.rows[2][0], None);

    let formulas = reader.load_formulas(sales).expect("formulas");
    assert_eq!(formulas.len(), 1);
    assert_eq!(formulas[0].cell, "B3");
    assert_eq!(formulas[0].references, vec!["B2:B2".to_string()]);

    let ranges = reader.load_styled_ranges(sales).expect("styles");
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].range, "A1:B1");
    assert_eq!(ranges[0].attrs.get("font_b"), Some(&AttrValue::Int(1)));

    let charts = reader.load_charts(sales).expect("charts");
    assert_eq!(charts.len(), 1);
    let chart = &charts[0];
    assert_eq!(chart.chart_type, "col");
    assert_eq!(chart.anchor, Some(CellRef { row: 4, col: 0 }));
    assert_eq!(chart.axes.len(), 1);
    assert_eq!(chart.axes[0].role, Some(AxisRole::Category));
    assert_eq!(chart.series.len(), 1);
    assert_eq!(chart.series[0].data_sources.len(), 2);

    let merged = reader.load_merged_ranges(sales).expect("merged");
    assert_eq!(merged, vec!["A1:B1".to_string()]);

    let notes_table = reader.load_value_rows(sheets[1].id).expect("notes values");
    assert_eq!(notes_table.rows[0][0].as_deref(), Some("true"));
}

#[test]
fn resaving_a_document_updates_in_place() {
    let storage = Storage::open_in_memory().expect("open storage");

    let mut analysis = DocumentAnalysis {
        project_name: "Book".into(),
        sheets: vec![sales_sheet()],
    };
    let first = storage.save_document(&analysis).expect("first save");

    analysis.sheets[0].raw_data = vec![RawCell {
        cell: "A1".into(),
        value: Scalar::Text("Revised".into()),
    }];
    analysis.sheets[0].max_row = 1;
    analysis.sheets[0].max_column = 1;
    analysis.sheets[0].formulas.clear();
    let second = storage.save_document(&analysis).expect("second save");

    assert_eq!(first, second, "same project row is reused");
    let sheets = storage.list_sheets(first).expect("sheets");
    assert_eq!(sheets.len(), 1, "same sheet row is reused");

    let table = storage.load_value_rows(sheets[0].id).expect("values");
    assert_eq!(table.column_names, vec!["A".to_string()]);
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0][0].as_deref(), Some("Revised"));
    assert!(storage.load_formulas(sheets[0].id).expect("formulas").is_empty());
}

#[test]
fn data_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("project.db");

    {
        let storage = Storage::open_path(&path).expect("open file");
        storage
            .save_document(&DocumentAnalysis {
                project_name: "Persisted".into(),
                sheets: vec![sales_sheet()],
            })
            .expect("save");
    }

    let reopened = Storage::open_path(&path).expect("reopen file");
    let project = reopened
        .find_project("Persisted")
        .expect("query")
        .expect("project survived");
    let sheets = reopened.list_sheets(project.id).expect("sheets");
    assert_eq!(sheets.len(), 1);
    let table = reopened.load_value_rows(sheets[0].id).expect("values");
    assert_eq!(table.rows[1][1].as_deref(), Some("42"));
}

#[test]
fn project_metadata_and_sheet_rename() {
    let storage = Storage::open_in_memory().expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("Draft", 0))
        .expect("sheet");

    storage
        .set_project_metadata(project.id, "author", "Ada")
        .expect("set author");
    storage
        .set_project_metadata(project.id, "author", "Grace")
        .expect("overwrite author");
    let meta = storage.project_metadata(project.id).expect("metadata");
    assert_eq!(meta.get("author").map(String::as_str), Some("Grace"));

    storage
        .rename_sheet(project.id, "Draft", "Final")
        .expect("rename");
    assert!(storage
        .find_sheet(project.id, "Final")
        .expect("find")
        .is_some());

    let missing = storage.rename_sheet(project.id, "Draft", "Other");
    assert!(matches!(
        missing,
        Err(celldb_storage::StorageError::SheetNameNotFound(_))
    ));
}
