use celldb_model::{Scalar, SheetAnalysis};
use celldb_storage::Storage;

fn text(s: &str) -> Option<Scalar> {
    Some(Scalar::Text(s.to_string()))
}

#[test]
fn reserved_id_column_round_trips() {
    let storage = Storage::open_in_memory().expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("People", 0))
        .expect("sheet");

    let columns = vec!["id".to_string(), "Name".to_string()];
    let rows = vec![
        vec![text("1"), text("Ada")],
        vec![text("2"), text("Grace")],
    ];
    storage
        .save_value_rows(sheet, "People", &columns, &rows)
        .expect("save rows");

    let table = storage.load_value_rows(sheet).expect("load rows");
    assert_eq!(table.column_names, vec!["id", "Name"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0][0].as_deref(), Some("1"));
    assert_eq!(table.rows[1][1].as_deref(), Some("Grace"));
}

#[test]
fn duplicate_and_hostile_column_names_are_uniqued() {
    let storage = Storage::open_in_memory().expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("Data; drop table", 0))
        .expect("sheet");

    let columns = vec![
        "Amount ($)".to_string(),
        "Amount ($)".to_string(),
        "".to_string(),
    ];
    let rows = vec![vec![text("1"), text("2"), text("3")]];
    storage
        .save_value_rows(sheet, "Data; drop table", &columns, &rows)
        .expect("save rows");

    let table = storage.load_value_rows(sheet).expect("load rows");
    assert_eq!(table.column_names.len(), 3);
    assert_ne!(table.column_names[0], table.column_names[1]);
    assert_eq!(table.rows[0][2].as_deref(), Some("3"));
}

#[test]
fn changed_column_set_drops_old_rows() {
    let storage = Storage::open_in_memory().expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("Data", 0))
        .expect("sheet");

    storage
        .save_value_rows(
            sheet,
            "Data",
            &["A".to_string(), "B".to_string()],
            &[vec![text("1"), text("2")]],
        )
        .expect("first save");
    storage
        .save_value_rows(
            sheet,
            "Data",
            &["A".to_string(), "B".to_string(), "C".to_string()],
            &[vec![text("x"), text("y"), text("z")]],
        )
        .expect("second save");

    let table = storage.load_value_rows(sheet).expect("load rows");
    assert_eq!(table.column_names, vec!["A", "B", "C"]);
    assert_eq!(table.rows.len(), 1, "old-shape rows must not survive");
    assert_eq!(table.rows[0][2].as_deref(), Some("z"));
}

#[test]
fn missing_table_yields_empty_structure() {
    let storage = Storage::open_in_memory().expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("Empty", 0))
        .expect("sheet");

    // An empty sheet registers no value columns; loading must not error.
    let table = storage.load_value_rows(sheet).expect("load rows");
    assert!(table.column_names.is_empty());
    assert!(table.rows.is_empty());
}

#[test]
fn short_rows_are_padded_with_null() {
    let storage = Storage::open_in_memory().expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("Data", 0))
        .expect("sheet");

    storage
        .save_value_rows(
            sheet,
            "Data",
            &["A".to_string(), "B".to_string()],
            &[vec![text("only-a")]],
        )
        .expect("save rows");

    let table = storage.load_value_rows(sheet).expect("load rows");
    assert_eq!(table.rows[0], vec![Some("only-a".to_string()), None]);
}
