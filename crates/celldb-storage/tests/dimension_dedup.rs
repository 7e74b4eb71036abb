use celldb_model::{AttrValue, SheetAnalysis, StyleAttrs, StyledRange};
use celldb_storage::Storage;
use rusqlite::{Connection, OpenFlags};

fn bold_red() -> StyleAttrs {
    let mut attrs = StyleAttrs::new();
    attrs.insert("font_b".into(), AttrValue::Int(1));
    attrs.insert("font_color".into(), AttrValue::Text("FF0000".into()));
    attrs
}

#[test]
fn identical_attribute_tuples_share_one_dimension_row() {
    let uri = "file:dimension_dedup?mode=memory&cache=shared";
    let storage = Storage::open_uri(uri).expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet_a = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("A", 0))
        .expect("sheet A");
    let sheet_b = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("B", 1))
        .expect("sheet B");

    // The same font tuple applied across two sheets and several ranges.
    storage
        .save_styled_ranges(
            sheet_a,
            &[
                StyledRange {
                    range: "A1".into(),
                    attrs: bold_red(),
                },
                StyledRange {
                    range: "B2:C3".into(),
                    attrs: bold_red(),
                },
            ],
        )
        .expect("save ranges on A");
    storage
        .save_styled_ranges(
            sheet_b,
            &[StyledRange {
                range: "A1".into(),
                attrs: bold_red(),
            }],
        )
        .expect("save ranges on B");

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(uri, flags).expect("open raw connection");

    let fonts: i64 = conn
        .query_row("SELECT COUNT(*) FROM fonts", [], |r| r.get(0))
        .expect("count fonts");
    assert_eq!(fonts, 1, "identical font tuples must dedup to one row");

    let styles: i64 = conn
        .query_row("SELECT COUNT(*) FROM cell_styles", [], |r| r.get(0))
        .expect("count cell styles");
    assert_eq!(styles, 1, "identical composite styles must dedup to one row");
}

#[test]
fn differing_attribute_tuples_get_distinct_rows() {
    let uri = "file:dimension_distinct?mode=memory&cache=shared";
    let storage = Storage::open_uri(uri).expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("A", 0))
        .expect("sheet");

    let mut italic = StyleAttrs::new();
    italic.insert("font_i".into(), AttrValue::Int(1));

    storage
        .save_styled_ranges(
            sheet,
            &[
                StyledRange {
                    range: "A1".into(),
                    attrs: bold_red(),
                },
                StyledRange {
                    range: "A2".into(),
                    attrs: italic,
                },
            ],
        )
        .expect("save ranges");

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(uri, flags).expect("open raw connection");
    let fonts: i64 = conn
        .query_row("SELECT COUNT(*) FROM fonts", [], |r| r.get(0))
        .expect("count fonts");
    assert_eq!(fonts, 2);
}

#[test]
fn absent_attributes_compare_null_safe() {
    // A tuple with most columns absent (NULL) must still dedup: SQLite's
    // UNIQUE constraint alone would treat those rows as distinct.
    let uri = "file:dimension_null_safe?mode=memory&cache=shared";
    let storage = Storage::open_uri(uri).expect("open storage");
    let project = storage.create_project("Book").expect("create project");
    let sheet = storage
        .save_sheet_analysis(project.id, &SheetAnalysis::new("A", 0))
        .expect("sheet");

    let mut sparse = StyleAttrs::new();
    sparse.insert("font_name".into(), AttrValue::Text("Arial".into()));

    for range in ["A1", "B1", "C1"] {
        storage
            .save_styled_ranges(
                sheet,
                &[StyledRange {
                    range: range.into(),
                    attrs: sparse.clone(),
                }],
            )
            .expect("save range");
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI;
    let conn = Connection::open_with_flags(uri, flags).expect("open raw connection");
    let fonts: i64 = conn
        .query_row("SELECT COUNT(*) FROM fonts", [], |r| r.get(0))
        .expect("count fonts");
    assert_eq!(fonts, 1, "NULL-heavy tuples must still resolve to one row");
}
