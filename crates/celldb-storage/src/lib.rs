//! SQLite-backed storage for celldb projects.
//!
//! This crate persists analyzed spreadsheet documents in a normalized
//! relational form and reads them back for export. It exposes:
//! - SQLite schema creation (idempotent, safe on every open)
//! - Project/sheet registries and project metadata
//! - Content-deduplicated style dimension and composite style stores
//! - Dynamic per-sheet value tables with a table-name registry
//! - Formula, chart, merged-range and append-only history stores
//! - The per-sheet "save analysis" orchestration (one transaction per sheet)

mod charts;
mod dimensions;
mod formulas;
mod history;
mod schema;
pub mod storage;
mod styles;
mod values;

pub use history::HistoryRecord;
pub use storage::{ProjectMeta, SheetMeta, Storage, StorageError, ValueTable};
