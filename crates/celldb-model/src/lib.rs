//! Core in-memory data model for celldb.
//!
//! This crate is intentionally free of any database dependency so it can be
//! shared between the storage engine and the export pipeline. It exposes:
//! - A1 cell/range addressing with bijective base-26 column letters
//! - Scalar cell values with a canonical text coercion
//! - Flat style attribute maps and styled ranges
//! - The chart object graph (chart → axes, series → data sources)
//! - The analyzer input document
//! - The export contract handed to the external renderer

pub mod address;
pub mod charts;
pub mod document;
pub mod export;
pub mod style;
pub mod value;

pub use address::{col_to_name, name_to_col, A1ParseError, CellRef, Range, RangeParseError};
pub use charts::{AxisRole, Chart, ChartAxis, ChartDataSource, ChartSeries, DataRole};
pub use document::{DocumentAnalysis, FormulaRecord, RawCell, SheetAnalysis};
pub use export::{
    ExportChart, ExportDocument, ExportFormula, ExportMetadata, ExportSeries, ExportSheet,
    ExportStyle,
};
pub use style::{AttrValue, StyleAttrs, StyledRange};
pub use value::Scalar;
