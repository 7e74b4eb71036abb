use serde::{Deserialize, Serialize};

use crate::charts::Chart;
use crate::style::StyledRange;
use crate::value::Scalar;

/// One non-empty cell in a sheet, addressed sparsely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCell {
    /// A1-style address, e.g. `"B2"`.
    pub cell: String,
    pub value: Scalar,
}

/// A formula cell plus the addresses it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRecord {
    /// A1-style address of the formula cell.
    pub cell: String,
    pub formula: String,
    #[serde(default)]
    pub references: Vec<String>,
}

/// Everything the analyzer extracted from one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetAnalysis {
    pub name: String,
    /// Ordinal position within the document.
    pub index: i64,
    pub max_row: u32,
    pub max_column: u32,
    /// Opaque structural metadata carried along verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<serde_json::Value>,
    /// Sparse cell contents (address → value); empty cells are omitted.
    #[serde(default)]
    pub raw_data: Vec<RawCell>,
    #[serde(default)]
    pub formulas: Vec<FormulaRecord>,
    #[serde(default)]
    pub styled_ranges: Vec<StyledRange>,
    #[serde(default)]
    pub charts: Vec<Chart>,
    #[serde(default)]
    pub merged_cells: Vec<String>,
}

impl SheetAnalysis {
    /// An empty sheet with the given name and ordinal position.
    pub fn new(name: impl Into<String>, index: i64) -> Self {
        Self {
            name: name.into(),
            index,
            max_row: 0,
            max_column: 0,
            structure: None,
            raw_data: Vec::new(),
            formulas: Vec::new(),
            styled_ranges: Vec::new(),
            charts: Vec::new(),
            merged_cells: Vec::new(),
        }
    }
}

/// The full analyzer output for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub project_name: String,
    #[serde(default)]
    pub sheets: Vec<SheetAnalysis>,
}
