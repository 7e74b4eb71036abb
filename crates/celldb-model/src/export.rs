//! The JSON contract handed to the external renderer process.
//!
//! Field names here serialize to exactly what the renderer parses; changing
//! them is a cross-process breaking change.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub project_name: String,
    pub author: String,
    /// ISO-8601 creation timestamp of the project.
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFormula {
    pub cell: String,
    /// Always carries a leading `=`.
    pub formula: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStyle {
    pub range: String,
    /// Nested style object, e.g. `{"font": {"bold": true, "color": "FF0000"}}`.
    pub style: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSeries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
    pub values: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportChart {
    #[serde(rename = "type")]
    pub chart_type: String,
    /// One-based A1 address of the chart's top-left anchor.
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub series: Vec<ExportSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSheet {
    pub name: String,
    /// Dense row-major cell matrix; `None` marks an empty cell.
    pub data: Vec<Vec<Option<String>>>,
    pub formulas: Vec<ExportFormula>,
    pub styles: Vec<ExportStyle>,
    pub charts: Vec<ExportChart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub sheets: Vec<ExportSheet>,
}
