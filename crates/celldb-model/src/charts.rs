use serde::{Deserialize, Serialize};

use crate::address::CellRef;

/// Role an axis plays within a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisRole {
    Category,
    Value,
    Date,
    Series,
}

impl AxisRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AxisRole::Category => "cat",
            AxisRole::Value => "val",
            AxisRole::Date => "date",
            AxisRole::Series => "ser",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cat" => Some(AxisRole::Category),
            "val" => Some(AxisRole::Value),
            "date" => Some(AxisRole::Date),
            "ser" => Some(AxisRole::Series),
            _ => None,
        }
    }
}

/// Role a data source plays within a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataRole {
    Values,
    Categories,
}

impl DataRole {
    pub fn as_str(self) -> &'static str {
        match self {
            DataRole::Values => "values",
            DataRole::Categories => "categories",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "values" => Some(DataRole::Values),
            "categories" => Some(DataRole::Categories),
            _ => None,
        }
    }
}

/// A range formula feeding a series, tagged by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataSource {
    pub role: DataRole,
    /// Range formula string, e.g. `Sales!$B$2:$B$5`.
    pub formula: String,
}

/// One plotted series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Positional index within the chart; data sources are linked by this
    /// index, not by a database row id.
    pub idx: i64,
    /// Plot order.
    pub order: i64,
    /// Reference (or literal) naming the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert_if_negative: Option<bool>,
    #[serde(default)]
    pub data_sources: Vec<ChartDataSource>,
}

/// Axis configuration. Everything beyond the role is optional; partially
/// populated axis records are expected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartAxis {
    pub role: Option<AxisRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ax_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_fmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_tick_mark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_tick_mark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick_label_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crosses: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crosses_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_unit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_unit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_base: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_gridlines: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_gridlines: Option<bool>,
}

/// A complete chart as attached to one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Renderer chart type, e.g. `"col"`, `"line"`, `"pie"`, `"bar"`.
    pub chart_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Top-left anchor, 0-indexed. Missing anchors export at a default
    /// position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<CellRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_vis_only: Option<bool>,
    #[serde(default)]
    pub axes: Vec<ChartAxis>,
    #[serde(default)]
    pub series: Vec<ChartSeries>,
}
