use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single style attribute value. Booleans are carried as integers, the way
/// spreadsheet style records encode them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Real(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(r: f64) -> Self {
        AttrValue::Real(r)
    }
}

/// A flat style attribute map, e.g. `{"font_b": 1, "font_color": "FF0000"}`.
///
/// `BTreeMap` keeps iteration deterministic, which matters for stable SQL
/// parameter binding and reproducible tests.
pub type StyleAttrs = BTreeMap<String, AttrValue>;

/// A cell range associated with a composite style.
///
/// `range` is an opaque A1-style address such as `"A1"` or `"A1:C3"`. Ranges
/// for one sheet are not guaranteed disjoint; consumers apply them in stored
/// order (last applied wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledRange {
    pub range: String,
    pub attrs: StyleAttrs,
}
