use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scalar cell value as produced by the analyzer.
///
/// Variant order matters for untagged deserialization: more specific shapes
/// are tried before `Text`, so an RFC 3339 string becomes a `Timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Real(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl Scalar {
    /// Canonical text form used when a value is written into a sheet value
    /// table. Timestamps become ISO-8601; everything else is its natural
    /// textual rendering.
    pub fn canonical_text(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Real(r) => r.to_string(),
            Scalar::Timestamp(ts) => ts.to_rfc3339(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_text())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(r: f64) -> Self {
        Scalar::Real(r)
    }
}
