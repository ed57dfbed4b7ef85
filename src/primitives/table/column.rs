//! Column configuration, cell formatting and value ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::layout::Track;
use crate::types::TextAlign;

/// One table row: column key → value.
pub type Row = serde_json::Map<String, Value>;

/// How a cell value is turned into text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ColumnFormat {
    /// Strings as-is, other values in their JSON form.
    #[default]
    Text,
    /// Fixed number of decimals.
    Number { decimals: u8 },
    /// A 0..1 ratio shown as a percentage.
    Percent { decimals: u8 },
    /// Booleans as custom words.
    Flag { yes: String, no: String },
}

impl ColumnFormat {
    pub fn format(&self, value: &Value) -> String {
        match (self, value) {
            (_, Value::Null) => String::new(),
            (Self::Number { decimals }, Value::Number(n)) => match n.as_f64() {
                Some(f) => format!("{f:.prec$}", prec = *decimals as usize),
                None => n.to_string(),
            },
            (Self::Percent { decimals }, Value::Number(n)) => match n.as_f64() {
                Some(f) => format!("{:.prec$}%", f * 100.0, prec = *decimals as usize),
                None => n.to_string(),
            },
            (Self::Flag { yes, no }, Value::Bool(b)) => if *b { yes.clone() } else { no.clone() },
            (_, value) => plain_text(value),
        }
    }
}

/// Text of a value with no formatting applied.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Table column.
///
/// `width` is a grid track token (`"12"`, `"2*"`, `"*"`, `"auto"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub key: String,
    pub title: String,
    pub width: String,
    pub align: TextAlign,
    pub sortable: bool,
    pub filterable: bool,
    pub exportable: bool,
    pub format: ColumnFormat,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            title: String::new(),
            width: "*".to_string(),
            align: TextAlign::Left,
            sortable: true,
            filterable: true,
            exportable: true,
            format: ColumnFormat::Text,
        }
    }
}

impl ColumnConfig {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn width(mut self, token: impl Into<String>) -> Self {
        self.width = token.into();
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn format(mut self, format: ColumnFormat) -> Self {
        self.format = format;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn exportable(mut self, exportable: bool) -> Self {
        self.exportable = exportable;
        self
    }

    pub fn track(&self) -> Result<Track> {
        Track::parse(&self.width)
    }

    /// Formatted cell text for `row`.
    pub fn cell(&self, row: &Row) -> String {
        row.get(&self.key).map(|v| self.format.format(v)).unwrap_or_default()
    }
}

/// Total order used for sorting: nulls first, then booleans, numbers,
/// strings (case-insensitive) and everything else by its JSON text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Some(x), Some(y)) if rank(a) == rank(b) && rank(a) == 4 => x.to_string().cmp(&y.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}
