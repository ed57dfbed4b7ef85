//! Table export: CSV, JSON and a minimal HTML table.
//!
//! Only exportable columns are written, each formatted with its
//! [`ColumnFormat`](super::ColumnFormat). JSON keeps raw values for `Text`
//! columns so numbers and booleans stay typed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

use super::column::{ColumnConfig, ColumnFormat, Row};
use super::state::TableState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
    Html,
}

impl ExportFormat {
    /// Format for a file extension (`csv`, `json`, `html`/`htm`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Which rows to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    /// Rows passing the filter, in view order.
    #[default]
    Filtered,
    /// Every row in source order.
    All,
}

/// Render the table as a string.
pub fn export(state: &TableState, format: ExportFormat, scope: ExportScope) -> Result<String> {
    let columns: Vec<&ColumnConfig> = state.columns().iter().filter(|c| c.exportable).collect();
    let rows: Vec<&Row> = match scope {
        ExportScope::Filtered => state.view().collect(),
        ExportScope::All => state.rows().iter().collect(),
    };
    debug!(?format, ?scope, rows = rows.len(), columns = columns.len(), "exporting table");

    match format {
        ExportFormat::Csv => to_csv(&columns, &rows),
        ExportFormat::Json => to_json(&columns, &rows),
        ExportFormat::Html => Ok(to_html(&columns, &rows)),
    }
}

/// Export to a file, choosing the format from its extension.
pub fn export_to_path(state: &TableState, path: &Path, scope: ExportScope) -> Result<()> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ExportFormat::from_extension)
        .ok_or_else(|| Error::Data(format!("no export format for {}", path.display())))?;
    let text = export(state, format, scope)?;
    std::fs::write(path, text)?;
    Ok(())
}

fn to_csv(columns: &[&ColumnConfig], rows: &[&Row]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.title.as_str()))?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| c.cell(row)))?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::Data(e.to_string()))
}

fn to_json(columns: &[&ColumnConfig], rows: &[&Row]) -> Result<String> {
    let records: Vec<Row> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| {
                    let raw = row.get(&c.key).cloned().unwrap_or(Value::Null);
                    let value = match c.format {
                        ColumnFormat::Text => raw,
                        _ => Value::String(c.format.format(&raw)),
                    };
                    (c.key.clone(), value)
                })
                .collect()
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

fn to_html(columns: &[&ColumnConfig], rows: &[&Row]) -> String {
    let mut out = String::from("<table>\n<thead>\n<tr>");
    for c in columns {
        out.push_str(&format!("<th>{}</th>", escape_html(&c.title)));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for c in columns {
            out.push_str(&format!("<td>{}</td>", escape_html(&c.cell(row))));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
