//! Output formatting
//!
//! Command results are rendered as pretty JSON, an aligned table, or
//! tab-separated values. Tables are driven by column definitions that read
//! dot-notation paths out of the JSON form of each result.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
    Tsv,
}

/// Column definition
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub header: &'static str,
    pub json_path: &'static str,
}

const fn column(header: &'static str, json_path: &'static str) -> ColumnDef {
    ColumnDef { header, json_path }
}

pub const REGISTRY_COLUMNS: &[ColumnDef] = &[
    column("NAME", "name"),
    column("RESOURCE GROUP", "resourceGroup"),
    column("LOCATION", "location"),
    column("LOGIN SERVER", "properties.loginServer"),
    column("CREATION DATE", "creationDate_short"),
    column("ADMIN ENABLED", "properties.adminUserEnabled"),
    column("STORAGE ACCOUNT", "properties.storageAccount.name"),
];

pub const NAME_AVAILABILITY_COLUMNS: &[ColumnDef] = &[
    column("NAME AVAILABLE", "nameAvailable"),
    column("REASON", "reason"),
    column("MESSAGE", "message"),
];

/// Result of a command, ready to render
#[derive(Debug, Clone)]
pub struct CommandOutput {
    rows: Vec<Value>,
    /// Single object rather than a list (affects JSON only)
    single: bool,
    columns: &'static [ColumnDef],
}

impl CommandOutput {
    pub fn one<T: Serialize>(item: &T, columns: &'static [ColumnDef]) -> Result<Self> {
        let value = serde_json::to_value(item).context("Failed to serialize result")?;
        Ok(Self {
            rows: vec![value],
            single: true,
            columns,
        })
    }

    pub fn many<T: Serialize>(items: &[T], columns: &'static [ColumnDef]) -> Result<Self> {
        let rows = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to serialize result")?;
        Ok(Self {
            rows,
            single: false,
            columns,
        })
    }

    /// Nothing to print (e.g. after a delete)
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            single: true,
            columns: &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw JSON form of the result
    pub fn json(&self) -> Value {
        if self.single {
            self.rows.first().cloned().unwrap_or(Value::Null)
        } else {
            Value::Array(self.rows.clone())
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        if self.is_empty() && self.single {
            return Ok(String::new());
        }

        match format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&self.json()).context("Failed to render JSON")
            }
            OutputFormat::Table => Ok(self.render_table()),
            OutputFormat::Tsv => Ok(self.render_tsv()),
        }
    }

    fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let row = post_process_item(row.clone());
                self.columns
                    .iter()
                    .map(|c| extract_json_value(&row, c.json_path))
                    .collect()
            })
            .collect()
    }

    fn render_table(&self) -> String {
        let cells = self.cells();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(c.header.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_line = |values: Vec<String>| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:<width$}", v, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = Vec::with_capacity(cells.len() + 2);
        lines.push(format_line(self.columns.iter().map(|c| c.header.to_string()).collect()));
        lines.push(format_line(widths.iter().map(|w| "-".repeat(*w)).collect()));
        lines.extend(cells.into_iter().map(format_line));
        lines.join("\n")
    }

    fn render_tsv(&self) -> String {
        self.cells()
            .into_iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Add computed fields used by table columns
fn post_process_item(mut item: Value) -> Value {
    if let Value::Object(ref mut map) = item {
        if let Some(rg) = map
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(crate::azure::client::resource_group_from_id)
        {
            map.insert("resourceGroup".to_string(), Value::String(rg));
        }

        if let Some(created) = map
            .get("properties")
            .and_then(|p| p.get("creationDate"))
            .and_then(|v| v.as_str())
        {
            let short = format_timestamp_short(created);
            map.insert("creationDate_short".to_string(), Value::String(short));
        }
    }
    item
}

/// Format timestamp to short form
fn format_timestamp_short(timestamp: &str) -> String {
    // RFC3339 format: 2023-01-15T10:30:00.000Z
    if timestamp.len() >= 10 {
        timestamp[..10].to_string()
    } else {
        timestamp.to_string()
    }
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return "-".to_string(),
        };
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_json() -> Value {
        json!({
            "id": "/subscriptions/s/resourceGroups/rg1/providers/Microsoft.ContainerRegistry/registries/reg1",
            "name": "reg1",
            "location": "westus",
            "properties": {
                "loginServer": "reg1-microsoft.azurecr.io",
                "creationDate": "2016-10-01T18:00:00.000Z",
                "adminUserEnabled": false,
                "storageAccount": {"name": "store1"}
            }
        })
    }

    #[test]
    fn test_extract_json_value() {
        let item = json!({"a": {"b": [1, 2, 3]}, "n": null});
        assert_eq!(extract_json_value(&item, "a.b.1"), "2");
        assert_eq!(extract_json_value(&item, "a.b"), "[3 items]");
        assert_eq!(extract_json_value(&item, "n"), "-");
        assert_eq!(extract_json_value(&item, "missing.path"), "-");
    }

    #[test]
    fn test_table_has_computed_columns() {
        let output = CommandOutput::many(&[registry_json()], REGISTRY_COLUMNS).unwrap();
        let table = output.render(OutputFormat::Table).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("----"));
        assert!(lines[2].contains("rg1"));
        assert!(lines[2].contains("2016-10-01"));
        assert!(!lines[2].contains("18:00"));
        assert!(lines[2].contains("store1"));
    }

    #[test]
    fn test_tsv_has_no_header() {
        let output = CommandOutput::one(&registry_json(), REGISTRY_COLUMNS).unwrap();
        let tsv = output.render(OutputFormat::Tsv).unwrap();
        assert_eq!(
            tsv,
            "reg1\trg1\twestus\treg1-microsoft.azurecr.io\t2016-10-01\tfalse\tstore1"
        );
    }

    #[test]
    fn test_json_single_vs_list() {
        let one = CommandOutput::one(&json!({"a": 1}), &[]).unwrap();
        assert_eq!(one.json(), json!({"a": 1}));

        let many = CommandOutput::many::<Value>(&[], &[]).unwrap();
        assert_eq!(many.render(OutputFormat::Json).unwrap(), "[]");

        assert_eq!(CommandOutput::empty().render(OutputFormat::Json).unwrap(), "");
    }
}
