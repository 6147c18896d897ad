//! Writing extracted data to disk.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;
use webpilot_protocols::ActionOutcome;

use crate::csv;
use crate::error::ExtractError;

/// Where data was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub path: PathBuf,
    pub format: String,
}

impl SavedFile {
    pub fn to_outcome(&self) -> ActionOutcome {
        let path = self.path.display().to_string();
        ActionOutcome::ok(format!("Saved data to {}", path))
            .with("file_path", path)
            .with("format", self.format.clone())
    }
}

/// Write `data` to `path` as `json`, `csv` or `txt`, creating parent
/// directories as needed.
pub async fn save_data(
    data: &Value,
    path: impl AsRef<Path>,
    format: &str,
) -> Result<SavedFile, ExtractError> {
    save_columns(data, &[], path, format).await
}

/// Like [`save_data`], with `columns` fixing the CSV header of a list of
/// records. Without them the first record's keys are used.
pub async fn save_columns(
    data: &Value,
    columns: &[String],
    path: impl AsRef<Path>,
    format: &str,
) -> Result<SavedFile, ExtractError> {
    let path = path.as_ref();
    let format = format.to_lowercase();
    let body = match format.as_str() {
        "json" => serde_json::to_string_pretty(data)?,
        "csv" => render_csv(data, columns),
        "txt" => render_txt(data),
        _ => return Err(ExtractError::UnsupportedFormat(format)),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, body).await?;
    info!("Saved {} data to {}", format, path.display());

    Ok(SavedFile {
        path: path.to_path_buf(),
        format,
    })
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_csv(data: &Value, columns: &[String]) -> String {
    let items = match data {
        // Already rendered, e.g. a table extracted with `format: csv`.
        Value::String(s) => return s.clone(),
        Value::Array(items) => items,
        other => return csv::write_record(&[cell(other)]),
    };

    if let Some(Value::Object(first)) = items.first() {
        if items.iter().all(Value::is_object) {
            let header: Vec<String> = if columns.is_empty() {
                first.keys().cloned().collect()
            } else {
                columns.to_vec()
            };
            let rows: Vec<Vec<String>> = items
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| {
                    header
                        .iter()
                        .map(|key| obj.get(key).map(cell).unwrap_or_default())
                        .collect()
                })
                .collect();
            return csv::to_csv(Some(&header[..]), &rows);
        }
    }

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| match item {
            Value::Array(cells) => cells.iter().map(cell).collect(),
            other => vec![cell(other)],
        })
        .collect();
    csv::to_csv::<String>(None, &rows)
}

fn render_txt(data: &Value) -> String {
    match data {
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join("\n"),
        other => cell(other),
    }
}
