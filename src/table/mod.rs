//! CSV input and output.
//!
//! Task lists are read with a required URL column and an optional label
//! column. Every table written here has its header row even when it has no
//! data rows.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::app::{Result, ReviewtapError};
use crate::config::PathsConfig;
use crate::domain::{ReviewRecord, Task};

pub const REVIEW_HEADERS: [&str; 3] = ["title", "content", "type"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column names and encoding shared by every table of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFormat {
    pub url_column: String,
    pub label_column: String,
    pub bom: bool,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self::from(&PathsConfig::default())
    }
}

impl From<&PathsConfig> for TableFormat {
    fn from(paths: &PathsConfig) -> Self {
        Self {
            url_column: paths.url_column.clone(),
            label_column: paths.label_column.clone(),
            bom: paths.excel_bom,
        }
    }
}

/// One data row of a task list, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    /// 1-based line in the source file
    pub line: u64,
    pub url: String,
    pub label: Option<String>,
}

impl InputRow {
    pub fn new(line: u64, url: impl Into<String>, label: Option<&str>) -> Self {
        Self {
            line,
            url: url.into(),
            label: label.map(String::from),
        }
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    if !path.is_file() {
        return Err(ReviewtapError::InputNotFound(path.to_path_buf()));
    }
    Ok(csv::ReaderBuilder::new().flexible(true).from_path(path)?)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
}

/// Read a task list. The URL column must exist; the label column may not.
pub fn read_task_rows(path: &Path, format: &TableFormat) -> Result<Vec<InputRow>> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();

    let url_index = column_index(&headers, &format.url_column).ok_or_else(|| {
        ReviewtapError::MissingColumn {
            column: format.url_column.clone(),
            path: path.to_path_buf(),
        }
    })?;
    let label_index = column_index(&headers, &format.label_column);
    if label_index.is_none() {
        warn!(
            "{} has no '{}' column, every task is labelled N/A",
            path.display(),
            format.label_column
        );
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(InputRow {
            line,
            url: record.get(url_index).unwrap_or_default().trim().to_string(),
            label: label_index
                .and_then(|i| record.get(i))
                .map(|s| s.trim().to_string()),
        });
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read the non-empty values of one column.
pub fn read_urls(path: &Path, column: &str) -> Result<Vec<String>> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    let index = column_index(&headers, column).ok_or_else(|| ReviewtapError::MissingColumn {
        column: column.to_string(),
        path: path.to_path_buf(),
    })?;

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(url) = record.get(index).map(str::trim).filter(|u| !u.is_empty()) {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

fn output_error(path: &Path) -> impl Fn(csv::Error) -> ReviewtapError + '_ {
    move |source| ReviewtapError::Output {
        path: path.to_path_buf(),
        source,
    }
}

/// Create `path` (and its parent directory), starting with the BOM if asked.
fn create_file(path: &Path, bom: bool) -> Result<File> {
    let to_output = output_error(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| to_output(e.into()))?;
    }

    let mut file = File::create(path).map_err(|e| to_output(e.into()))?;
    if bom {
        file.write_all(UTF8_BOM).map_err(|e| to_output(e.into()))?;
    }
    Ok(file)
}

fn create_writer(path: &Path, bom: bool, headers: &[&str]) -> Result<csv::Writer<File>> {
    let mut writer = csv::Writer::from_writer(create_file(path, bom)?);
    writer.write_record(headers).map_err(output_error(path))?;
    Ok(writer)
}

fn finish(path: &Path, mut writer: csv::Writer<File>) -> Result<()> {
    writer.flush().map_err(|e| output_error(path)(e.into()))?;
    Ok(())
}

/// Write reviews as `title,content,type`.
pub fn write_reviews(path: &Path, records: &[ReviewRecord], bom: bool) -> Result<()> {
    let mut writer = csv::Writer::from_writer(create_file(path, bom)?);
    // The header comes from the first serialized record
    if records.is_empty() {
        writer.write_record(REVIEW_HEADERS).map_err(output_error(path))?;
    }
    for record in records {
        writer.serialize(record).map_err(output_error(path))?;
    }
    finish(path, writer)
}

/// Write a single-column URL list.
pub fn write_urls(path: &Path, urls: &[String], format: &TableFormat) -> Result<()> {
    let mut writer = create_writer(path, format.bom, &[format.url_column.as_str()])?;
    for url in urls {
        writer.write_record([url]).map_err(output_error(path))?;
    }
    finish(path, writer)
}

/// Write tasks as a URL plus label table, readable by [`read_task_rows`].
pub fn write_tasks(path: &Path, tasks: &[Task], format: &TableFormat) -> Result<()> {
    let mut writer = create_writer(
        path,
        format.bom,
        &[format.url_column.as_str(), format.label_column.as_str()],
    )?;
    for task in tasks {
        writer
            .write_record([&task.url, &task.label])
            .map_err(output_error(path))?;
    }
    finish(path, writer)
}
