use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single cell as read from the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Trimmed text used for storage. Empty-like cells normalize to `""`.
    pub fn normalized(&self) -> String {
        if crate::cells::is_empty_like(self) {
            return String::new();
        }

        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.trim().to_string(),
            CellValue::Number(value) => render_number(*value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Rows of cells for one file, padded to a common width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

impl From<Vec<Vec<CellValue>>> for Grid {
    fn from(rows: Vec<Vec<CellValue>>) -> Self {
        Self::new(rows)
    }
}

/// Where a record came from. Kept apart from the column mapping so a column
/// can never shadow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub file_id: String,
    pub filename: String,
    /// Zero-based offset within the rows that follow the header.
    pub row_offset: usize,
    /// Index of the row in the raw grid.
    pub source_row: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: IndexMap<String, String>,
    pub provenance: Provenance,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn non_empty_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn has_content(&self) -> bool {
        self.non_empty_fields().next().is_some()
    }

    /// Text projection shared by the vector index and the keyword fallback.
    pub fn render(&self) -> String {
        let mut parts = vec![format!("Record from {}:", self.provenance.filename)];
        parts.extend(
            self.non_empty_fields()
                .map(|(key, value)| format!("{key}: {value}")),
        );
        parts.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalDocument {
    pub text: String,
    pub filename: String,
    pub file_id: String,
    pub row_offset: usize,
}

impl From<&Record> for RetrievalDocument {
    fn from(record: &Record) -> Self {
        Self {
            text: record.render(),
            filename: record.provenance.filename.clone(),
            file_id: record.provenance.file_id.clone(),
            row_offset: record.provenance.row_offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub document: RetrievalDocument,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub enum FileSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// One file handed over by the caller.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub filename: String,
    pub source: FileSource,
}

impl FileInput {
    pub fn from_bytes(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            source: FileSource::Bytes(bytes.into()),
        }
    }

    /// The file is read lazily during ingestion, so a missing path shows up
    /// as a failed result for this file only.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());

        Self {
            filename,
            source: FileSource::Path(path.to_path_buf()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub file_id: String,
    pub filename: String,
    pub header_row: usize,
    pub rows_above_header: usize,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    pub row_count: usize,
    pub column_count: usize,
    pub checksum: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file_id: String,
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileResult {
    Success(ProcessedFile),
    Error(FailedFile),
}

impl FileResult {
    pub fn file_id(&self) -> &str {
        match self {
            FileResult::Success(file) => &file.file_id,
            FileResult::Error(file) => &file.file_id,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            FileResult::Success(file) => &file.filename,
            FileResult::Error(file) => &file.filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileResult::Success(_))
    }

    pub fn records(&self) -> &[Record] {
        match self {
            FileResult::Success(file) => &file.records,
            FileResult::Error(_) => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeaderOptions {
    /// Consecutive mixed rows that mark the header region.
    pub pattern_rows: usize,
    pub fallback_scan_rows: usize,
    pub fallback_min_density: f64,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            pattern_rows: 3,
            fallback_scan_rows: 10,
            fallback_min_density: 0.5,
        }
    }
}

/// A question phrase and the column names it may refer to, in preference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAlias {
    pub phrase: String,
    pub columns: Vec<String>,
}

impl FieldAlias {
    pub fn new(phrase: &str, columns: &[&str]) -> Self {
        Self {
            phrase: phrase.to_string(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
        }
    }
}

const DEFAULT_FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("ac no", &["Ac No", "Account No", "Account Number"]),
    ("organization", &["Organization", "Org", "Company"]),
    ("designation", &["Designation", "Position", "Title"]),
    ("job duration", &["Job Duration", "Duration", "Service"]),
    ("total business", &["Total Business", "Total Premium", "Business"]),
    ("commission", &["Commission", "Com"]),
    ("pf", &["PF", "Provident Fund"]),
    ("allowance", &["Allowance", "Allow"]),
    ("net pay", &["Net Pay", "Net", "Pay"]),
    ("tds", &["TDS", "Tax"]),
    ("total premium", &["Total Premium", "Premium", "Total PR"]),
    ("agent name", &["Agent Name", "Name"]),
    ("sl", &["Sl", "Serial", "ID"]),
];

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub top_k: usize,
    pub identifier_regex: &'static str,
    pub field_aliases: Vec<FieldAlias>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            identifier_regex: r"\b(\d{4,6})\b",
            field_aliases: DEFAULT_FIELD_ALIASES
                .iter()
                .map(|(phrase, columns)| FieldAlias::new(phrase, columns))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, &str)]) -> Record {
        Record {
            fields: fields
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            provenance: Provenance {
                file_id: "file_1".to_string(),
                filename: "agents.csv".to_string(),
                row_offset: 0,
                source_row: 3,
            },
        }
    }

    #[test]
    fn grid_pads_short_rows() {
        let grid = Grid::new(vec![
            vec![CellValue::from("Title")],
            vec!["Sl".into(), "Name".into(), "Premium".into()],
        ]);

        assert_eq!(grid.width(), 3);
        assert_eq!(
            grid.row(0),
            Some(&[CellValue::from("Title"), CellValue::Empty, CellValue::Empty][..])
        );
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(15234.0).normalized(), "15234");
        assert_eq!(CellValue::Number(12.5).normalized(), "12.5");
        assert_eq!(CellValue::from("  NaN ").normalized(), "");
    }

    #[test]
    fn render_skips_empty_values() {
        let record = record(&[("Sl", "1"), ("Name", ""), ("Commission", "1200")]);
        assert_eq!(
            record.render(),
            "Record from agents.csv:\nSl: 1\nCommission: 1200"
        );
    }

    #[test]
    fn column_named_like_metadata_stays_a_column() {
        let record = record(&[("_filename", "spoofed.csv")]);
        assert_eq!(record.get("_filename"), Some("spoofed.csv"));
        assert_eq!(record.provenance.filename, "agents.csv");
    }
}
