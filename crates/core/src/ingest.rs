use crate::error::IngestError;
use crate::header::locate_header_with;
use crate::models::{
    FailedFile, FileInput, FileResult, FileSource, HeaderOptions, ProcessedFile, Record,
};
use crate::normalize::{header_names, normalize};
use crate::parser::parse_grid;
use chrono::Utc;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const SHEET_EXTENSIONS: [&str; 6] = ["csv", "tsv", "xlsx", "xlsm", "xls", "ods"];

pub fn discover_sheet_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_sheet = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SHEET_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });

        if is_sheet {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Results keyed by file id, in input order.
#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    pub results: IndexMap<String, FileResult>,
}

impl IngestionReport {
    /// Records of every successful file, in file order then row order.
    pub fn flatten_records(&self) -> Vec<Record> {
        self.results
            .values()
            .flat_map(|result| result.records().iter().cloned())
            .collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = &FailedFile> {
        self.results.values().filter_map(|result| match result {
            FileResult::Error(failed) => Some(failed),
            FileResult::Success(_) => None,
        })
    }
}

/// Processes every file in order. A failing file is recorded as an error
/// result and never stops its siblings.
pub fn ingest_files(
    files: impl IntoIterator<Item = FileInput>,
    options: &HeaderOptions,
) -> IngestionReport {
    let mut results = IndexMap::new();

    for (index, input) in files.into_iter().enumerate() {
        let file_id = format!("file_{}", index + 1);

        let result = match ingest_file(&input, &file_id, options) {
            Ok(processed) => {
                info!(
                    file_id = %file_id,
                    filename = %processed.filename,
                    header_row = processed.header_row,
                    row_count = processed.row_count,
                    "processed file"
                );
                FileResult::Success(processed)
            }
            Err(error) => {
                warn!(file_id = %file_id, filename = %input.filename, error = %error, "file skipped");
                FileResult::Error(FailedFile {
                    file_id: file_id.clone(),
                    filename: input.filename.clone(),
                    error: error.to_string(),
                })
            }
        };

        results.insert(file_id, result);
    }

    IngestionReport { results }
}

pub fn ingest_file(
    input: &FileInput,
    file_id: &str,
    options: &HeaderOptions,
) -> Result<ProcessedFile, IngestError> {
    let bytes: Cow<'_, [u8]> = match &input.source {
        FileSource::Bytes(bytes) => Cow::Borrowed(bytes.as_slice()),
        FileSource::Path(path) => Cow::Owned(fs::read(path).map_err(|error| {
            IngestError::Io(std::io::Error::new(
                error.kind(),
                format!("{}: {error}", path.display()),
            ))
        })?),
    };

    let grid = parse_grid(&input.filename, &bytes)?;
    let location = locate_header_with(&grid, options)
        .ok_or_else(|| IngestError::HeaderNotFound(input.filename.clone()))?;

    let columns = grid.row(location.row).map(header_names).unwrap_or_default();
    let records = normalize(&grid, location.row, file_id, &input.filename)?;

    Ok(ProcessedFile {
        file_id: file_id.to_string(),
        filename: input.filename.clone(),
        header_row: location.row,
        rows_above_header: location.row,
        row_count: records.len(),
        column_count: columns.len(),
        columns,
        records,
        checksum: digest_bytes(&bytes),
        processed_at: Utc::now(),
    })
}
