use crate::cells::is_blank_row;
use crate::error::IngestError;
use crate::models::{CellValue, Grid, Provenance, Record};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Column names for a header row. Blank cells become `Column_<position>` and
/// repeated names get a `_2`, `_3`, ... suffix so no column is shadowed.
pub fn header_names(row: &[CellValue]) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut names = Vec::with_capacity(row.len());

    for (position, cell) in row.iter().enumerate() {
        let text = cell.normalized();
        let base = if text.is_empty() {
            format!("Column_{}", position + 1)
        } else {
            text
        };

        let mut name = base.clone();
        let mut suffix = 2;
        while taken.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }

        taken.insert(name.clone());
        names.push(name);
    }

    names
}

pub fn normalize(
    grid: &Grid,
    header_row: usize,
    file_id: &str,
    filename: &str,
) -> Result<Vec<Record>, IngestError> {
    let header = grid.row(header_row).ok_or_else(|| {
        IngestError::InvalidArgument(format!(
            "header row {header_row} is outside the {} rows of {filename}",
            grid.len()
        ))
    })?;
    let columns = header_names(header);

    let mut records = Vec::new();
    for (row_offset, row) in grid.rows()[header_row + 1..].iter().enumerate() {
        if is_blank_row(row) {
            continue;
        }

        let fields: IndexMap<String, String> = columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let value = row.get(index).map(CellValue::normalized).unwrap_or_default();
                (column.clone(), value)
            })
            .collect();

        let record = Record {
            fields,
            provenance: Provenance {
                file_id: file_id.to_string(),
                filename: filename.to_string(),
                row_offset,
                source_row: header_row + 1 + row_offset,
            },
        };

        if record.has_content() {
            records.push(record);
        }
    }

    Ok(records)
}
