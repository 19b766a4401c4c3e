use crate::models::Record;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

const SAMPLE_SCAN_RECORDS: usize = 5;
const MIN_SAMPLE_ID_DIGITS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub filename: String,
    pub record_count: usize,
    pub columns: Vec<String>,
    pub sample_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSummary {
    pub total_records: usize,
    pub files: Vec<FileSummary>,
}

/// Groups records by filename in first-seen order.
pub fn summarize(records: &[Record]) -> DataSummary {
    let mut groups: IndexMap<&str, Vec<&Record>> = IndexMap::new();
    for record in records {
        groups
            .entry(record.provenance.filename.as_str())
            .or_default()
            .push(record);
    }

    let files = groups
        .into_iter()
        .map(|(filename, group)| FileSummary {
            filename: filename.to_string(),
            record_count: group.len(),
            columns: group
                .first()
                .map(|record| record.fields.keys().cloned().collect())
                .unwrap_or_default(),
            sample_ids: group
                .iter()
                .take(SAMPLE_SCAN_RECORDS)
                .filter_map(|record| sample_id(record))
                .collect(),
        })
        .collect();

    DataSummary {
        total_records: records.len(),
        files,
    }
}

fn sample_id(record: &Record) -> Option<String> {
    record
        .non_empty_fields()
        .map(|(_, value)| value.trim())
        .find(|value| {
            value.len() >= MIN_SAMPLE_ID_DIGITS && value.chars().all(|ch| ch.is_ascii_digit())
        })
        .map(str::to_string)
}

impl fmt::Display for DataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_records == 0 {
            return write!(f, "No data loaded.");
        }

        writeln!(f, "Total records loaded: {}", self.total_records)?;
        for file in &self.files {
            writeln!(f)?;
            writeln!(f, "File: {} ({} records)", file.filename, file.record_count)?;
            writeln!(f, "Columns: {}", file.columns.join(", "))?;
            if !file.sample_ids.is_empty() {
                writeln!(f, "Sample IDs: {}", file.sample_ids.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn record(filename: &str, fields: &[(&str, &str)]) -> Record {
        Record {
            fields: fields
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            provenance: Provenance {
                file_id: "file_1".to_string(),
                filename: filename.to_string(),
                row_offset: 0,
                source_row: 0,
            },
        }
    }

    #[test]
    fn empty_store_has_no_data() {
        assert_eq!(summarize(&[]).to_string(), "No data loaded.");
    }

    #[test]
    fn records_group_by_filename_with_sample_ids() {
        let mut records: Vec<Record> = (0..7)
            .map(|index| {
                let id = format!("{}", 15230 + index);
                record("agents.csv", &[("Sl", "1"), ("Code", id.as_str())])
            })
            .collect();
        records.push(record("payroll.xlsx", &[("Name", "Alice"), ("Net Pay", "300")]));

        let summary = summarize(&records);
        assert_eq!(summary.total_records, 8);
        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.files[0].columns, vec!["Sl", "Code"]);
        assert_eq!(
            summary.files[0].sample_ids,
            vec!["15230", "15231", "15232", "15233", "15234"]
        );
        assert!(summary.files[1].sample_ids.is_empty());

        let text = summary.to_string();
        assert!(text.starts_with("Total records loaded: 8\n"));
        assert!(text.contains("File: payroll.xlsx (1 records)\nColumns: Name, Net Pay\n"));
        assert!(!text.contains("Sample IDs: \n"));
    }
}
