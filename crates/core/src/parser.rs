use crate::error::IngestError;
use crate::models::{CellValue, Grid};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

/// Turns raw file bytes into a grid without assuming any header row.
pub trait SheetParser {
    fn parse(&self, bytes: &[u8]) -> Result<Grid, IngestError>;
}

#[derive(Debug, Clone, Copy)]
pub struct DelimitedParser {
    pub delimiter: u8,
}

impl DelimitedParser {
    pub fn csv() -> Self {
        Self { delimiter: b',' }
    }

    pub fn tsv() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl SheetParser for DelimitedParser {
    fn parse(&self, bytes: &[u8]) -> Result<Grid, IngestError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|cell| {
                        if cell.trim().is_empty() {
                            CellValue::Empty
                        } else {
                            CellValue::Text(cell.to_string())
                        }
                    })
                    .collect(),
            );
        }

        Ok(Grid::new(rows))
    }
}

/// First worksheet of an xlsx/xlsm/xls/ods workbook.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookParser;

impl SheetParser for WorkbookParser {
    fn parse(&self, bytes: &[u8]) -> Result<Grid, IngestError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IngestError::Parse("workbook has no worksheets".to_string()))??;

        // The used range may start below or right of A1; keep grid indices
        // aligned with sheet rows.
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];

        for sheet_row in range.rows() {
            let mut row = vec![CellValue::Empty; start_col as usize];
            row.extend(sheet_row.iter().map(cell_from_data));
            rows.push(row);
        }

        Ok(Grid::new(rows))
    }
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        other => CellValue::Text(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Tsv,
    Workbook,
}

impl SheetFormat {
    pub fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        if extension.eq_ignore_ascii_case("csv") {
            SheetFormat::Csv
        } else if extension.eq_ignore_ascii_case("tsv") {
            SheetFormat::Tsv
        } else {
            SheetFormat::Workbook
        }
    }
}

pub fn parse_grid(filename: &str, bytes: &[u8]) -> Result<Grid, IngestError> {
    match SheetFormat::from_filename(filename) {
        SheetFormat::Csv => DelimitedParser::csv().parse(bytes),
        SheetFormat::Tsv => DelimitedParser::tsv().parse(bytes),
        SheetFormat::Workbook => WorkbookParser.parse(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn csv_rows_keep_blank_cells_and_pad() {
        let bytes = b"Agent Report,,\n,,\nSl,Name,Premium\n1,Alice\n";
        let grid = parse_grid("report.CSV", bytes).expect("csv should parse");

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.width(), 3);
        assert_eq!(
            grid.row(3),
            Some(&[CellValue::from("1"), CellValue::from("Alice"), CellValue::Empty][..])
        );
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let grid = parse_grid("report.tsv", b"a\tb\n1\t2\n").expect("tsv should parse");
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.row(1), Some(&[CellValue::from("1"), CellValue::from("2")][..]));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let result = parse_grid("broken.csv", b"ok,\xff\xfe\n");
        assert!(matches!(result, Err(IngestError::Csv(_))));
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let result = parse_grid("broken.xlsx", b"definitely not a zip archive");
        assert!(result.is_err());
    }

    #[test]
    fn workbook_cells_are_read_with_sheet_offsets() -> Result<(), Box<dyn std::error::Error>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(1, 1, "Agent Report")?;
        sheet.write_string(2, 1, "Sl")?;
        sheet.write_string(2, 2, "Commission")?;
        sheet.write_number(3, 1, 15234)?;
        sheet.write_number(3, 2, 1200.5)?;
        let bytes = workbook.save_to_buffer()?;

        let grid = parse_grid("agents.xlsx", &bytes)?;

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.row(0), Some(&[CellValue::Empty, CellValue::Empty, CellValue::Empty][..]));
        assert_eq!(grid.rows()[3][1].normalized(), "15234");
        assert_eq!(grid.rows()[3][2].normalized(), "1200.5");
        Ok(())
    }
}
