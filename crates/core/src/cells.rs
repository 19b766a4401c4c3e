use crate::models::CellValue;

const NULL_SENTINELS: [&str; 2] = ["nan", "none"];

/// True for missing cells, whitespace and the textual null sentinels.
pub fn is_empty_like(cell: &CellValue) -> bool {
    match cell {
        CellValue::Empty => true,
        CellValue::Number(value) => value.is_nan(),
        CellValue::Text(text) => {
            let trimmed = text.trim();
            trimmed.is_empty()
                || NULL_SENTINELS
                    .iter()
                    .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
        }
    }
}

/// A row is mixed when it holds at least one empty-like and one filled cell.
pub fn is_mixed(row: &[CellValue]) -> bool {
    let mut has_empty = false;
    let mut has_value = false;

    for cell in row {
        if is_empty_like(cell) {
            has_empty = true;
        } else {
            has_value = true;
        }

        if has_empty && has_value {
            return true;
        }
    }

    false
}

pub fn is_blank_row(row: &[CellValue]) -> bool {
    row.iter().all(is_empty_like)
}

pub fn filled_ratio(row: &[CellValue]) -> Option<f64> {
    if row.is_empty() {
        return None;
    }
    let filled = row.iter().filter(|cell| !is_empty_like(cell)).count();
    Some(filled as f64 / row.len() as f64)
}
