use crate::cells::{filled_ratio, is_mixed};
use crate::models::{Grid, HeaderOptions};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStrategy {
    /// Start of the first run of consecutive mixed rows.
    MixedPattern,
    /// First densely filled row near the top of the sheet.
    Density,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    pub row: usize,
    pub strategy: HeaderStrategy,
}

pub fn locate_header(grid: &Grid) -> Option<HeaderLocation> {
    locate_header_with(grid, &HeaderOptions::default())
}

/// Earliest match wins: the first run of `pattern_rows` mixed rows, else the
/// first row within `fallback_scan_rows` whose filled ratio reaches
/// `fallback_min_density`.
pub fn locate_header_with(grid: &Grid, options: &HeaderOptions) -> Option<HeaderLocation> {
    let rows = grid.rows();
    let window = options.pattern_rows.max(1);

    for (index, run) in rows.windows(window).enumerate() {
        if run.iter().all(|row| is_mixed(row)) {
            debug!(row = index, "header found by mixed-row pattern");
            return Some(HeaderLocation {
                row: index,
                strategy: HeaderStrategy::MixedPattern,
            });
        }
    }

    let found = rows
        .iter()
        .take(options.fallback_scan_rows)
        .position(|row| {
            filled_ratio(row).is_some_and(|ratio| ratio >= options.fallback_min_density)
        })?;

    debug!(row = found, "header found by density fallback");
    Some(HeaderLocation {
        row: found,
        strategy: HeaderStrategy::Density,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn grid(rows: &[&[Option<&str>]]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
                .collect(),
        )
    }

    #[test]
    fn three_mixed_rows_pick_the_first() {
        let grid = grid(&[
            &[None, None, None],
            &[Some("Report"), None, None],
            &[Some("Sl"), Some("Name"), None],
            &[Some("1"), None, Some("500")],
            &[Some("2"), Some("Bob"), Some("700")],
        ]);

        let location = locate_header(&grid).expect("header should be found");
        assert_eq!(location.row, 1);
        assert_eq!(location.strategy, HeaderStrategy::MixedPattern);
    }

    #[test]
    fn single_mixed_title_row_does_not_misfire() {
        let grid = grid(&[
            &[Some("Title"), None, None],
            &[Some("Sl"), Some("Name"), Some("Premium")],
            &[Some("1"), Some("Alice"), Some("500")],
            &[Some("2"), Some("Bob"), Some("")],
        ]);

        let location = locate_header(&grid).expect("header should be found");
        assert_eq!(location.row, 1);
        assert_eq!(location.strategy, HeaderStrategy::Density);
    }

    #[test]
    fn half_filled_first_row_wins_the_fallback() {
        let rows = vec![
            vec![CellValue::from("A"), CellValue::Empty],
            vec!["B".into(), "C".into()],
            vec!["D".into(), CellValue::Empty],
            vec![CellValue::Number(1.0), CellValue::Number(2.0)],
            vec![CellValue::Number(3.0), CellValue::Number(4.0)],
        ];

        let location = locate_header(&Grid::new(rows)).expect("header should be found");
        assert_eq!(location.row, 0);
    }

    #[test]
    fn fully_populated_grid_falls_back_to_row_zero() {
        let rows = vec![vec![CellValue::from("x"), CellValue::from("y")]; 10];
        let location = locate_header(&Grid::new(rows)).expect("header should be found");
        assert_eq!(location.row, 0);
        assert_eq!(location.strategy, HeaderStrategy::Density);
    }

    #[test]
    fn fallback_only_scans_the_top_rows() {
        let mut rows: Vec<Vec<CellValue>> = (0..10)
            .map(|index| {
                let first = if index % 2 == 0 { CellValue::from("x") } else { CellValue::Empty };
                vec![first, CellValue::Empty, CellValue::Empty]
            })
            .collect();
        rows.push(vec!["a".into(), "b".into(), "c".into()]);

        assert_eq!(locate_header(&Grid::new(rows)), None);
    }

    #[test]
    fn empty_grid_has_no_header() {
        assert_eq!(locate_header(&Grid::default()), None);
        assert_eq!(locate_header(&grid(&[&[None, None], &[None, None]])), None);
    }
}
