//! Header normalization for raw sheet grids.
//!
//! Promotes a designated row to column labels, discards the rows above it,
//! drops fully empty columns and keeps only the first of any duplicated
//! labels.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Raw sheet contents, row-major
pub type Grid = Vec<Vec<String>>;

/// Table with one trimmed, unique label per column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn column_index(&self, matches: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|h| matches(h))
    }

    /// Grid with the header as row 0
    pub fn to_grid(&self) -> Grid {
        std::iter::once(self.headers.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}

fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// Normalize `grid` using `header_row` as the label row.
///
/// A grid with no row at `header_row` yields an empty table; the caller
/// decides how to report it.
pub fn normalize_header(grid: &[Vec<String>], header_row: usize) -> NormalizedTable {
    if grid.len() <= header_row {
        debug!(
            "Grid has {} rows, header row {} unavailable",
            grid.len(),
            header_row
        );
        return NormalizedTable::default();
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    // Columns blank in the header and every data row are dropped; rows above
    // the header do not count
    let kept_rows = &grid[header_row..];
    let occupied: Vec<usize> = (0..width)
        .filter(|&col| kept_rows.iter().any(|row| !is_blank(cell(row, col))))
        .collect();

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(occupied.len());
    let mut headers = Vec::with_capacity(occupied.len());
    for &col in &occupied {
        let label = cell(&grid[header_row], col).trim().to_string();
        if seen.insert(label.clone()) {
            kept.push(col);
            headers.push(label);
        } else {
            debug!("Dropping duplicate column '{}' at index {}", label, col);
        }
    }

    let rows: Vec<Vec<String>> = grid[header_row + 1..]
        .iter()
        .map(|row| kept.iter().map(|&col| cell(row, col).to_string()).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(|c| is_blank(c)))
        .collect();

    debug!(
        "Normalized header: {} columns kept of {}, {} data rows",
        headers.len(),
        width,
        rows.len()
    );

    NormalizedTable { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_promotes_second_row() {
        let raw = grid(&[
            &["ORDER STATUS", "", ""],
            &[" CONT.PERSON ", "ORD WT", "ORD NO"],
            &["John", "1000", "A-1"],
        ]);

        let table = normalize_header(&raw, 1);

        assert_eq!(table.headers, vec!["CONT.PERSON", "ORD WT", "ORD NO"]);
        assert_eq!(table.rows, vec![vec!["John", "1000", "A-1"]]);
    }

    #[test]
    fn test_drops_empty_columns_and_duplicates() {
        let raw = grid(&[
            &["title", "", "", ""],
            &["ORD WT", "", "ORD WT", "ITEM NAME"],
            &["10", "", "99", "Chain"],
            &["20", " ", "98", "Ring"],
        ]);

        let table = normalize_header(&raw, 1);

        assert_eq!(table.headers, vec!["ORD WT", "ITEM NAME"]);
        assert_eq!(table.rows[0], vec!["10", "Chain"]);
        assert_eq!(table.rows[1], vec!["20", "Ring"]);
    }

    #[test]
    fn test_short_grid_yields_empty_table() {
        let raw = grid(&[&["only one row"]]);

        let table = normalize_header(&raw, 1);

        assert!(table.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_ragged_rows_are_padded_and_blank_rows_dropped() {
        let raw = grid(&[
            &["", ""],
            &["A", "B"],
            &["1"],
            &["", ""],
            &["2", "x", "stray"],
        ]);

        let table = normalize_header(&raw, 1);

        assert_eq!(table.headers, vec!["A", "B", ""]);
        assert_eq!(table.rows, vec![vec!["1", "", ""], vec!["2", "x", "stray"]]);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raw = grid(&[
            &["junk", "", ""],
            &["CONT.PERSON", "ORD WT", "CONT.PERSON"],
            &["John", "1000", "dup"],
            &["Asha", "500", "dup"],
        ]);

        let once = normalize_header(&raw, 1);
        let twice = normalize_header(&once.to_grid(), 0);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_title_only_column_is_dropped() {
        let raw = grid(&[&["", "", "Report 2025"], &["A", "B", ""], &["1", "2", ""]]);

        let once = normalize_header(&raw, 1);
        let twice = normalize_header(&once.to_grid(), 0);

        assert_eq!(once.headers, vec!["A", "B"]);
        assert_eq!(once, twice);
    }
}
