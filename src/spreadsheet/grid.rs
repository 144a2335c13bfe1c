use crate::spreadsheet::SpreadsheetError;
use std::borrow::Cow;
use std::fmt;

/// A single cell of a [`RawGrid`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// True for empty cells and text that is blank after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Textual form of the cell. Integral numbers render without a fraction
    /// (`1234.0` becomes `1234`) so serial and count columns read the same
    /// whether the workbook stored them as numbers or text.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Text(text) => Cow::Borrowed(text),
            CellValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                Cow::Owned(format!("{}", *number as i64))
            }
            CellValue::Number(number) => Cow::Owned(number.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text.to_owned())
        }
    }
}

impl From<f64> for CellValue {
    fn from(number: f64) -> Self {
        CellValue::Number(number)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Rows of one worksheet, anchored at cell A1 so that row and column indexes
/// match the workbook's own (row 0 is spreadsheet row 1). Each row ends at
/// its last populated cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<CellValue>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        RawGrid { rows }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, col)`; positions outside the grid read as empty.
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

impl<S: AsRef<str>> FromIterator<Vec<S>> for RawGrid {
    /// Builds an all-text grid, mostly useful for fixtures.
    fn from_iter<I: IntoIterator<Item = Vec<S>>>(rows: I) -> Self {
        RawGrid::new(
            rows.into_iter()
                .map(|row| row.iter().map(|cell| CellValue::from(cell.as_ref())).collect())
                .collect(),
        )
    }
}

/// Largest sheet the office suites produce: 1048576 rows by 16384 columns.
pub(crate) const MAX_ROWS: usize = 1 << 20;
pub(crate) const MAX_COLUMNS: usize = 1 << 14;
/// Populated cells a single sheet may hold.
pub(crate) const MAX_CELLS: usize = 1 << 22;

/// Collects the populated cells of a worksheet as they stream out of the
/// parser and lays them out as a [`RawGrid`] once the sheet is complete.
pub(crate) struct Sheet {
    cells: Vec<(usize, usize, CellValue)>,
    row_upper_bound: Option<usize>,
    cell_limit: usize,
}

impl Sheet {
    pub(crate) fn new() -> Self {
        Sheet::with_cell_limit(MAX_CELLS)
    }

    pub(crate) fn with_cell_limit(cell_limit: usize) -> Self {
        Sheet {
            cells: Vec::new(),
            row_upper_bound: None,
            cell_limit,
        }
    }

    /// Fails when `additional` more cells would take the sheet past its
    /// cell limit ([`MAX_CELLS`] unless set otherwise).
    pub(crate) fn reserve(&self, additional: usize) -> Result<(), SpreadsheetError> {
        match self.cells.len().checked_add(additional) {
            Some(total) if total <= self.cell_limit => Ok(()),
            _ => Err(SpreadsheetError::TooManyCells { limit: self.cell_limit }),
        }
    }

    /// Adds a cell; empty values are dropped so they never widen the grid.
    /// A value outside [`MAX_ROWS`] x [`MAX_COLUMNS`], or one past the cell
    /// limit, is an error.
    pub(crate) fn push(&mut self, row: usize, col: usize, value: CellValue) -> Result<(), SpreadsheetError> {
        if value.is_empty() {
            return Ok(());
        }
        if row >= MAX_ROWS || col >= MAX_COLUMNS {
            return Err(SpreadsheetError::CellOutOfBounds { row, col });
        }
        self.reserve(1)?;
        if self.row_upper_bound.map(|bound| bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        self.cells.push((row, col, value));
        Ok(())
    }

    /// Lays the collected cells out row by row; each row is as wide as its
    /// last populated cell. A later cell at the same position overwrites an
    /// earlier one.
    pub(crate) fn finish(self) -> RawGrid {
        let Some(row_upper) = self.row_upper_bound else {
            return RawGrid::default();
        };
        let mut rows = vec![Vec::new(); row_upper + 1];
        for (row, col, value) in self.cells {
            let cells: &mut Vec<CellValue> = &mut rows[row];
            if cells.len() <= col {
                cells.resize(col + 1, CellValue::Empty);
            }
            cells[col] = value;
        }
        RawGrid::new(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_initial() {
        assert!(Sheet::new().finish().is_empty());
    }

    #[test]
    fn sheet_lays_out_cells_from_a1() {
        let mut sheet = Sheet::new();
        sheet.push(1, 1, CellValue::from("b2")).unwrap();
        sheet.push(3, 3, CellValue::Number(4.0)).unwrap();
        sheet.push(2, 5, CellValue::Empty).unwrap();
        sheet.push(2, 6, CellValue::from("   ")).unwrap();
        let grid = sheet.finish();

        assert_eq!(grid.row_count(), 4);
        assert_eq!(grid.rows().iter().map(Vec::len).collect::<Vec<_>>(), vec![0, 2, 0, 4]);
        assert_eq!(grid.get(1, 1), &CellValue::from("b2"));
        assert_eq!(grid.get(3, 3), &CellValue::Number(4.0));
        assert!(grid.get(0, 0).is_empty());
        assert!(grid.get(10, 10).is_empty());
    }

    #[test]
    fn far_corner_cell_keeps_other_rows_short() {
        let mut sheet = Sheet::new();
        sheet.push(5, 0, CellValue::from("1")).unwrap();
        sheet.push(5, 2, CellValue::Number(120.0)).unwrap();
        sheet.push(MAX_ROWS - 1, MAX_COLUMNS - 1, CellValue::from("note")).unwrap();
        let grid = sheet.finish();

        assert_eq!(grid.row_count(), MAX_ROWS);
        assert_eq!(grid.rows()[5].len(), 3);
        assert!(grid.rows()[6].is_empty());
        assert_eq!(grid.rows()[MAX_ROWS - 1].len(), MAX_COLUMNS);
        assert_eq!(grid.get(MAX_ROWS - 1, MAX_COLUMNS - 1).as_text(), "note");
    }

    #[test]
    fn cells_beyond_sheet_limits_are_rejected() {
        let mut sheet = Sheet::new();
        let error = sheet.push(0, MAX_COLUMNS, CellValue::from("x")).unwrap_err();
        assert!(matches!(error, SpreadsheetError::CellOutOfBounds { row: 0, col } if col == MAX_COLUMNS));
        assert!(sheet.push(MAX_ROWS, 0, CellValue::from("x")).is_err());
        assert!(sheet.push(usize::MAX, usize::MAX, CellValue::Empty).is_ok());
        assert!(sheet.finish().is_empty());
    }

    #[test]
    fn cell_budget_is_enforced() {
        let sheet = Sheet::new();
        assert!(sheet.reserve(MAX_CELLS).is_ok());
        assert!(matches!(sheet.reserve(MAX_CELLS + 1), Err(SpreadsheetError::TooManyCells { .. })));
        assert!(sheet.reserve(usize::MAX).is_err());

        let mut sheet = Sheet::with_cell_limit(3);
        for col in 0..3 {
            sheet.push(0, col, CellValue::Number(1.0)).unwrap();
        }
        assert!(sheet.reserve(0).is_ok());
        assert!(sheet.reserve(1).is_err());
        let error = sheet.push(1, 0, CellValue::Number(2.0)).unwrap_err();
        assert!(matches!(error, SpreadsheetError::TooManyCells { limit: 3 }));
        assert!(sheet.push(1, 0, CellValue::Empty).is_ok());
        assert_eq!(sheet.finish().rows()[0].len(), 3);
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(1234.0).as_text(), "1234");
        assert_eq!(CellValue::Number(-3.0).as_text(), "-3");
        assert_eq!(CellValue::Number(12.5).as_text(), "12.5");
        assert_eq!(CellValue::from("1,234").as_text(), "1,234");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn grid_from_text_rows() {
        let grid: RawGrid = vec![vec!["1", "", "x"], vec!["2"]].into_iter().collect();
        assert_eq!(grid.get(0, 1), &CellValue::Empty);
        assert_eq!(grid.get(0, 2), &CellValue::from("x"));
        assert_eq!(grid.get(1, 0).as_text(), "2");
    }
}
