//! Spreadsheet backend seam and the in-memory grid backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rust_xlsxwriter::Workbook;

use crate::error::{GridError, Result};
use crate::spec::{EnumWorkbookFormat, SpecCellStyle, SpecMergeRegion};

/// Sink receiving materialized sheet content.
///
/// Sheets are addressed by their backend (sanitized, unique) name.
pub trait SheetBackend {
    /// Document format produced by [`Self::serialize`].
    fn format(&self) -> EnumWorkbookFormat;

    /// Create `sheet` unless it already exists.
    fn ensure_sheet(&mut self, sheet: &str) -> Result<()>;

    /// Reject a position this backend cannot address.
    ///
    /// The materializer checks every staged position before it writes anything.
    fn check_position(&self, _row: usize, _col: usize) -> Result<()> {
        Ok(())
    }

    fn set_cell(
        &mut self,
        sheet: &str,
        row: usize,
        col: usize,
        value: &str,
        style: &Arc<SpecCellStyle>,
    ) -> Result<()>;

    /// Row height in points.
    fn set_row_height(&mut self, sheet: &str, row: usize, points: f64) -> Result<()>;

    /// Column width in 1/256 character units.
    fn set_column_width(&mut self, sheet: &str, col: usize, width_units: u32) -> Result<()>;

    fn add_merge_region(&mut self, sheet: &str, region: &SpecMergeRegion) -> Result<()>;

    /// Serialize the whole document.
    fn serialize(&mut self) -> Result<Vec<u8>>;

    /// Native xlsx workbook, when this backend is one.
    fn xlsx_workbook_mut(&mut self) -> Option<&mut Workbook> {
        None
    }

    /// In-memory sheet, when this backend is a grid.
    fn grid_sheet(&self, _sheet: &str) -> Option<&SpecGridSheet> {
        None
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region GridBackend

/// One cell of an in-memory grid sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGridCell {
    pub value: String,
    pub style: Arc<SpecCellStyle>,
}

/// Materialized in-memory sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecGridSheet {
    /// `(row, col)` -> cell.
    pub cells: BTreeMap<(usize, usize), SpecGridCell>,
    /// Row -> height in points.
    pub row_heights: BTreeMap<usize, f64>,
    /// Column -> width in 1/256 character units.
    pub col_widths: BTreeMap<usize, u32>,
    /// Merge regions in emission order.
    pub merges: Vec<SpecMergeRegion>,
}

impl SpecGridSheet {
    /// Cell text at `(row, col)`.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get(&(row, col)).map(|cell| cell.value.as_str())
    }

    /// Distinct occupied rows.
    pub fn rows(&self) -> BTreeSet<usize> {
        self.cells.keys().map(|(row, _)| *row).collect()
    }

    /// Cells of `row` in column order.
    pub fn row_values(&self, row: usize) -> Vec<(usize, &str)> {
        self.cells
            .range((row, 0)..(row + 1, 0))
            .map(|((_, col), cell)| (*col, cell.value.as_str()))
            .collect()
    }

    /// Dense string grid; empty strings where no cell was written.
    pub fn to_string_grid(&self) -> Vec<Vec<String>> {
        let n_rows = self.cells.keys().map(|(row, _)| row + 1).max().unwrap_or(0);
        let n_cols = self.cells.keys().map(|(_, col)| col + 1).max().unwrap_or(0);
        let mut l_grid = vec![vec![String::new(); n_cols]; n_rows];
        for ((row, col), cell) in &self.cells {
            l_grid[*row][*col] = cell.value.clone();
        }
        l_grid
    }
}

/// Backend keeping sheets as plain in-memory grids.
#[derive(Debug, Default)]
pub struct GridBackend {
    l_sheet_names: Vec<String>,
    dict_sheets: BTreeMap<String, SpecGridSheet>,
}

impl GridBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheet names in creation order.
    pub fn sheet_names(&self) -> &[String] {
        &self.l_sheet_names
    }

    fn sheet_mut(&mut self, sheet: &str) -> Result<&mut SpecGridSheet> {
        self.dict_sheets
            .get_mut(sheet)
            .ok_or_else(|| GridError::SheetNotFound(sheet.to_string()))
    }
}

impl SheetBackend for GridBackend {
    fn format(&self) -> EnumWorkbookFormat {
        EnumWorkbookFormat::Grid
    }

    fn ensure_sheet(&mut self, sheet: &str) -> Result<()> {
        if !self.dict_sheets.contains_key(sheet) {
            self.l_sheet_names.push(sheet.to_string());
            self.dict_sheets
                .insert(sheet.to_string(), SpecGridSheet::default());
        }
        Ok(())
    }

    fn set_cell(
        &mut self,
        sheet: &str,
        row: usize,
        col: usize,
        value: &str,
        style: &Arc<SpecCellStyle>,
    ) -> Result<()> {
        self.sheet_mut(sheet)?.cells.insert(
            (row, col),
            SpecGridCell {
                value: value.to_string(),
                style: Arc::clone(style),
            },
        );
        Ok(())
    }

    fn set_row_height(&mut self, sheet: &str, row: usize, points: f64) -> Result<()> {
        self.sheet_mut(sheet)?.row_heights.insert(row, points);
        Ok(())
    }

    fn set_column_width(&mut self, sheet: &str, col: usize, width_units: u32) -> Result<()> {
        self.sheet_mut(sheet)?.col_widths.insert(col, width_units);
        Ok(())
    }

    fn add_merge_region(&mut self, sheet: &str, region: &SpecMergeRegion) -> Result<()> {
        self.sheet_mut(sheet)?.merges.push(*region);
        Ok(())
    }

    /// Tab-separated rows per sheet, each sheet introduced by `# <name>`.
    fn serialize(&mut self) -> Result<Vec<u8>> {
        let mut c_out = String::new();
        for c_name in &self.l_sheet_names {
            let Some(sheet) = self.dict_sheets.get(c_name) else {
                continue;
            };
            c_out.push_str(&format!("# {c_name}\n"));
            for l_row in sheet.to_string_grid() {
                c_out.push_str(&l_row.join("\t"));
                c_out.push('\n');
            }
        }
        Ok(c_out.into_bytes())
    }

    fn grid_sheet(&self, sheet: &str) -> Option<&SpecGridSheet> {
        self.dict_sheets.get(sheet)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_backend_requires_sheet() {
        let mut backend = GridBackend::new();
        let style = Arc::new(SpecCellStyle::default());
        let err = backend
            .set_cell("missing", 0, 0, "x", &style)
            .expect_err("sheet not created");
        assert!(matches!(err, GridError::SheetNotFound(_)));
    }

    #[test]
    fn test_grid_backend_serialize_tsv() {
        let mut backend = GridBackend::new();
        let style = Arc::new(SpecCellStyle::default());
        backend.ensure_sheet("a").expect("sheet");
        backend.ensure_sheet("a").expect("idempotent");
        backend.set_cell("a", 0, 0, "x", &style).expect("cell");
        backend.set_cell("a", 1, 1, "y", &style).expect("cell");

        let c_txt = String::from_utf8(backend.serialize().expect("serialize")).expect("utf8");
        assert_eq!(c_txt, "# a\nx\t\n\ty\n");
        assert_eq!(backend.sheet_names(), &["a".to_string()]);

        let sheet = backend.grid_sheet("a").expect("grid sheet");
        assert_eq!(sheet.row_values(1), vec![(1, "y")]);
        assert_eq!(sheet.rows().len(), 2);
    }
}
