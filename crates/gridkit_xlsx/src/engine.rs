//! Grid append engine: turns descriptors and values into staged cells and merge regions.
//!
//! The engine is single-threaded state; [`crate::sheet::SheetBuilder`] wraps it in a
//! mutex and decides how much work happens per lock acquisition.

use std::sync::Arc;

use crate::cursor::ColumnCursorTable;
use crate::merge::MergeRegionCollector;
use crate::spec::{
    EnumHeaderField, SpecCellRecord, SpecCellStyle, SpecFieldDescriptor, SpecMeasurement,
    SpecMergeRegion, SpecSheetReport,
};
use crate::tier::resolve_header_tiers;

/// Descriptor prepared once per append call: normalized spans plus a shared style.
#[derive(Debug, Clone)]
pub struct SpecLayoutField {
    /// Normalized descriptor.
    pub desc: SpecFieldDescriptor,
    /// Style shared by every cell written from this descriptor.
    pub style: Arc<SpecCellStyle>,
}

impl SpecLayoutField {
    pub fn new(desc: &SpecFieldDescriptor) -> Self {
        let desc = desc.normalized();
        let style = Arc::new(desc.style.clone());
        Self { desc, style }
    }
}

/// Normalize and sort descriptors by `index`.
pub fn plan_layout_fields(descriptors: &[SpecFieldDescriptor]) -> Vec<SpecLayoutField> {
    let mut l_fields: Vec<SpecLayoutField> =
        descriptors.iter().map(SpecLayoutField::new).collect();
    l_fields.sort_by_key(|field| field.desc.index);
    l_fields
}

/// Mutable per-sheet layout state.
#[derive(Debug, Default)]
pub struct GridAppendEngine {
    cursor: ColumnCursorTable,
    merges: MergeRegionCollector,
    l_cells: Vec<SpecCellRecord>,
    n_col_current: usize,
    if_dirty: bool,
    measurement: Option<SpecMeasurement>,
    report: SpecSheetReport,
}

impl GridAppendEngine {
    /// Create an empty engine for the backend sheet `sheet_name`.
    pub fn new(sheet_name: &str) -> Self {
        Self {
            report: SpecSheetReport {
                sheet_name: sheet_name.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Accessors

    pub fn cursor(&self) -> &ColumnCursorTable {
        &self.cursor
    }

    pub fn cells(&self) -> &[SpecCellRecord] {
        &self.l_cells
    }

    pub fn merges(&self) -> &[SpecMergeRegion] {
        self.merges.regions()
    }

    pub fn measurement(&self) -> Option<&SpecMeasurement> {
        self.measurement.as_ref()
    }

    pub fn report(&self) -> &SpecSheetReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut SpecSheetReport {
        &mut self.report
    }

    /// Whether staged cells or regions are waiting for a flush.
    pub fn is_dirty(&self) -> bool {
        self.if_dirty
    }

    /// Current column cursor.
    pub fn column(&self) -> usize {
        self.n_col_current
    }

    /// Move the current column cursor.
    pub fn set_column(&mut self, col: usize) {
        self.n_col_current = col;
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Staging

    /// Stage `value` at the current column without advancing any cursor.
    ///
    /// Returns the row the cell landed on.
    fn stage(&mut self, value: String, field: &SpecLayoutField) -> usize {
        let n_col = self.n_col_current;
        let n_row = self.cursor.row_for(n_col);

        if let Some(region) =
            SpecMergeRegion::from_span(n_row, n_col, field.desc.row_span, field.desc.col_span)
        {
            self.merges.push(region);
        }
        tracing::trace!(row = n_row, col = n_col, field = %field.desc.name, "stage cell");
        self.l_cells.push(SpecCellRecord {
            value,
            style: Arc::clone(&field.style),
            row: n_row,
            col: n_col,
        });
        self.if_dirty = true;
        n_row
    }

    /// Stage `value` and claim its rows in every spanned column; the column cursor stays.
    pub fn append_prepared(&mut self, value: String, field: &SpecLayoutField) -> usize {
        let n_row = self.stage(value, field);
        self.cursor
            .advance(self.n_col_current, field.desc.col_span, field.desc.row_span);
        n_row
    }

    /// Stage and claim like [`Self::append_prepared`], then move right by `col_span`.
    fn place(&mut self, value: String, field: &SpecLayoutField) {
        self.append_prepared(value, field);
        self.n_col_current += field.desc.col_span;
    }

    /// Append one value at the current column, stacking below earlier content there.
    pub fn append_value(&mut self, value: &str, descriptor: &SpecFieldDescriptor) -> usize {
        self.append_prepared(value.to_string(), &SpecLayoutField::new(descriptor))
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Headers

    /// Lay out one hierarchical header group starting at the current column.
    ///
    /// Each tier restarts at the group's start column, and the column cursor is back at
    /// that start column when the group is done. A header field placed after a group
    /// therefore shares the group's start column. A malformed group is skipped with a
    /// warning. Returns the number of staged header cells.
    pub fn append_header_group(&mut self, descriptors: &[SpecFieldDescriptor]) -> usize {
        let tiers = match resolve_header_tiers(descriptors) {
            Ok(tiers) => tiers,
            Err(err) => {
                self.warn(format!("header group skipped: {err}"));
                return 0;
            }
        };
        for c_warning in &tiers.warnings {
            self.warn(c_warning);
        }

        let n_col_start = self.n_col_current;
        let mut n_staged = 0usize;
        for l_descs in tiers.tiers.values() {
            for desc in l_descs {
                let field = SpecLayoutField::new(desc);
                self.place(desc.name.clone(), &field);
                n_staged += 1;
            }
            self.n_col_current = n_col_start;
        }
        n_staged
    }

    /// Write header entries in index order, starting at column 0.
    pub fn append_header_fields(&mut self, header_fields: &[EnumHeaderField]) {
        let mut l_fields: Vec<&EnumHeaderField> = header_fields.iter().collect();
        l_fields.sort_by_key(|field| field.index());

        self.n_col_current = 0;
        for header_field in l_fields {
            match header_field {
                EnumHeaderField::Single(desc) => {
                    let field = SpecLayoutField::new(desc);
                    self.place(desc.name.clone(), &field);
                }
                EnumHeaderField::Group(l_descs) => {
                    self.append_header_group(l_descs);
                }
            }
        }
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Body

    /// Append one record: reset to column 0, then place each value under its field.
    ///
    /// `l_values[i]` belongs to `l_fields[i]`; missing values become empty cells.
    pub fn append_row(&mut self, l_fields: &[SpecLayoutField], l_values: Vec<Option<String>>) {
        self.n_col_current = 0;
        let mut iter_values = l_values.into_iter();
        for field in l_fields {
            let value = iter_values.next().flatten().unwrap_or_default();
            self.place(value, field);
        }
    }

    /// Keep the first measurement seen for this sheet.
    pub fn set_measurement_once(&mut self, measurement: Option<SpecMeasurement>) {
        if self.measurement.is_none() && measurement.is_some() {
            self.measurement = measurement;
        }
    }

    /// Log a recovered layout problem and keep it in the sheet report.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        tracing::warn!(sheet = %self.report.sheet_name, "{}", msg.as_ref());
        self.report.warn(msg);
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Flush

    /// Take staged cells and regions for materialization, leaving the engine clean.
    pub fn take_staged(&mut self) -> (Vec<SpecCellRecord>, Vec<SpecMergeRegion>) {
        let l_cells = std::mem::take(&mut self.l_cells);
        let l_regions = self.merges.regions().to_vec();
        self.merges.clear();
        self.if_dirty = false;
        (l_cells, l_regions)
    }

    /// Put back staged data after a failed flush (ahead of anything staged since).
    pub fn restore_staged(&mut self, l_cells: Vec<SpecCellRecord>, l_regions: Vec<SpecMergeRegion>) {
        if l_cells.is_empty() && l_regions.is_empty() {
            return;
        }
        let mut l_cells_all = l_cells;
        l_cells_all.append(&mut self.l_cells);
        self.l_cells = l_cells_all;

        let l_regions_later = self.merges.regions().to_vec();
        self.merges.clear();
        for region in l_regions.into_iter().chain(l_regions_later) {
            self.merges.push(region);
        }
        self.if_dirty = true;
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}
