//! Thread-safe per-sheet builder.
//!
//! Every public operation locks the sheet's engine for one unit of work: one value,
//! one header block, or one record. Record values are read before the lock is taken.

use std::ops::Range;

use parking_lot::Mutex;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::backend::SheetBackend;
use crate::engine::{GridAppendEngine, SpecLayoutField, plan_layout_fields};
use crate::error::{GridError, Result};
use crate::materialize::materialize_sheet;
use crate::model::{EnumFieldValue, RecordTable, SheetModel, SheetRecord, SheetTable};
use crate::spec::{
    SpecCellRecord, SpecFieldDescriptor, SpecMergeRegion, SpecParallelAppendOptions,
    SpecSheetReport,
};

/// Builder for one named sheet; share it across threads behind an `Arc`.
#[derive(Debug)]
pub struct SheetBuilder {
    name: String,
    sheet_name: String,
    engine: Mutex<GridAppendEngine>,
}

impl SheetBuilder {
    /// Create a builder registered as `name`, written to the backend sheet `sheet_name`.
    pub fn new(name: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        let sheet_name = sheet_name.into();
        Self {
            name: name.into(),
            engine: Mutex::new(GridAppendEngine::new(&sheet_name)),
            sheet_name,
        }
    }

    /// Name the builder was requested under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backend (sanitized, unique) sheet name.
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Append

    /// Append one value at the current column, below anything already in that column.
    pub fn append_value(&self, value: &str, descriptor: &SpecFieldDescriptor) -> &Self {
        self.engine.lock().append_value(value, descriptor);
        self
    }

    /// Append a hierarchical header group starting at the current column.
    pub fn append_header_group(&self, descriptors: &[SpecFieldDescriptor]) -> &Self {
        self.engine.lock().append_header_group(descriptors);
        self
    }

    /// Append a record list: its headers (if declared), then one row block per record.
    pub fn append_records<T: SheetRecord>(&self, records: &[T]) -> &Self {
        self.append_table(&RecordTable(records))
    }

    /// Type-erased form of [`Self::append_records`].
    pub fn append_table(&self, table: &dyn SheetTable) -> &Self {
        self.append_table_inner(table);
        self
    }

    /// Append a composite model module by module.
    ///
    /// Text modules become one (possibly spanning) cell at column 0, table modules are
    /// appended like [`Self::append_table`]; anything else is skipped with a warning.
    pub fn append_model<M: SheetModel + ?Sized>(&self, model: &M) -> &Self {
        for field in plan_layout_fields(&model.module_fields()) {
            match model.module_value(&field.desc) {
                Ok(EnumFieldValue::Table(table)) => {
                    self.append_table_inner(table);
                }
                Ok(EnumFieldValue::Text(text)) => {
                    let mut engine = self.engine.lock();
                    engine.set_column(0);
                    engine.append_prepared(text, &field);
                }
                Ok(EnumFieldValue::Missing) => {
                    self.engine.lock().warn(format!(
                        "module {:?} has no value; skipped",
                        field.desc.key
                    ));
                }
                Ok(value) => {
                    let err = GridError::UnsupportedFieldType {
                        field: field.desc.key.clone(),
                        kind: value.kind().to_string(),
                    };
                    self.engine.lock().warn(format!("module skipped: {err}"));
                }
                Err(err) => {
                    self.engine.lock().warn(format!("module skipped: {err}"));
                }
            }
        }
        self.engine.lock().set_measurement_once(model.measurement());
        self
    }

    /// Append records in chunks on a rayon pool; headers are written once up front.
    ///
    /// Row order across chunks is unspecified; each record still lands on one row block.
    /// Falls back to serial appends (with a warning) when the pool cannot be built.
    pub fn append_records_parallel<T: SheetRecord + Sync>(
        &self,
        records: &[T],
        options: &SpecParallelAppendOptions,
    ) -> &Self {
        if records.is_empty() {
            return self;
        }
        let table = RecordTable(records);
        self.append_table_head(&table);

        let l_fields = plan_layout_fields(&T::cell_fields());
        let n_size_chunk = usize::max(1, options.size_chunk);

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(options.num_workers_max.unwrap_or(0))
            .build();
        let Ok(thread_pool) = thread_pool else {
            self.engine.lock().warn(format!(
                "Failed to initialize thread pool (workers={:?}); fallback to serial append.",
                options.num_workers_max
            ));
            self.append_body_rows(&table, &l_fields, 0..records.len());
            return self;
        };

        thread_pool.install(|| {
            records.par_chunks(n_size_chunk).for_each(|chunk| {
                self.append_body_rows(&RecordTable(chunk), &l_fields, 0..chunk.len());
            });
        });
        self
    }

    /// Move the current column cursor (used by `append_value` / `append_header_group`).
    pub fn set_column(&self, col: usize) -> &Self {
        self.engine.lock().set_column(col);
        self
    }

    fn append_table_inner(&self, table: &dyn SheetTable) {
        let n_rows = table.row_count();
        if n_rows == 0 {
            return;
        }
        self.append_table_head(table);
        let l_fields = plan_layout_fields(&table.cell_fields());
        self.append_body_rows(table, &l_fields, 0..n_rows);
    }

    fn append_table_head(&self, table: &dyn SheetTable) {
        let l_headers = table.header_fields();
        let measurement = table.measurement();

        let mut engine = self.engine.lock();
        if !l_headers.is_empty() {
            engine.append_header_fields(&l_headers);
        }
        engine.set_measurement_once(measurement);
    }

    fn append_body_rows(
        &self,
        table: &dyn SheetTable,
        l_fields: &[SpecLayoutField],
        rows: Range<usize>,
    ) {
        for idx_row in rows {
            let mut l_warnings = Vec::new();
            let l_values: Vec<Option<String>> = l_fields
                .iter()
                .map(|field| match table.cell_value(idx_row, &field.desc) {
                    Ok(value) => value,
                    Err(err) => {
                        l_warnings.push(format!("row {idx_row}: {err}"));
                        None
                    }
                })
                .collect();

            let mut engine = self.engine.lock();
            for c_warning in &l_warnings {
                engine.warn(c_warning);
            }
            engine.append_row(l_fields, l_values);
        }
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region FlushAndInspect

    /// Commit staged content into `backend`. No-op (`Ok(false)`) when nothing changed.
    pub fn flush(&self, backend: &mut dyn SheetBackend) -> Result<bool> {
        let mut engine = self.engine.lock();
        materialize_sheet(&mut engine, backend, &self.sheet_name)
    }

    pub fn is_dirty(&self) -> bool {
        self.engine.lock().is_dirty()
    }

    /// Next free row of `col`.
    pub fn next_row(&self, col: usize) -> usize {
        self.engine.lock().cursor().peek(col)
    }

    /// Snapshot of staged (not yet flushed) cells.
    pub fn staged_cells(&self) -> Vec<SpecCellRecord> {
        self.engine.lock().cells().to_vec()
    }

    /// Snapshot of staged (not yet flushed) merge regions.
    pub fn staged_merges(&self) -> Vec<SpecMergeRegion> {
        self.engine.lock().merges().to_vec()
    }

    pub fn report(&self) -> SpecSheetReport {
        self.engine.lock().report().clone()
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::backend::GridBackend;
    use crate::spec::SpecMeasurement;
    use crate::testing::{ClassSheet, Plain3, Student, derive_students};

    fn derive_rows(cells: &[SpecCellRecord]) -> BTreeMap<usize, Vec<(usize, String)>> {
        let mut dict_rows: BTreeMap<usize, Vec<(usize, String)>> = BTreeMap::new();
        for cell in cells {
            dict_rows
                .entry(cell.row)
                .or_default()
                .push((cell.col, cell.value.clone()));
        }
        for l_row in dict_rows.values_mut() {
            l_row.sort();
        }
        dict_rows
    }

    #[test]
    fn test_record_list_stacks_one_row_per_record() {
        let sheet = SheetBuilder::new("s", "s");
        let l_records: Vec<Plain3> = (0..4).map(Plain3::new).collect();
        sheet.append_records(&l_records);

        let dict_rows = derive_rows(&sheet.staged_cells());
        assert_eq!(dict_rows.len(), 4);
        for (row, l_cells) in &dict_rows {
            assert_eq!(l_cells.len(), 3);
            assert_eq!(l_cells[0], (0, format!("a{row}")));
        }
        assert!(sheet.staged_merges().is_empty());
    }

    #[test]
    fn test_empty_record_list_is_noop() {
        let sheet = SheetBuilder::new("s", "s");
        sheet.append_records::<Student>(&[]);
        assert!(!sheet.is_dirty());
        assert!(sheet.staged_cells().is_empty());
    }

    #[test]
    fn test_student_list_writes_headers_then_body() {
        let sheet = SheetBuilder::new("s", "s");
        sheet.append_records(&derive_students(2));

        let dict_rows = derive_rows(&sheet.staged_cells());
        assert_eq!(
            dict_rows[&0]
                .iter()
                .map(|(col, _)| *col)
                .collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(
            dict_rows[&1],
            vec![
                (4, "lit".to_string()),
                (5, "math".to_string()),
                (6, "eng".to_string())
            ]
        );
        assert_eq!(dict_rows[&2].len(), 7);
        assert_eq!(dict_rows[&3].len(), 7);
        assert_eq!(sheet.staged_merges().len(), 5);
        assert_eq!(sheet.next_row(0), 4);
    }

    #[test]
    fn test_field_access_error_leaves_empty_cell_and_warns() {
        let sheet = SheetBuilder::new("s", "s");
        let mut l_students = derive_students(1);
        l_students[0].if_broken = true;
        sheet.append_records(&l_students);

        let dict_rows = derive_rows(&sheet.staged_cells());
        assert_eq!(dict_rows[&2].len(), 7);
        assert_eq!(dict_rows[&2][1], (1, String::new()));
        let report = sheet.report();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("name"));
    }

    #[test]
    fn test_model_title_then_table() {
        let sheet = SheetBuilder::new("s", "s");
        sheet.append_model(&ClassSheet::new("Class 1", 2));

        let l_cells = sheet.staged_cells();
        assert_eq!((l_cells[0].row, l_cells[0].col), (0, 0));
        assert_eq!(l_cells[0].value, "Class 1");
        assert_eq!(
            sheet.staged_merges()[0],
            SpecMergeRegion {
                row_start: 0,
                row_end: 1,
                col_start: 0,
                col_end: 6,
            }
        );
        let dict_rows = derive_rows(&l_cells);
        assert_eq!(dict_rows.keys().copied().collect::<Vec<_>>(), vec![0, 2, 3, 4, 5]);
        // unsupported module reported, remaining modules still processed
        let report = sheet.report();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Unsupported"));
        assert!(report.warnings[0].contains("\"photo\": image"));
    }

    #[test]
    fn test_repeated_models_stack() {
        let sheet = SheetBuilder::new("s", "s");
        sheet
            .append_model(&ClassSheet::new("Class 1", 1))
            .append_model(&ClassSheet::new("Class 2", 1));

        let l_titles: Vec<(usize, usize)> = sheet
            .staged_cells()
            .iter()
            .filter(|cell| cell.value.starts_with("Class"))
            .map(|cell| (cell.row, cell.col))
            .collect();
        assert_eq!(l_titles, vec![(0, 0), (5, 0)]);
    }

    #[test]
    fn test_concurrent_single_values_claim_distinct_rows() {
        let sheet = Arc::new(SheetBuilder::new("s", "s"));
        let desc = SpecFieldDescriptor::new(0, "v");
        let n_threads = 8;
        let n_per_thread = 50;

        thread::scope(|scope| {
            for idx_thread in 0..n_threads {
                let sheet = Arc::clone(&sheet);
                let desc = desc.clone();
                scope.spawn(move || {
                    for idx in 0..n_per_thread {
                        sheet.append_value(&format!("{idx_thread}-{idx}"), &desc);
                    }
                });
            }
        });

        let l_cells = sheet.staged_cells();
        assert_eq!(l_cells.len(), n_threads * n_per_thread);
        assert!(l_cells.iter().all(|cell| cell.col == 0));
        let set_rows: BTreeSet<usize> = l_cells.iter().map(|cell| cell.row).collect();
        assert_eq!(set_rows.len(), n_threads * n_per_thread);
        assert_eq!(sheet.next_row(0), n_threads * n_per_thread);
    }

    #[test]
    fn test_parallel_records_keep_each_record_on_one_row() {
        let sheet = SheetBuilder::new("s", "s");
        let l_records: Vec<Plain3> = (0..40).map(Plain3::new).collect();
        sheet.append_records_parallel(
            &l_records,
            &SpecParallelAppendOptions {
                size_chunk: 7,
                num_workers_max: Some(4),
            },
        );

        let dict_rows = derive_rows(&sheet.staged_cells());
        assert_eq!(dict_rows.len(), 40);
        for l_cells in dict_rows.values() {
            let c_id = l_cells[0].1.trim_start_matches('a').to_string();
            assert_eq!(
                l_cells,
                &vec![
                    (0, format!("a{c_id}")),
                    (1, format!("b{c_id}")),
                    (2, format!("c{c_id}"))
                ]
            );
        }
    }

    #[test]
    fn test_parallel_students_write_header_once() {
        let sheet = SheetBuilder::new("s", "s");
        sheet.append_records_parallel(&derive_students(10), &SpecParallelAppendOptions::default());

        let n_headers = sheet
            .staged_cells()
            .iter()
            .filter(|cell| cell.value == "grades")
            .count();
        assert_eq!(n_headers, 1);
        assert_eq!(sheet.next_row(0), 12);
    }

    #[test]
    fn test_flush_twice_is_noop_and_measurement_applied() {
        let sheet = SheetBuilder::new("s", "s");
        let mut backend = GridBackend::new();
        sheet.append_model(&ClassSheet::new("Class 1", 1));

        assert!(sheet.flush(&mut backend).expect("flush"));
        assert!(!sheet.flush(&mut backend).expect("noop flush"));
        assert!(!sheet.is_dirty());

        let grid = backend.grid_sheet("s").expect("sheet");
        assert_eq!(grid.value(0, 0), Some("Class 1"));
        assert_eq!(grid.row_heights.get(&0), Some(&30.0));
        assert_eq!(grid.col_widths.get(&0), Some(&(8 * 256)));
        assert_eq!(
            ClassSheet::new("x", 0).measurement(),
            Some(SpecMeasurement {
                row_heights: vec![30.0, -1.0],
                col_widths: vec![8, 10],
            })
        );
    }

    #[test]
    fn test_append_after_flush_continues_below() {
        let sheet = SheetBuilder::new("s", "s");
        let mut backend = GridBackend::new();
        let l_records: Vec<Plain3> = (0..2).map(Plain3::new).collect();

        sheet.append_records(&l_records);
        sheet.flush(&mut backend).expect("flush");
        sheet.append_records(&l_records);
        sheet.flush(&mut backend).expect("flush");

        let grid = backend.grid_sheet("s").expect("sheet");
        assert_eq!(grid.rows().len(), 4);
        assert_eq!(grid.value(3, 2), Some("c1"));
    }
}
