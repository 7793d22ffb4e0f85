//! Sheet materializer: commits staged engine state into a backend sheet.

use std::collections::BTreeMap;

use crate::backend::SheetBackend;
use crate::conf::N_WIDTH_UNITS_PER_CHAR;
use crate::engine::GridAppendEngine;
use crate::error::Result;
use crate::spec::{SpecCellRecord, SpecMeasurement, SpecMergeRegion};

/// Group staged cells by row; each row's cells ascend by column.
pub fn plan_rows(l_cells: &[SpecCellRecord]) -> BTreeMap<usize, Vec<&SpecCellRecord>> {
    let mut dict_rows: BTreeMap<usize, Vec<&SpecCellRecord>> = BTreeMap::new();
    for cell in l_cells {
        dict_rows.entry(cell.row).or_default().push(cell);
    }
    for l_row in dict_rows.values_mut() {
        l_row.sort_by_key(|cell| cell.col);
    }
    dict_rows
}

/// Flush `engine` into `sheet` of `backend`.
///
/// No-op (returns `Ok(false)`) unless the engine is dirty. Every staged position is checked
/// against the backend before anything is written. Merge regions go out before the cells so
/// a backend that paints merged ranges cannot blank the anchor value. On failure the error
/// is returned and the staged state is restored, minus merge regions the backend already
/// accepted, so a later flush can retry.
pub fn materialize_sheet(
    engine: &mut GridAppendEngine,
    backend: &mut dyn SheetBackend,
    sheet: &str,
) -> Result<bool> {
    if !engine.is_dirty() {
        return Ok(false);
    }

    let (l_cells, mut l_regions) = engine.take_staged();
    let measurement = engine.measurement().cloned();
    let mut n_merges_emitted = 0usize;
    if let Err(err) = emit_staged(
        backend,
        sheet,
        &l_cells,
        &l_regions,
        measurement.as_ref(),
        &mut n_merges_emitted,
    ) {
        l_regions.drain(..n_merges_emitted);
        engine.restore_staged(l_cells, l_regions);
        return Err(err);
    }

    let report = engine.report_mut();
    report.cnt_cells_flushed += l_cells.len();
    report.cnt_merges_flushed += l_regions.len();
    report.cnt_flushes += 1;
    tracing::debug!(
        sheet,
        cells = l_cells.len(),
        merges = l_regions.len(),
        "sheet flushed"
    );
    Ok(true)
}

/// Check every staged position, including measurement extents, against `backend`.
fn validate_staged(
    backend: &dyn SheetBackend,
    l_cells: &[SpecCellRecord],
    l_regions: &[SpecMergeRegion],
    measurement: Option<&SpecMeasurement>,
) -> Result<()> {
    for region in l_regions {
        backend.check_position(region.row_end, region.col_end)?;
    }
    for cell in l_cells {
        backend.check_position(cell.row, cell.col)?;
    }
    if let Some(measurement) = measurement {
        if let Some(n_row_last) = measurement.row_heights.len().checked_sub(1) {
            backend.check_position(n_row_last, 0)?;
        }
        if let Some(n_col_last) = measurement.col_widths.len().checked_sub(1) {
            backend.check_position(0, n_col_last)?;
        }
    }
    Ok(())
}

fn emit_staged(
    backend: &mut dyn SheetBackend,
    sheet: &str,
    l_cells: &[SpecCellRecord],
    l_regions: &[SpecMergeRegion],
    measurement: Option<&SpecMeasurement>,
    n_merges_emitted: &mut usize,
) -> Result<()> {
    validate_staged(backend, l_cells, l_regions, measurement)?;
    backend.ensure_sheet(sheet)?;

    for region in l_regions {
        backend.add_merge_region(sheet, region)?;
        *n_merges_emitted += 1;
    }
    for (row, l_row_cells) in plan_rows(l_cells) {
        for cell in l_row_cells {
            backend.set_cell(sheet, row, cell.col, &cell.value, &cell.style)?;
        }
    }
    if let Some(measurement) = measurement {
        apply_measurement(backend, sheet, measurement)?;
    }
    Ok(())
}

/// Apply row heights (skipping negative sentinels) and column widths to `sheet`.
pub fn apply_measurement(
    backend: &mut dyn SheetBackend,
    sheet: &str,
    measurement: &SpecMeasurement,
) -> Result<()> {
    for (row, height) in measurement.row_heights.iter().enumerate() {
        if *height < 0.0 {
            continue;
        }
        backend.set_row_height(sheet, row, *height)?;
    }
    for (col, width) in measurement.col_widths.iter().enumerate() {
        backend.set_column_width(sheet, col, width.saturating_mul(N_WIDTH_UNITS_PER_CHAR))?;
    }
    Ok(())
}
