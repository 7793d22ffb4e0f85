//! OOXML backend on top of `rust_xlsxwriter`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::backend::SheetBackend;
use crate::conf::N_WIDTH_UNITS_PER_CHAR;
use crate::error::Result;
use crate::spec::{
    EnumAlignHorizontal, EnumAlignVertical, EnumWorkbookFormat, SpecCellStyle, SpecMergeRegion,
};
use crate::util::{cast_col_num, cast_row_num};

/// Workbook backend buffering an xlsx document in memory.
///
/// One native [`Format`] is built per distinct [`SpecCellStyle`] and reused.
pub struct XlsxBackend {
    workbook: Workbook,
    set_sheet_names: BTreeSet<String>,
    dict_formats: HashMap<SpecCellStyle, Format>,
}

impl Default for XlsxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxBackend {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            set_sheet_names: BTreeSet::new(),
            dict_formats: HashMap::new(),
        }
    }

    /// Number of interned formats.
    pub fn format_count(&self) -> usize {
        self.dict_formats.len()
    }

    fn worksheet(&mut self, sheet: &str) -> Result<&mut Worksheet> {
        Ok(self.workbook.worksheet_from_name(sheet)?)
    }
}

impl SheetBackend for XlsxBackend {
    fn format(&self) -> EnumWorkbookFormat {
        EnumWorkbookFormat::Xlsx
    }

    fn ensure_sheet(&mut self, sheet: &str) -> Result<()> {
        if self.set_sheet_names.contains(sheet) {
            return Ok(());
        }
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(sheet)?;
        self.set_sheet_names.insert(sheet.to_string());
        Ok(())
    }

    fn check_position(&self, row: usize, col: usize) -> Result<()> {
        cast_row_num(row)?;
        cast_col_num(col)?;
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
        let n_row = cast_row_num(row)?;
        let n_col = cast_col_num(col)?;
        let format = self
            .dict_formats
            .entry(style.as_ref().clone())
            .or_insert_with(|| derive_rust_xlsx_format(style))
            .clone();

        let worksheet = self.worksheet(sheet)?;
        if value.is_empty() {
            worksheet.write_blank(n_row, n_col, &format)?;
        } else {
            worksheet.write_string_with_format(n_row, n_col, value, &format)?;
        }
        Ok(())
    }

    fn set_row_height(&mut self, sheet: &str, row: usize, points: f64) -> Result<()> {
        let n_row = cast_row_num(row)?;
        self.worksheet(sheet)?.set_row_height(n_row, points)?;
        Ok(())
    }

    fn set_column_width(&mut self, sheet: &str, col: usize, width_units: u32) -> Result<()> {
        let n_col = cast_col_num(col)?;
        let n_width_chars = width_units as f64 / N_WIDTH_UNITS_PER_CHAR as f64;
        self.worksheet(sheet)?
            .set_column_width(n_col, n_width_chars)?;
        Ok(())
    }

    /// Merges an empty range; the anchor cell is written afterwards by the materializer.
    fn add_merge_region(&mut self, sheet: &str, region: &SpecMergeRegion) -> Result<()> {
        let n_row_start = cast_row_num(region.row_start)?;
        let n_row_end = cast_row_num(region.row_end)?;
        let n_col_start = cast_col_num(region.col_start)?;
        let n_col_end = cast_col_num(region.col_end)?;
        self.worksheet(sheet)?.merge_range(
            n_row_start,
            n_col_start,
            n_row_end,
            n_col_end,
            "",
            &Format::new(),
        )?;
        Ok(())
    }

    fn serialize(&mut self) -> Result<Vec<u8>> {
        Ok(self.workbook.save_to_buffer()?)
    }

    fn xlsx_workbook_mut(&mut self) -> Option<&mut Workbook> {
        Some(&mut self.workbook)
    }
}

fn derive_rust_xlsx_format(spec: &SpecCellStyle) -> Format {
    let mut format = Format::new()
        .set_font_name(spec.font_name.as_str())
        .set_font_size(spec.font_size as f64)
        .set_align(derive_format_align(spec.align))
        .set_align(derive_format_valign(spec.valign));

    if spec.bold {
        format = format.set_bold();
    }
    if spec.italic {
        format = format.set_italic();
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if spec.text_wrap {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: EnumAlignHorizontal) -> FormatAlign {
    match align {
        EnumAlignHorizontal::General => FormatAlign::General,
        EnumAlignHorizontal::Left => FormatAlign::Left,
        EnumAlignHorizontal::Center => FormatAlign::Center,
        EnumAlignHorizontal::Right => FormatAlign::Right,
        EnumAlignHorizontal::Fill => FormatAlign::Fill,
        EnumAlignHorizontal::Justify => FormatAlign::Justify,
        EnumAlignHorizontal::CenterAcross => FormatAlign::CenterAcross,
        EnumAlignHorizontal::Distributed => FormatAlign::Distributed,
    }
}

fn derive_format_valign(valign: EnumAlignVertical) -> FormatAlign {
    match valign {
        EnumAlignVertical::Top => FormatAlign::Top,
        EnumAlignVertical::Center => FormatAlign::VerticalCenter,
        EnumAlignVertical::Bottom => FormatAlign::Bottom,
        EnumAlignVertical::Justify => FormatAlign::VerticalJustify,
        EnumAlignVertical::Distributed => FormatAlign::VerticalDistributed,
    }
}
