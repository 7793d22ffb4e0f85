//! Shared layout models, options and reports.

use std::fmt;
use std::sync::Arc;

use crate::conf::{C_FONT_NAME_DEFAULT, N_FONT_SIZE_DEFAULT, N_SIZE_CHUNK_DEFAULT};

////////////////////////////////////////////////////////////////////////////////
// #region CellStyle

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumAlignHorizontal {
    /// Excel "General" alignment (text left, numbers right).
    General,
    /// Left aligned.
    Left,
    /// Centered (default).
    #[default]
    Center,
    /// Right aligned.
    Right,
    /// Repeat content to fill the cell.
    Fill,
    /// Justified.
    Justify,
    /// Centered across the selection.
    CenterAcross,
    /// Distributed.
    Distributed,
}

/// Vertical cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumAlignVertical {
    /// Top aligned.
    Top,
    /// Vertically centered (default).
    #[default]
    Center,
    /// Bottom aligned.
    Bottom,
    /// Vertically justified.
    Justify,
    /// Vertically distributed.
    Distributed,
}

/// Immutable cell style shared by every cell appended from one descriptor.
///
/// `Hash + Eq` so backends can intern one native format per distinct style.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecCellStyle {
    /// Horizontal alignment.
    pub align: EnumAlignHorizontal,
    /// Vertical alignment.
    pub valign: EnumAlignVertical,
    /// Text wrap.
    pub text_wrap: bool,
    /// Font family name.
    pub font_name: String,
    /// Font size in points.
    pub font_size: u16,
    /// Font color as `#RRGGBB`; `None` keeps the automatic color.
    pub font_color: Option<String>,
    /// Bold style.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
}

impl Default for SpecCellStyle {
    fn default() -> Self {
        Self {
            align: EnumAlignHorizontal::Center,
            valign: EnumAlignVertical::Center,
            text_wrap: true,
            font_name: C_FONT_NAME_DEFAULT.to_string(),
            font_size: N_FONT_SIZE_DEFAULT,
            font_color: None,
            bold: false,
            italic: false,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FieldDescriptor

/// Normalized per-field layout and style parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFieldDescriptor {
    /// Ordering key within its record/model; also the link target of `parent`.
    pub index: usize,
    /// Parent descriptor index inside a header group; `None` marks a root.
    pub parent: Option<usize>,
    /// Accessor key passed back to the record lookup.
    pub key: String,
    /// Display text used when the descriptor is written as a header.
    pub name: String,
    /// Number of rows spanned (>= 1).
    pub row_span: usize,
    /// Number of columns spanned (>= 1).
    pub col_span: usize,
    /// Cell style.
    pub style: SpecCellStyle,
}

impl SpecFieldDescriptor {
    /// Create a 1x1 root descriptor whose accessor key equals its display name.
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        let c_name = name.into();
        Self {
            index,
            parent: None,
            key: c_name.clone(),
            name: c_name,
            row_span: 1,
            col_span: 1,
            style: SpecCellStyle::default(),
        }
    }

    /// Override the accessor key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Attach to a parent descriptor inside a header group.
    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set row/column spans.
    pub fn with_span(mut self, row_span: usize, col_span: usize) -> Self {
        self.row_span = row_span;
        self.col_span = col_span;
        self
    }

    /// Replace the style.
    pub fn with_style(mut self, style: SpecCellStyle) -> Self {
        self.style = style;
        self
    }

    /// Whether this descriptor has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether placing this descriptor produces a merge region.
    pub fn is_merged(&self) -> bool {
        self.row_span != 1 || self.col_span != 1
    }

    /// Return a copy with spans clamped to `>= 1`.
    pub fn normalized(&self) -> SpecFieldDescriptor {
        SpecFieldDescriptor {
            row_span: usize::max(1, self.row_span),
            col_span: usize::max(1, self.col_span),
            ..self.clone()
        }
    }
}

/// One header entry declared by a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumHeaderField {
    /// Plain single-cell header.
    Single(SpecFieldDescriptor),
    /// Hierarchical header group resolved into tiers.
    Group(Vec<SpecFieldDescriptor>),
}

impl EnumHeaderField {
    /// Ordering index among sibling header fields.
    ///
    /// A group is ordered by its lowest-parent descriptor (its root when well formed).
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Single(desc) => Some(desc.index),
            Self::Group(l_descs) => l_descs
                .iter()
                .min_by_key(|desc| desc.parent)
                .map(|desc| desc.index),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GridRecords

/// Staged cell waiting for materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCellRecord {
    /// Cell text; empty when the field value was absent.
    pub value: String,
    /// Shared cell style.
    pub style: Arc<SpecCellStyle>,
    /// Zero-based row index.
    pub row: usize,
    /// Zero-based column index.
    pub col: usize,
}

/// Inclusive rectangular merge span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpecMergeRegion {
    /// First row (inclusive).
    pub row_start: usize,
    /// Last row (inclusive).
    pub row_end: usize,
    /// First column (inclusive).
    pub col_start: usize,
    /// Last column (inclusive).
    pub col_end: usize,
}

impl SpecMergeRegion {
    /// Build the region covered by a span anchored at `(row, col)`.
    ///
    /// Returns `None` for a plain 1x1 cell.
    pub fn from_span(row: usize, col: usize, row_span: usize, col_span: usize) -> Option<Self> {
        if row_span == 1 && col_span == 1 {
            return None;
        }
        Some(Self {
            row_start: row,
            row_end: row + row_span.saturating_sub(1),
            col_start: col,
            col_end: col + col_span.saturating_sub(1),
        })
    }
}

/// Row-height/column-width overrides applied once per sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecMeasurement {
    /// Row heights in points by row position; a negative value keeps the default height.
    pub row_heights: Vec<f64>,
    /// Column widths in characters by column position.
    pub col_widths: Vec<u32>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookOptions

/// Backend document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumWorkbookFormat {
    /// OOXML workbook written by `rust_xlsxwriter`.
    #[default]
    Xlsx,
    /// In-memory grid, serialized as tab-separated text.
    Grid,
}

impl fmt::Display for EnumWorkbookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xlsx => write!(f, "xlsx"),
            Self::Grid => write!(f, "grid"),
        }
    }
}

/// Workbook-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecWorkbookOptions {
    /// Backend format.
    pub rule_format: EnumWorkbookFormat,
    /// Replacement for characters Excel rejects in sheet names.
    pub sheet_name_replace_to: String,
}

impl Default for SpecWorkbookOptions {
    fn default() -> Self {
        Self {
            rule_format: EnumWorkbookFormat::Xlsx,
            sheet_name_replace_to: "_".to_string(),
        }
    }
}

/// Options for chunked parallel record appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecParallelAppendOptions {
    /// Records per dispatched chunk.
    pub size_chunk: usize,
    /// Maximum worker threads; `None` uses rayon's default.
    pub num_workers_max: Option<usize>,
}

impl Default for SpecParallelAppendOptions {
    fn default() -> Self {
        Self {
            size_chunk: N_SIZE_CHUNK_DEFAULT,
            num_workers_max: None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Per-sheet build report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetReport {
    /// Backend sheet name.
    pub sheet_name: String,
    /// Non-fatal layout warnings (skipped fields/groups).
    pub warnings: Vec<String>,
    /// Cells written by all flushes so far.
    pub cnt_cells_flushed: usize,
    /// Merge regions written by all flushes so far.
    pub cnt_merges_flushed: usize,
    /// Flushes that actually emitted data.
    pub cnt_flushes: usize,
}

impl SpecSheetReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
