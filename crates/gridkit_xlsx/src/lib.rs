//! `gridkit_xlsx` v1:
//! Concurrent hierarchical-header layout engine for spreadsheet sheets.
//!
//! Module map:
//! - `conf`        : constants and default presets
//! - `spec`        : specs/models/options
//! - `error`       : error type
//! - `util`        : pure helper functions
//! - `tier`        : header group -> tiers
//! - `cursor`      : per-column next-row table
//! - `merge`       : merge region collection
//! - `engine`      : single-sheet append engine
//! - `model`       : record/table/model introspection traits
//! - `sheet`       : thread-safe sheet builder
//! - `materialize` : staged state -> backend
//! - `backend`     : backend trait and in-memory grid backend
//! - `writer`      : `rust_xlsxwriter` backend
//! - `frame`       : polars `DataFrame` tables
//! - `workbook`    : sheet registry and workbook façade
pub mod backend;
pub mod conf;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod frame;
pub mod materialize;
pub mod merge;
pub mod model;
pub mod sheet;
pub mod spec;
pub mod tier;
pub mod util;
pub mod workbook;
pub mod writer;

#[cfg(test)]
mod testing;

pub use backend::{GridBackend, SheetBackend, SpecGridCell, SpecGridSheet};
pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_SIZE_CHUNK_DEFAULT,
    N_WIDTH_UNITS_PER_CHAR, TUP_EXCEL_ILLEGAL, derive_default_cell_style,
    derive_default_cell_styles,
};
pub use cursor::ColumnCursorTable;
pub use engine::{GridAppendEngine, SpecLayoutField, plan_layout_fields};
pub use error::{GridError, Result};
pub use frame::{FrameTable, derive_dataframe_from_ipc_bytes};
pub use materialize::{apply_measurement, materialize_sheet, plan_rows};
pub use merge::MergeRegionCollector;
pub use model::{EnumFieldValue, RecordTable, SheetModel, SheetRecord, SheetTable};
pub use sheet::SheetBuilder;
pub use spec::{
    EnumAlignHorizontal, EnumAlignVertical, EnumHeaderField, EnumWorkbookFormat, SpecCellRecord,
    SpecCellStyle, SpecFieldDescriptor, SpecMeasurement, SpecMergeRegion,
    SpecParallelAppendOptions, SpecSheetReport, SpecWorkbookOptions,
};
pub use tier::{SpecHeaderTiers, resolve_header_tiers};
pub use util::{derive_unique_sheet_name, sanitize_sheet_name};
pub use workbook::{SheetRegistry, WorkbookBuilder};
pub use writer::XlsxBackend;
