//! Error types for layout and workbook operations.

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use crate::spec::EnumWorkbookFormat;

/// Result type for layout and workbook operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Error types for layout and workbook operations.
///
/// `Hierarchy`, `UnsupportedFieldType` and `FieldAccess` are recovered inside the engine
/// (logged, item skipped); the rest propagate to the caller.
#[derive(Error, Debug)]
pub enum GridError {
    /// Header group without a root, or a descriptor whose parent tier is unknown.
    #[error("Hierarchy error: {0}")]
    Hierarchy(String),

    /// Module value that is neither text nor a table.
    #[error("Unsupported field type for {field:?}: {kind}")]
    UnsupportedFieldType { field: String, kind: String },

    /// Field value lookup failed.
    #[error("Failed to read field {field:?}: {message}")]
    FieldAccess { field: String, message: String },

    /// Caller asked for a handle the configured backend does not provide.
    #[error("Invalid handle: expected {expected} workbook, configured as {actual}")]
    InvalidHandle {
        expected: EnumWorkbookFormat,
        actual: EnumWorkbookFormat,
    },

    /// No sheet registered under this name.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Row or column index outside backend limits.
    #[error("Index overflow: {0}")]
    IndexOverflow(String),

    /// DataFrame access failed.
    #[error("DataFrame error: {0}")]
    Frame(String),

    /// Backend write error.
    #[error("xlsx write error: {0}")]
    Backend(#[from] XlsxError),

    /// Output file error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GridError {
    /// Whether the engine skips the affected item instead of failing the call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Hierarchy(_) | Self::UnsupportedFieldType { .. } | Self::FieldAccess { .. }
        )
    }
}

impl From<polars::prelude::PolarsError> for GridError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        GridError::Frame(err.to_string())
    }
}
