//! Introspection seams: how records and models describe their fields and values.
//!
//! The engine never inspects caller types directly; it only consumes descriptor lists and
//! the explicit lookup functions below.

use crate::error::Result;
use crate::spec::{EnumHeaderField, SpecFieldDescriptor, SpecMeasurement};

/// One row-producing record type.
///
/// `cell_value` is an explicit lookup keyed by [`SpecFieldDescriptor::key`].
pub trait SheetRecord {
    /// Body cell descriptors; sorted by `index` before use.
    fn cell_fields() -> Vec<SpecFieldDescriptor>
    where
        Self: Sized;

    /// Header entries written once before the records of a list.
    fn header_fields() -> Vec<EnumHeaderField>
    where
        Self: Sized,
    {
        vec![]
    }

    /// Sheet measurement declared by this record type.
    fn measurement() -> Option<SpecMeasurement>
    where
        Self: Sized,
    {
        None
    }

    /// Text value of one body field; `Ok(None)` leaves the cell empty.
    fn cell_value(&self, field: &SpecFieldDescriptor) -> Result<Option<String>>;
}

/// Type-erased list of rows, as consumed by the engine.
pub trait SheetTable {
    fn header_fields(&self) -> Vec<EnumHeaderField>;

    fn cell_fields(&self) -> Vec<SpecFieldDescriptor>;

    fn row_count(&self) -> usize;

    /// Text value of field `field` in row `idx_row`.
    fn cell_value(&self, idx_row: usize, field: &SpecFieldDescriptor) -> Result<Option<String>>;

    fn measurement(&self) -> Option<SpecMeasurement> {
        None
    }
}

/// Borrowed slice of records viewed as a table.
#[derive(Debug)]
pub struct RecordTable<'a, T>(pub &'a [T]);

impl<T: SheetRecord> SheetTable for RecordTable<'_, T> {
    fn header_fields(&self) -> Vec<EnumHeaderField> {
        T::header_fields()
    }

    fn cell_fields(&self) -> Vec<SpecFieldDescriptor> {
        T::cell_fields()
    }

    fn row_count(&self) -> usize {
        self.0.len()
    }

    fn cell_value(&self, idx_row: usize, field: &SpecFieldDescriptor) -> Result<Option<String>> {
        match self.0.get(idx_row) {
            Some(record) => record.cell_value(field),
            None => Ok(None),
        }
    }

    fn measurement(&self) -> Option<SpecMeasurement> {
        T::measurement()
    }
}

impl<T: SheetRecord> SheetTable for Vec<T> {
    fn header_fields(&self) -> Vec<EnumHeaderField> {
        T::header_fields()
    }

    fn cell_fields(&self) -> Vec<SpecFieldDescriptor> {
        T::cell_fields()
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn cell_value(&self, idx_row: usize, field: &SpecFieldDescriptor) -> Result<Option<String>> {
        RecordTable(self.as_slice()).cell_value(idx_row, field)
    }

    fn measurement(&self) -> Option<SpecMeasurement> {
        T::measurement()
    }
}

/// Value of one model module.
pub enum EnumFieldValue<'a> {
    /// Scalar text placed as a single (possibly spanning) cell.
    Text(String),
    /// Nested record list appended as a table.
    Table(&'a dyn SheetTable),
    /// No value; nothing is written.
    Missing,
    /// Any other kind; reported as unsupported.
    Other(String),
}

impl EnumFieldValue<'_> {
    /// Short kind label for diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Table(_) => "table",
            Self::Missing => "missing",
            Self::Other(kind) => kind,
        }
    }
}

/// Composite model made of ordered modules (titles, tables, ...).
pub trait SheetModel {
    /// Module descriptors; sorted by `index` before use.
    fn module_fields(&self) -> Vec<SpecFieldDescriptor>;

    fn module_value(&self, field: &SpecFieldDescriptor) -> Result<EnumFieldValue<'_>>;

    fn measurement(&self) -> Option<SpecMeasurement> {
        None
    }
}
