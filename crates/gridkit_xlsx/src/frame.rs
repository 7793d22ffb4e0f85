//! Polars `DataFrame` viewed as a sheet table.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::conf::derive_default_cell_style;
use crate::error::{GridError, Result};
use crate::model::SheetTable;
use crate::spec::{EnumHeaderField, SpecCellStyle, SpecFieldDescriptor};

/// Read a `DataFrame` from Polars IPC bytes.
pub fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| GridError::Frame(format!("Failed to read IPC DataFrame bytes: {err}")))
}

/// One header and one body column per `DataFrame` column, in frame order.
#[derive(Debug, Clone)]
pub struct FrameTable<'a> {
    df: &'a DataFrame,
    style_header: SpecCellStyle,
    style_body: SpecCellStyle,
}

impl<'a> FrameTable<'a> {
    /// Wrap `df` with the `header` and `text` style presets.
    pub fn new(df: &'a DataFrame) -> Self {
        Self::with_styles(
            df,
            derive_default_cell_style("header"),
            derive_default_cell_style("text"),
        )
    }

    pub fn with_styles(
        df: &'a DataFrame,
        style_header: SpecCellStyle,
        style_body: SpecCellStyle,
    ) -> Self {
        Self {
            df,
            style_header,
            style_body,
        }
    }

    fn derive_descriptors(&self, style: &SpecCellStyle) -> Vec<SpecFieldDescriptor> {
        self.df
            .get_column_names_str()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| SpecFieldDescriptor::new(idx, name).with_style(style.clone()))
            .collect()
    }
}

impl SheetTable for FrameTable<'_> {
    fn header_fields(&self) -> Vec<EnumHeaderField> {
        self.derive_descriptors(&self.style_header)
            .into_iter()
            .map(EnumHeaderField::Single)
            .collect()
    }

    fn cell_fields(&self) -> Vec<SpecFieldDescriptor> {
        self.derive_descriptors(&self.style_body)
    }

    fn row_count(&self) -> usize {
        self.df.height()
    }

    fn cell_value(&self, idx_row: usize, field: &SpecFieldDescriptor) -> Result<Option<String>> {
        let Some(col) = self.df.get_columns().get(field.index) else {
            return Err(GridError::FieldAccess {
                field: field.key.clone(),
                message: format!("column index {} out of range", field.index),
            });
        };
        let value = col.get(idx_row)?;
        Ok(derive_cell_text_from_any_value(value))
    }
}

fn derive_cell_text_from_any_value(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(val) => Some(val.to_string()),
        AnyValue::StringOwned(val) => Some(val.to_string()),
        AnyValue::Boolean(val) => Some(if val { "True" } else { "False" }.to_string()),
        _ => Some(value.to_string()),
    }
}
