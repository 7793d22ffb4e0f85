//! Layout constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{EnumAlignHorizontal, SpecCellStyle, SpecWorkbookOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Width units per character; backends receive column widths in 1/256 character.
pub const N_WIDTH_UNITS_PER_CHAR: u32 = 256;

/// Default font family.
pub const C_FONT_NAME_DEFAULT: &str = "SimSun";
/// Default font size in points.
pub const N_FONT_SIZE_DEFAULT: u16 = 12;

/// Default records per chunk for parallel appends.
pub const N_SIZE_CHUNK_DEFAULT: usize = 10;

/// Build default named style presets (`header`, `text`, `title`).
pub fn derive_default_cell_styles() -> BTreeMap<String, SpecCellStyle> {
    let cfg_base_style = SpecCellStyle::default();

    let mut dict_style = BTreeMap::new();
    dict_style.insert(
        "text".to_string(),
        SpecCellStyle {
            align: EnumAlignHorizontal::Left,
            ..cfg_base_style.clone()
        },
    );
    dict_style.insert(
        "header".to_string(),
        SpecCellStyle {
            bold: true,
            ..cfg_base_style.clone()
        },
    );
    dict_style.insert(
        "title".to_string(),
        SpecCellStyle {
            font_size: 14,
            bold: true,
            ..cfg_base_style
        },
    );

    dict_style
}

/// Look up one default preset, falling back to the base style for unknown keys.
pub fn derive_default_cell_style(key: &str) -> SpecCellStyle {
    derive_default_cell_styles()
        .remove(key)
        .unwrap_or_default()
}

/// Build default workbook options.
pub fn derive_default_workbook_options() -> SpecWorkbookOptions {
    SpecWorkbookOptions::default()
}
