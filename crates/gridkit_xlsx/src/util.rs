//! Stateless helper utilities shared by the engine and the backends.

use std::collections::BTreeSet;

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::error::{GridError, Result};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Return `name`, or `name__2`, `name__3`, ... when already taken; the result is inserted.
///
/// Excel compares sheet names case-insensitively, so `existing` holds lowercase names.
pub fn derive_unique_sheet_name(name: &str, existing: &mut BTreeSet<String>) -> String {
    if existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
        .collect();

    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IndexCasting

/// Cast a zero-based row index into the xlsx row type.
pub fn cast_row_num(value: usize) -> Result<u32> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(GridError::IndexOverflow(format!("row index {value}")));
    }
    u32::try_from(value).map_err(|_| GridError::IndexOverflow(format!("row index {value}")))
}

/// Cast a zero-based column index into the xlsx column type.
pub fn cast_col_num(value: usize) -> Result<u16> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(GridError::IndexOverflow(format!("column index {value}")));
    }
    u16::try_from(value).map_err(|_| GridError::IndexOverflow(format!("column index {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name_replaces_and_truncates() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");
        assert_eq!(
            sanitize_sheet_name(&"x".repeat(40), "_").chars().count(),
            N_LEN_EXCEL_SHEET_NAME_MAX
        );
    }

    #[test]
    fn test_derive_unique_sheet_name_is_case_insensitive() {
        let mut set_names = BTreeSet::new();
        assert_eq!(derive_unique_sheet_name("Data", &mut set_names), "Data");
        assert_eq!(derive_unique_sheet_name("data", &mut set_names), "data__2");
        assert_eq!(derive_unique_sheet_name("Data", &mut set_names), "Data__3");
    }

    #[test]
    fn test_cast_limits() {
        assert_eq!(cast_row_num(0).ok(), Some(0));
        assert!(cast_row_num(N_NROWS_EXCEL_MAX).is_err());
        assert_eq!(cast_col_num(N_NCOLS_EXCEL_MAX - 1).ok(), Some(16_383));
        assert!(cast_col_num(N_NCOLS_EXCEL_MAX).is_err());
    }
}
