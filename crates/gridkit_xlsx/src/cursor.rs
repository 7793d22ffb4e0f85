//! Per-column "next free row" bookkeeping.

use std::collections::BTreeMap;

/// Column index -> next free row in that column.
///
/// Entries start at 0 and only grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnCursorTable {
    dict_row_by_col: BTreeMap<usize, usize>,
}

impl ColumnCursorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free row for `col`, inserting 0 for a column seen for the first time.
    pub fn row_for(&mut self, col: usize) -> usize {
        *self.dict_row_by_col.entry(col).or_insert(0)
    }

    /// Next free row for `col` without inserting.
    pub fn peek(&self, col: usize) -> usize {
        self.dict_row_by_col.get(&col).copied().unwrap_or(0)
    }

    /// Add `row_delta` to every column in `[col_start, col_start + col_count)`.
    pub fn advance(&mut self, col_start: usize, col_count: usize, row_delta: usize) {
        for col in col_start..col_start + col_count {
            *self.dict_row_by_col.entry(col).or_insert(0) += row_delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::ColumnCursorTable;

    #[test]
    fn test_row_for_inserts_zero() {
        let mut cursor = ColumnCursorTable::new();
        assert_eq!(cursor.peek(3), 0);
        assert_eq!(cursor.row_for(3), 0);
        assert_eq!(cursor, {
            let mut cursor_expected = ColumnCursorTable::new();
            cursor_expected.advance(3, 1, 0);
            cursor_expected
        });
    }

    #[test]
    fn test_advance_covers_column_range_only() {
        let mut cursor = ColumnCursorTable::new();
        cursor.advance(1, 3, 2);
        cursor.advance(2, 1, 1);

        assert_eq!(cursor.peek(0), 0);
        assert_eq!(cursor.peek(1), 2);
        assert_eq!(cursor.peek(2), 3);
        assert_eq!(cursor.peek(3), 2);
        assert_eq!(cursor.peek(4), 0);
    }

    proptest! {
        #[test]
        fn prop_cursor_never_decreases(
            ops in prop::collection::vec((0usize..8, 0usize..4, 0usize..3), 1..64)
        ) {
            let mut cursor = ColumnCursorTable::new();
            let mut l_prev = vec![0usize; 12];
            for (col_start, col_count, row_delta) in ops {
                let _ = cursor.row_for(col_start);
                cursor.advance(col_start, col_count, row_delta);
                for (col, prev) in l_prev.iter_mut().enumerate() {
                    let now = cursor.peek(col);
                    prop_assert!(now >= *prev);
                    *prev = now;
                }
            }
        }
    }
}
