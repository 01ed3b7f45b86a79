//! Bounded view over one worksheet row.

use crate::io::{DataError, DataResult};

/// Cell values of one logical record, addressed by absolute column.
///
/// # Invariants
/// - `values[0]` belongs to `start_column`.
/// - `cell(column)` fails outside `[start_column, start_column + len)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    row_index: u32,
    start_column: u32,
    end_column: u32,
    values: Vec<String>,
}

impl SheetRow {
    pub fn new(row_index: u32, start_column: u32, end_column: u32) -> Self {
        Self {
            row_index,
            start_column,
            end_column,
            values: Vec::new(),
        }
    }

    /// Builds a row whose end column follows from the number of values.
    pub fn with_values<I, S>(row_index: u32, start_column: u32, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let width = u32::try_from(values.len()).unwrap_or(u32::MAX);
        Self {
            row_index,
            start_column,
            end_column: start_column.saturating_add(width.saturating_sub(1)),
            values,
        }
    }

    pub fn row_index(&self) -> u32 {
        self.row_index
    }

    pub fn start_column(&self) -> u32 {
        self.start_column
    }

    pub fn end_column(&self) -> u32 {
        self.end_column
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when every cell is empty; a row with no cells is blank too.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(String::is_empty)
    }

    /// Value at an absolute worksheet column.
    pub fn cell(&self, column: u32) -> DataResult<&str> {
        column
            .checked_sub(self.start_column)
            .and_then(|offset| self.values.get(offset as usize))
            .map(String::as_str)
            .ok_or_else(|| {
                DataError::InvalidData(format!(
                    "column {column} is outside row {} bounds [{}, {})",
                    self.row_index,
                    self.start_column,
                    self.start_column as usize + self.values.len()
                ))
            })
    }

    /// Value at a zero-based offset from the start column.
    pub fn value(&self, offset: usize) -> Option<&str> {
        self.values.get(offset).map(String::as_str)
    }

    pub fn join(&self, separator: &str) -> String {
        self.values.join(separator)
    }
}

#[cfg(test)]
mod tests {
    use super::SheetRow;

    #[test]
    fn cell_is_relative_to_start_column() {
        let row = SheetRow::with_values(4, 3, ["a", "b", "c"]);

        assert_eq!(row.cell(3).unwrap(), "a");
        assert_eq!(row.cell(5).unwrap(), "c");
        assert_eq!(row.end_column(), 5);
        assert!(row.cell(2).is_err());
        assert!(row.cell(6).is_err());
        assert_eq!(row.value(1), Some("b"));
    }

    #[test]
    fn blank_means_every_value_empty() {
        let mut row = SheetRow::new(1, 1, 3);
        assert!(row.is_blank());
        row.push("");
        row.push("");
        assert!(row.is_blank());
        row.push("x");
        assert!(!row.is_blank());
        assert_eq!(row.join(";"), ";;x");
    }
}
