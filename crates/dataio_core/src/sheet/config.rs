//! Worksheet location and bounds.

use super::row::SheetRow;
use crate::io::{DataError, DataResult};
use std::path::{Path, PathBuf};

pub const DEFAULT_END_COLUMN: u32 = 100;

/// Workbook path, worksheet name and the rectangular region to use.
///
/// Rows and columns are 1-based, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    path: PathBuf,
    worksheet: String,
    start_row: u32,
    start_column: u32,
    end_column: u32,
    create_missing: bool,
}

impl SheetConfig {
    pub fn new(path: impl Into<PathBuf>, worksheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            worksheet: worksheet.into(),
            start_row: 1,
            start_column: 1,
            end_column: DEFAULT_END_COLUMN,
            create_missing: false,
        }
    }

    pub fn with_start_row(mut self, row: u32) -> Self {
        self.start_row = row;
        self
    }

    pub fn with_columns(mut self, start_column: u32, end_column: u32) -> Self {
        self.start_column = start_column;
        self.end_column = end_column;
        self
    }

    /// Lets writers create a missing workbook file or worksheet.
    pub fn with_create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    pub fn start_column(&self) -> u32 {
        self.start_column
    }

    pub fn end_column(&self) -> u32 {
        self.end_column
    }

    pub fn create_missing(&self) -> bool {
        self.create_missing
    }

    /// Empty row spanning this region's columns, for codecs.
    pub fn new_row(&self, row_index: u32) -> SheetRow {
        SheetRow::new(row_index, self.start_column, self.end_column)
    }

    pub fn validate(&self) -> DataResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(DataError::InvalidConfig("workbook path is empty".to_string()));
        }
        if self.worksheet.trim().is_empty() {
            return Err(DataError::InvalidConfig("worksheet name is empty".to_string()));
        }
        if self.start_row == 0 || self.start_column == 0 || self.end_column == 0 {
            return Err(DataError::InvalidConfig(format!(
                "rows and columns are 1-based; got start_row={} start_column={} end_column={}",
                self.start_row, self.start_column, self.end_column
            )));
        }
        if self.end_column < self.start_column {
            return Err(DataError::InvalidConfig(format!(
                "end_column {} precedes start_column {}",
                self.end_column, self.start_column
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SheetConfig;
    use crate::io::DataError;

    #[test]
    fn defaults_cover_first_hundred_columns() {
        let config = SheetConfig::new("book.xlsx", "Sheet1");
        assert_eq!(config.start_row(), 1);
        assert_eq!(config.start_column(), 1);
        assert_eq!(config.end_column(), 100);
        assert!(!config.create_missing());
        config.validate().unwrap();
    }

    #[test]
    fn zero_and_reversed_bounds_are_rejected() {
        let zero_row = SheetConfig::new("book.xlsx", "Sheet1").with_start_row(0);
        assert!(matches!(
            zero_row.validate(),
            Err(DataError::InvalidConfig(_))
        ));

        let reversed = SheetConfig::new("book.xlsx", "Sheet1").with_columns(5, 2);
        assert!(matches!(
            reversed.validate(),
            Err(DataError::InvalidConfig(_))
        ));
    }
}
