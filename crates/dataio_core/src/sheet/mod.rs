//! Spreadsheet (xlsx) backend.
//!
//! # Responsibility
//! - Scan a worksheet region into [`SheetRow`]s and decode them.
//! - Encode records into rows and write them into an existing workbook.
//!
//! # Invariants
//! - Writers update the workbook in place; cells outside written rows are
//!   preserved.
//! - A row's identity is its row index, chosen by the codec.
//! - Blocking workbook I/O runs on the blocking pool in async paths.

mod config;
mod reader;
mod row;
mod writer;

pub use config::{SheetConfig, DEFAULT_END_COLUMN};
pub use reader::{SheetReader, DEFAULT_EMPTY_RUN_LIMIT};
pub use row::SheetRow;
pub use writer::SheetWriter;

use crate::io::{DataError, DataResult, SourceKind};
use std::path::Path;
use umya_spreadsheet::Spreadsheet;

/// Converts between typed records and worksheet rows.
pub trait SheetCodec<E> {
    fn decode(&self, row: &SheetRow) -> DataResult<E>;

    /// Builds the row for `entity`, including its target row index.
    fn encode(&self, entity: &E) -> DataResult<SheetRow>;
}

fn open_workbook(path: &Path) -> DataResult<Spreadsheet> {
    if !path.is_file() {
        return Err(DataError::not_found(SourceKind::File, path.display()));
    }
    umya_spreadsheet::reader::xlsx::read(path).map_err(|err| DataError::Spreadsheet {
        location: path.display().to_string(),
        message: err.to_string(),
    })
}

fn missing_worksheet(book: &Spreadsheet, name: &str) -> DataError {
    DataError::NotFound {
        kind: SourceKind::Worksheet,
        location: name.to_string(),
        available: book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect(),
    }
}
