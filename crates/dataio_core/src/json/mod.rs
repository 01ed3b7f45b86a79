//! JSON backends: one array per file, or one file per record.
//!
//! # Responsibility
//! - Persist entity collections as UTF-8 JSON.
//! - Create missing files/directories when configured to.
//!
//! # Invariants
//! - Single-file writes rewrite the whole array once per call.
//! - Split writes touch exactly one file per record, named `<id>.json`.
//! - Split reads skip records that fail to deserialize.

mod file;
pub mod hot;
mod split;

pub use file::{JsonFileReader, JsonFileWriter};
pub use split::{JsonSplitReader, JsonSplitWriter};

use crate::defaults::{defaults, JsonFormat};
use crate::io::{DataError, DataResult};
use std::path::{Path, PathBuf};

/// Location and serializer settings of a JSON source.
///
/// `path` is the array file for single-file adapters and the record
/// directory for split adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonConfig {
    path: PathBuf,
    format: JsonFormat,
    create_missing: bool,
}

impl JsonConfig {
    /// Starts from the process-wide JSON format.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: defaults().json_format,
            create_missing: false,
        }
    }

    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> JsonFormat {
        self.format
    }

    pub fn create_missing(&self) -> bool {
        self.create_missing
    }

    pub fn validate(&self) -> DataResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(DataError::InvalidConfig("json path is empty".to_string()));
        }
        Ok(())
    }
}
