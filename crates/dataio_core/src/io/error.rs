//! Error taxonomy shared by every reader and writer.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DataResult<T> = Result<T, DataError>;

/// Storage location kind named by a not-found error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
    Worksheet,
    Table,
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Worksheet => "worksheet",
            Self::Table => "table",
        };
        f.write_str(label)
    }
}

/// Error returned by reader/writer operations.
#[derive(Debug)]
pub enum DataError {
    /// Source location is missing and auto-creation is disabled.
    NotFound {
        kind: SourceKind,
        location: String,
        /// Sibling names that do exist, for diagnosis (worksheets, tables).
        available: Vec<String>,
    },
    /// Record type does not match the entity type an adapter is bound to.
    UnsupportedType {
        expected: &'static str,
        found: &'static str,
    },
    Serialization {
        location: String,
        source: serde_json::Error,
    },
    Io {
        location: String,
        source: std::io::Error,
    },
    Db(DbError),
    Spreadsheet {
        location: String,
        message: String,
    },
    InvalidConfig(String),
    /// Persisted or converted data violates the record shape.
    InvalidData(String),
    /// Identifier cannot be used as a storage key (file name).
    InvalidIdentifier(String),
    /// Blocking worker task failed to complete.
    Task(String),
}

impl DataError {
    pub(crate) fn io(location: impl Display, source: std::io::Error) -> Self {
        Self::Io {
            location: location.to_string(),
            source,
        }
    }

    pub(crate) fn serialization(location: impl Display, source: serde_json::Error) -> Self {
        Self::Serialization {
            location: location.to_string(),
            source,
        }
    }

    pub(crate) fn not_found(kind: SourceKind, location: impl Display) -> Self {
        Self::NotFound {
            kind,
            location: location.to_string(),
            available: Vec::new(),
        }
    }

    /// Returns whether this error is a medium-level write failure.
    ///
    /// Only these are downgraded to `Ok(false)` under
    /// [`ErrorPolicy::ReportFalse`](crate::io::ErrorPolicy::ReportFalse);
    /// lookup, type and configuration errors are always fatal.
    pub fn is_write_failure(&self) -> bool {
        matches!(
            self,
            Self::Serialization { .. }
                | Self::Io { .. }
                | Self::Db(_)
                | Self::Spreadsheet { .. }
                | Self::InvalidData(_)
                | Self::Task(_)
        )
    }

    /// Short stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::Serialization { .. } => "serialization_failed",
            Self::Io { .. } => "io_failed",
            Self::Db(_) => "db_failed",
            Self::Spreadsheet { .. } => "spreadsheet_failed",
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidData(_) => "invalid_data",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::Task(_) => "task_failed",
        }
    }
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                kind,
                location,
                available,
            } => {
                write!(f, "{kind} not found: {location}")?;
                if !available.is_empty() {
                    write!(f, " (available: {})", available.join(", "))?;
                }
                Ok(())
            }
            Self::UnsupportedType { expected, found } => {
                write!(f, "type `{found}` is not supported; expected `{expected}`")
            }
            Self::Serialization { location, source } => {
                write!(f, "json serialization failed for `{location}`: {source}")
            }
            Self::Io { location, source } => write!(f, "i/o failed for `{location}`: {source}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Spreadsheet { location, message } => {
                write!(f, "spreadsheet access failed for `{location}`: {message}")
            }
            Self::InvalidConfig(message) => write!(f, "invalid configuration: {message}"),
            Self::InvalidData(message) => write!(f, "invalid record data: {message}"),
            Self::InvalidIdentifier(id) => write!(f, "identifier `{id}` is not a valid storage key"),
            Self::Task(message) => write!(f, "worker task failed: {message}"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DataError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DataError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
