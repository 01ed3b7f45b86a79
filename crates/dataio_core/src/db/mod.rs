//! Relational backend over SQLite.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Track pending inserts/updates per unit of work and commit them at once.
//! - Expose table contents through the reader/writer contracts.
//!
//! # Invariants
//! - Schema is owned by the caller; this module never creates or alters
//!   tables.
//! - `DbContext::save_changes` commits every tracked change in one
//!   transaction or none of them.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod context;
mod open;
mod reader;
mod table;
mod writer;

pub use context::DbContext;
pub use open::{open_db, open_db_in_memory};
pub use reader::DbReader;
pub use table::Table;
pub use writer::DbWriter;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Change tracker holds a value of another type under the same key.
    TrackerConflict { table: &'static str, key: String },
    /// Tracked update matched no row when the change-set was applied.
    StaleEntry { table: &'static str, key: String },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::TrackerConflict { table, key } => write!(
                f,
                "tracked entry `{key}` in table `{table}` belongs to another entity type"
            ),
            Self::StaleEntry { table, key } => {
                write!(f, "row `{key}` in table `{table}` disappeared before save")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::TrackerConflict { .. } | Self::StaleEntry { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
