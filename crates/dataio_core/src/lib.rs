//! Storage-agnostic persistence for identity-keyed records.
//! Every backend exposes the same enumerate/upsert contracts.

pub mod db;
pub mod defaults;
pub mod io;
pub mod json;
pub mod logging;
pub mod model;
pub mod service;
pub mod sheet;

pub use db::{open_db, open_db_in_memory, DbContext, DbError, DbReader, DbWriter, Table};
pub use defaults::{defaults, reset_defaults, set_defaults, update_defaults, IoDefaults, JsonFormat};
pub use io::dispatch::Variant;
pub use io::{DataError, DataReader, DataResult, DataWriter, ErrorPolicy, SourceKind};
pub use json::{JsonConfig, JsonFileReader, JsonFileWriter, JsonSplitReader, JsonSplitWriter};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{Entity, Identity};
pub use model::events::{EntityEvent, EntityEventKind, EntityEvents};
pub use service::data_service::DataService;
pub use sheet::{SheetCodec, SheetConfig, SheetReader, SheetRow, SheetWriter};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
