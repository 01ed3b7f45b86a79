//! Process-wide adapter defaults.
//!
//! # Responsibility
//! - Hold the labels, separators and JSON format new adapters start from.
//!
//! # Invariants
//! - Adapters copy defaults at construction; later changes never reach
//!   already-built adapters.
//! - Reads never observe a partially-updated value set.

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// Output layout for JSON backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JsonFormat {
    #[default]
    Compact,
    Pretty,
}

/// Defaults applied to newly-built adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoDefaults {
    /// Separator between cell values when a sheet row is flattened.
    pub data_separator: String,
    /// Separator between flattened sheet rows.
    pub row_separator: String,
    pub db_source_name: String,
    pub sheet_source_name: String,
    pub json_source_name: String,
    pub json_format: JsonFormat,
}

impl Default for IoDefaults {
    fn default() -> Self {
        Self {
            data_separator: ";".to_string(),
            row_separator: "\n".to_string(),
            db_source_name: "DataBase Context".to_string(),
            sheet_source_name: "Excel File".to_string(),
            json_source_name: "Json File".to_string(),
            json_format: JsonFormat::Compact,
        }
    }
}

static DEFAULTS: Lazy<RwLock<IoDefaults>> = Lazy::new(|| RwLock::new(IoDefaults::default()));

/// Returns a snapshot of the current defaults.
pub fn defaults() -> IoDefaults {
    match DEFAULTS.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replaces the process-wide defaults.
pub fn set_defaults(value: IoDefaults) {
    match DEFAULTS.write() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}

/// Updates selected fields in place.
pub fn update_defaults(change: impl FnOnce(&mut IoDefaults)) {
    match DEFAULTS.write() {
        Ok(mut guard) => change(&mut guard),
        Err(poisoned) => change(&mut poisoned.into_inner()),
    }
}

pub fn reset_defaults() {
    set_defaults(IoDefaults::default());
}
