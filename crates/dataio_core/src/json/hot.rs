//! One-call JSON file helpers.
//!
//! # Invariants
//! - Paths without a `.json` extension get one appended.
//! - Errors carry the fitted path.

use crate::defaults::JsonFormat;
use crate::io::{DataError, DataResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const JSON_EXTENSION: &str = "json";

/// Appends `.json` unless `path` already ends with it.
pub fn fit_json_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == JSON_EXTENSION) {
        return path.to_path_buf();
    }
    let mut fitted = OsString::from(path.as_os_str());
    fitted.push(".");
    fitted.push(JSON_EXTENSION);
    PathBuf::from(fitted)
}

pub fn to_json_string<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> serde_json::Result<String> {
    match format {
        JsonFormat::Compact => serde_json::to_string(value),
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
    format: JsonFormat,
) -> DataResult<()> {
    let path = fit_json_path(path);
    let text = to_json_string(value, format).map_err(|err| DataError::serialization(path.display(), err))?;
    std::fs::write(&path, text).map_err(|err| DataError::io(path.display(), err))
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> DataResult<T> {
    let path = fit_json_path(path);
    let text = std::fs::read_to_string(&path).map_err(|err| DataError::io(path.display(), err))?;
    serde_json::from_str(&text).map_err(|err| DataError::serialization(path.display(), err))
}

pub async fn save_json_async<T: Serialize + ?Sized>(
    value: &T,
    path: impl AsRef<Path>,
    format: JsonFormat,
) -> DataResult<()> {
    let path = fit_json_path(path);
    let text = to_json_string(value, format).map_err(|err| DataError::serialization(path.display(), err))?;
    tokio::fs::write(&path, text)
        .await
        .map_err(|err| DataError::io(path.display(), err))
}

pub async fn load_json_async<T: DeserializeOwned>(path: impl AsRef<Path>) -> DataResult<T> {
    let path = fit_json_path(path);
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|err| DataError::io(path.display(), err))?;
    serde_json::from_str(&text).map_err(|err| DataError::serialization(path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::{fit_json_path, load_json, save_json};
    use crate::defaults::JsonFormat;
    use crate::io::DataError;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn fit_json_path_appends_extension_once() {
        assert_eq!(fit_json_path("data/42"), PathBuf::from("data/42.json"));
        assert_eq!(fit_json_path("data/42.json"), PathBuf::from("data/42.json"));
        assert_eq!(fit_json_path("data/v1.2"), PathBuf::from("data/v1.2.json"));
    }

    #[test]
    fn save_then_load_uses_fitted_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1);

        save_json(&value, dir.path().join("map"), JsonFormat::Pretty).unwrap();
        assert!(dir.path().join("map.json").is_file());

        let loaded: BTreeMap<String, i32> = load_json(dir.path().join("map.json")).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn load_json_reports_malformed_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let err = load_json::<BTreeMap<String, i32>>(dir.path().join("bad")).unwrap_err();
        assert!(matches!(err, DataError::Serialization { .. }));
    }
}
