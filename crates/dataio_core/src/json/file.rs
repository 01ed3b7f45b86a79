//! Single-file JSON array adapters.

use super::hot::to_json_string;
use super::JsonConfig;
use crate::defaults::defaults;
use crate::io::policy::{cancel_on_error, cancel_on_failure};
use crate::io::{DataError, DataReader, DataResult, DataWriter, ErrorPolicy, SourceKind};
use crate::model::entity::{upsert_in_place, Entity};
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Reads the whole array stored in one JSON file.
pub struct JsonFileReader<E> {
    config: JsonConfig,
    source_name: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> JsonFileReader<E> {
    pub fn try_new(config: JsonConfig) -> DataResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source_name: defaults().json_source_name,
            _entity: PhantomData,
        })
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

impl<E: DeserializeOwned> DataReader<E> for JsonFileReader<E> {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Creates an empty file first when it is missing and creation is on.
    fn read_data(&self) -> DataResult<Vec<E>> {
        let path = self.config.path();
        if !path.exists() {
            if !self.config.create_missing() {
                return Err(DataError::not_found(SourceKind::File, path.display()));
            }
            create_empty_file(path)?;
        }
        let text = std::fs::read_to_string(path).map_err(|err| DataError::io(path.display(), err))?;
        log_read(path, parse_array(path, &text))
    }

    async fn read_data_async(&self, cancel: Option<&CancellationToken>) -> DataResult<Vec<E>> {
        cancel_on_error(read_file_async(&self.config).await, cancel)
    }
}

async fn read_file_async<E: DeserializeOwned>(config: &JsonConfig) -> DataResult<Vec<E>> {
    let path = config.path();
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        if !config.create_missing() {
            return Err(DataError::not_found(SourceKind::File, path.display()));
        }
        create_empty_file_async(path).await?;
    }
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| DataError::io(path.display(), err))?;
    log_read(path, parse_array(path, &text))
}

/// Upserts into the array stored in one JSON file.
///
/// Each call reads the current array once, applies every item in order
/// (merge onto the first record with the same identifier, else append) and
/// rewrites the file once.
pub struct JsonFileWriter<E> {
    config: JsonConfig,
    source_name: String,
    policy: ErrorPolicy,
    _entity: PhantomData<fn(E)>,
}

impl<E> JsonFileWriter<E> {
    pub fn try_new(config: JsonConfig) -> DataResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source_name: defaults().json_source_name,
            policy: ErrorPolicy::default(),
            _entity: PhantomData,
        })
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<E> JsonFileWriter<E>
where
    E: Entity + Clone + Serialize + DeserializeOwned,
{
    fn upsert(&self, items: Vec<E>) -> DataResult<()> {
        let started_at = Instant::now();
        let count = items.len();
        let result = self.rewrite(items);
        log_write(self.config.path(), count, started_at, &result);
        result
    }

    fn rewrite(&self, items: Vec<E>) -> DataResult<()> {
        let path = self.config.path();
        let text = self.current_text()?.unwrap_or_default();
        let merged = merge_items(parse_array(path, &text)?, items);
        let output = to_json_string(&merged, self.config.format())
            .map_err(|err| DataError::serialization(path.display(), err))?;
        std::fs::write(path, output).map_err(|err| DataError::io(path.display(), err))
    }

    async fn upsert_async(&self, items: Vec<E>) -> DataResult<()> {
        let started_at = Instant::now();
        let count = items.len();
        let result = self.rewrite_async(items).await;
        log_write(self.config.path(), count, started_at, &result);
        result
    }

    async fn rewrite_async(&self, items: Vec<E>) -> DataResult<()> {
        let path = self.config.path();
        let text = self.current_text_async().await?.unwrap_or_default();
        let merged = merge_items(parse_array(path, &text)?, items);
        let output = to_json_string(&merged, self.config.format())
            .map_err(|err| DataError::serialization(path.display(), err))?;
        tokio::fs::write(path, output)
            .await
            .map_err(|err| DataError::io(path.display(), err))
    }

    /// Current file content; `None` when missing and creation is allowed.
    fn current_text(&self) -> DataResult<Option<String>> {
        let path = self.config.path();
        if path.exists() {
            return std::fs::read_to_string(path)
                .map(Some)
                .map_err(|err| DataError::io(path.display(), err));
        }
        if !self.config.create_missing() {
            return Err(DataError::not_found(SourceKind::File, path.display()));
        }
        create_parent_dirs(path)?;
        Ok(None)
    }

    async fn current_text_async(&self) -> DataResult<Option<String>> {
        let path = self.config.path();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return tokio::fs::read_to_string(path)
                .await
                .map(Some)
                .map_err(|err| DataError::io(path.display(), err));
        }
        if !self.config.create_missing() {
            return Err(DataError::not_found(SourceKind::File, path.display()));
        }
        create_parent_dirs_async(path).await?;
        Ok(None)
    }
}

impl<E> DataWriter<E> for JsonFileWriter<E>
where
    E: Entity + Clone + Serialize + DeserializeOwned,
{
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn write_data(&self, item: E) -> DataResult<bool> {
        self.write_batch(vec![item])
    }

    fn write_batch(&self, items: Vec<E>) -> DataResult<bool> {
        self.policy.settle(&self.source_name, self.upsert(items))
    }

    async fn write_data_async(
        &self,
        item: E,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool> {
        self.write_batch_async(vec![item], cancel).await
    }

    async fn write_batch_async(
        &self,
        items: Vec<E>,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool> {
        let outcome = self.upsert_async(items).await;
        cancel_on_failure(self.policy.settle(&self.source_name, outcome), cancel)
    }
}

fn merge_items<E: Entity + Clone>(mut stored: Vec<E>, incoming: Vec<E>) -> Vec<E> {
    for item in incoming {
        upsert_in_place(&mut stored, item);
    }
    stored
}

/// Parses a JSON array; blank content is an empty array.
fn parse_array<E: DeserializeOwned>(path: &Path, text: &str) -> DataResult<Vec<E>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|err| DataError::serialization(path.display(), err))
}

fn create_parent_dirs(path: &Path) -> DataResult<()> {
    match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => std::fs::create_dir_all(dir).map_err(|err| DataError::io(dir.display(), err)),
        None => Ok(()),
    }
}

async fn create_parent_dirs_async(path: &Path) -> DataResult<()> {
    match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|err| DataError::io(dir.display(), err)),
        None => Ok(()),
    }
}

fn create_empty_file(path: &Path) -> DataResult<()> {
    create_parent_dirs(path)?;
    std::fs::write(path, "").map_err(|err| DataError::io(path.display(), err))?;
    info!("event=json_create module=json status=ok path={}", path.display());
    Ok(())
}

async fn create_empty_file_async(path: &Path) -> DataResult<()> {
    create_parent_dirs_async(path).await?;
    tokio::fs::write(path, "")
        .await
        .map_err(|err| DataError::io(path.display(), err))?;
    info!("event=json_create module=json status=ok path={}", path.display());
    Ok(())
}

fn log_read<E>(path: &Path, result: DataResult<Vec<E>>) -> DataResult<Vec<E>> {
    match &result {
        Ok(items) => info!(
            "event=json_read module=json status=ok mode=file path={} items={}",
            path.display(),
            items.len()
        ),
        Err(err) => error!(
            "event=json_read module=json status=error mode=file path={} error_code={} error={}",
            path.display(),
            err.code(),
            err
        ),
    }
    result
}

fn log_write(path: &Path, count: usize, started_at: Instant, result: &DataResult<()>) {
    match result {
        Ok(()) => info!(
            "event=json_write module=json status=ok mode=file path={} items={} duration_ms={}",
            path.display(),
            count,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=json_write module=json status=error mode=file path={} items={} error_code={} error={}",
            path.display(),
            count,
            err.code(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::merge_items;
    use crate::model::entity::Entity;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u8,
        text: &'static str,
    }

    impl Entity for Note {
        type Id = u8;

        fn id(&self) -> &u8 {
            &self.id
        }

        fn set_id(&mut self, id: u8) {
            self.id = id;
        }

        fn is_enabled(&self) -> bool {
            true
        }

        fn set_enabled(&mut self, _enabled: bool) {}
    }

    #[test]
    fn later_batch_items_win_over_earlier_ones() {
        let stored = vec![Note { id: 1, text: "a" }];
        let merged = merge_items(
            stored,
            vec![
                Note { id: 2, text: "x" },
                Note { id: 2, text: "y" },
                Note { id: 1, text: "b" },
            ],
        );

        assert_eq!(
            merged,
            vec![Note { id: 1, text: "b" }, Note { id: 2, text: "y" }]
        );
    }
}
