//! One-file-per-record JSON adapters.

use super::hot::{load_json, load_json_async, save_json, save_json_async, JSON_EXTENSION};
use super::JsonConfig;
use crate::defaults::defaults;
use crate::io::policy::{cancel_on_error, cancel_on_failure};
use crate::io::{DataError, DataReader, DataResult, DataWriter, ErrorPolicy, SourceKind};
use crate::model::entity::Entity;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

static UNSAFE_FILE_STEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[/\\:*?"<>|\x00-\x1F]"#).expect("valid unsafe file stem regex")
});

/// Reads every `*.json` record file in a directory.
pub struct JsonSplitReader<E> {
    config: JsonConfig,
    source_name: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E> JsonSplitReader<E> {
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

impl<E: Entity + DeserializeOwned> DataReader<E> for JsonSplitReader<E> {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Records come back sorted by identifier. Files that fail to
    /// deserialize are skipped; I/O errors abort the read.
    fn read_data(&self) -> DataResult<Vec<E>> {
        let started_at = Instant::now();
        let dir = self.config.path();
        ensure_dir(dir, self.config.create_missing())?;

        let mut items = Vec::new();
        let mut skipped = 0_usize;
        for path in record_files(dir)? {
            match load_json::<E>(&path) {
                Ok(item) => items.push(item),
                Err(err @ DataError::Serialization { .. }) => {
                    skipped += 1;
                    log_skip(&path, &err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(finish_read(dir, items, skipped, started_at))
    }

    async fn read_data_async(&self, cancel: Option<&CancellationToken>) -> DataResult<Vec<E>> {
        cancel_on_error(read_dir_async(&self.config).await, cancel)
    }
}

async fn read_dir_async<E: Entity + DeserializeOwned>(config: &JsonConfig) -> DataResult<Vec<E>> {
    let started_at = Instant::now();
    let dir = config.path();
    ensure_dir_async(dir, config.create_missing()).await?;

    let mut items = Vec::new();
    let mut skipped = 0_usize;
    for path in record_files_async(dir).await? {
        match load_json_async::<E>(&path).await {
            Ok(item) => items.push(item),
            Err(err @ DataError::Serialization { .. }) => {
                skipped += 1;
                log_skip(&path, &err);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(finish_read(dir, items, skipped, started_at))
}

/// Writes each record to `<dir>/<id>.json`, replacing that file whole.
///
/// No other file is read or written, so writers targeting different
/// identifiers never interfere.
pub struct JsonSplitWriter<E> {
    config: JsonConfig,
    source_name: String,
    policy: ErrorPolicy,
    _entity: PhantomData<fn(E)>,
}

impl<E> JsonSplitWriter<E> {
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

impl<E: Entity> JsonSplitWriter<E> {
    /// File that holds the record with identifier `id`.
    pub fn record_path(&self, id: &E::Id) -> DataResult<PathBuf> {
        record_path(self.config.path(), &id.to_string())
    }
}

impl<E: Entity + Serialize> JsonSplitWriter<E> {
    fn store(&self, items: &[E]) -> DataResult<()> {
        let started_at = Instant::now();
        let dir = self.config.path();
        let result = ensure_dir(dir, self.config.create_missing()).and_then(|()| {
            for item in items {
                save_json(item, self.record_path(item.id())?, self.config.format())?;
            }
            Ok(())
        });
        log_write(dir, items.len(), started_at, &result);
        result
    }

    async fn store_async(&self, items: &[E]) -> DataResult<()> {
        let started_at = Instant::now();
        let dir = self.config.path();
        let result = self.store_each_async(items).await;
        log_write(dir, items.len(), started_at, &result);
        result
    }

    async fn store_each_async(&self, items: &[E]) -> DataResult<()> {
        ensure_dir_async(self.config.path(), self.config.create_missing()).await?;
        for item in items {
            save_json_async(item, self.record_path(item.id())?, self.config.format()).await?;
        }
        Ok(())
    }
}

impl<E: Entity + Serialize> DataWriter<E> for JsonSplitWriter<E> {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn write_data(&self, item: E) -> DataResult<bool> {
        self.write_batch(vec![item])
    }

    fn write_batch(&self, items: Vec<E>) -> DataResult<bool> {
        self.policy.settle(&self.source_name, self.store(&items))
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
        let outcome = self.store_async(&items).await;
        cancel_on_failure(self.policy.settle(&self.source_name, outcome), cancel)
    }
}

fn record_path(dir: &Path, id: &str) -> DataResult<PathBuf> {
    if id.trim().is_empty() || id == "." || id == ".." || UNSAFE_FILE_STEM_RE.is_match(id) {
        return Err(DataError::InvalidIdentifier(id.to_string()));
    }
    // Always appended: `foo` and `foo.json` are distinct records.
    Ok(dir.join(format!("{id}.{JSON_EXTENSION}")))
}

fn ensure_dir(dir: &Path, create_missing: bool) -> DataResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    if !create_missing {
        return Err(DataError::not_found(SourceKind::Directory, dir.display()));
    }
    std::fs::create_dir_all(dir).map_err(|err| DataError::io(dir.display(), err))?;
    info!("event=json_create module=json status=ok mode=split path={}", dir.display());
    Ok(())
}

async fn ensure_dir_async(dir: &Path, create_missing: bool) -> DataResult<()> {
    let is_dir = tokio::fs::metadata(dir)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if is_dir {
        return Ok(());
    }
    if !create_missing {
        return Err(DataError::not_found(SourceKind::Directory, dir.display()));
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| DataError::io(dir.display(), err))?;
    info!("event=json_create module=json status=ok mode=split path={}", dir.display());
    Ok(())
}

fn is_record_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == JSON_EXTENSION)
}

fn record_files(dir: &Path) -> DataResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|err| DataError::io(dir.display(), err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| DataError::io(dir.display(), err))?.path();
        if is_record_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

async fn record_files_async(dir: &Path) -> DataResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| DataError::io(dir.display(), err))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| DataError::io(dir.display(), err))?
    {
        let path = entry.path();
        if is_record_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

fn finish_read<E: Entity>(
    dir: &Path,
    mut items: Vec<E>,
    skipped: usize,
    started_at: Instant,
) -> Vec<E> {
    items.sort_by(|a, b| a.id().cmp(b.id()));
    info!(
        "event=json_read module=json status=ok mode=split path={} items={} skipped={} duration_ms={}",
        dir.display(),
        items.len(),
        skipped,
        started_at.elapsed().as_millis()
    );
    items
}

fn log_skip(path: &Path, err: &DataError) {
    warn!(
        "event=json_read module=json status=skipped mode=split path={} error_code={} error={}",
        path.display(),
        err.code(),
        err
    );
}

fn log_write(dir: &Path, count: usize, started_at: Instant, result: &DataResult<()>) {
    match result {
        Ok(()) => info!(
            "event=json_write module=json status=ok mode=split path={} items={} duration_ms={}",
            dir.display(),
            count,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=json_write module=json status=error mode=split path={} items={} error_code={} error={}",
            dir.display(),
            count,
            err.code(),
            err
        ),
    }
}
