//! In-place worksheet writer.

use super::{missing_worksheet, open_workbook, SheetCodec, SheetConfig, SheetRow};
use crate::defaults::defaults;
use crate::io::policy::{cancel_on_failure, join_error};
use crate::io::{DataError, DataResult, DataWriter, ErrorPolicy};
use crate::model::entity::Entity;
use log::{error, info};
use std::marker::PhantomData;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Encodes records into rows and writes them into an existing workbook.
///
/// Rows land at the index the codec assigns; writing the same index twice
/// overwrites the cells in place, so a codec that maps identifiers to stable
/// row positions gets upsert semantics.
pub struct SheetWriter<E, C> {
    config: SheetConfig,
    codec: C,
    source_name: String,
    policy: ErrorPolicy,
    _entity: PhantomData<fn(E)>,
}

impl<E, C: SheetCodec<E>> SheetWriter<E, C> {
    pub fn try_new(config: SheetConfig, codec: C) -> DataResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            codec,
            source_name: defaults().sheet_source_name,
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

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    /// Writes pre-built rows and saves the workbook once.
    pub fn write_rows(&self, rows: Vec<SheetRow>) -> DataResult<bool> {
        self.policy
            .settle(&self.source_name, store_logged(&self.config, &rows))
    }

    pub async fn write_rows_async(
        &self,
        rows: Vec<SheetRow>,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool> {
        let config = self.config.clone();
        let outcome = tokio::task::spawn_blocking(move || store_logged(&config, &rows))
            .await
            .map_err(join_error)
            .and_then(|stored| stored);
        cancel_on_failure(self.policy.settle(&self.source_name, outcome), cancel)
    }

    fn encode_all(&self, items: &[E]) -> DataResult<Vec<SheetRow>> {
        items.iter().map(|item| self.codec.encode(item)).collect()
    }
}

impl<E, C> DataWriter<E> for SheetWriter<E, C>
where
    E: Entity,
    C: SheetCodec<E>,
{
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn write_data(&self, item: E) -> DataResult<bool> {
        self.write_batch(vec![item])
    }

    fn write_batch(&self, items: Vec<E>) -> DataResult<bool> {
        match self.encode_all(&items) {
            Ok(rows) => self.write_rows(rows),
            Err(err) => self.policy.settle(&self.source_name, Err(err)),
        }
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
        match self.encode_all(&items) {
            Ok(rows) => self.write_rows_async(rows, cancel).await,
            Err(err) => cancel_on_failure(self.policy.settle(&self.source_name, Err(err)), cancel),
        }
    }
}

fn store_logged(config: &SheetConfig, rows: &[SheetRow]) -> DataResult<()> {
    let started_at = Instant::now();
    let result = store_rows(config, rows);
    match &result {
        Ok(()) => info!(
            "event=sheet_write module=sheet status=ok worksheet={} rows={} duration_ms={}",
            config.worksheet(),
            rows.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=sheet_write module=sheet status=error worksheet={} rows={} error_code={} error={}",
            config.worksheet(),
            rows.len(),
            err.code(),
            err
        ),
    }
    result
}

/// Rows must start at the configured column and fit before its end column.
fn check_region(config: &SheetConfig, row: &SheetRow) -> DataResult<()> {
    if row.start_column() != config.start_column() {
        return Err(DataError::InvalidData(format!(
            "row {} starts at column {}; worksheet `{}` is configured to start at column {}",
            row.row_index(),
            row.start_column(),
            config.worksheet(),
            config.start_column()
        )));
    }
    let width = (config.end_column() - config.start_column() + 1) as usize;
    if row.len() > width {
        return Err(DataError::InvalidData(format!(
            "row {} has {} values; columns {}..={} hold {}",
            row.row_index(),
            row.len(),
            config.start_column(),
            config.end_column(),
            width
        )));
    }
    Ok(())
}

fn store_rows(config: &SheetConfig, rows: &[SheetRow]) -> DataResult<()> {
    if let Some(row) = rows.iter().find(|row| row.row_index() == 0) {
        return Err(DataError::InvalidData(format!(
            "row index must be 1-based; got 0 for values `{}`",
            row.join(";")
        )));
    }
    for row in rows {
        check_region(config, row)?;
    }

    let path = config.path();
    let location = path.display().to_string();
    let mut book = if path.is_file() || !config.create_missing() {
        open_workbook(path)?
    } else {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| DataError::io(parent.display(), err))?;
        }
        umya_spreadsheet::new_file_empty_worksheet()
    };

    if book.get_sheet_by_name(config.worksheet()).is_none() {
        if !config.create_missing() {
            return Err(missing_worksheet(&book, config.worksheet()));
        }
        book.new_sheet(config.worksheet())
            .map_err(|message| DataError::Spreadsheet {
                location: location.clone(),
                message: message.to_string(),
            })?;
    }

    let sheet = book
        .get_sheet_by_name_mut(config.worksheet())
        .ok_or_else(|| DataError::Spreadsheet {
            location: location.clone(),
            message: format!("worksheet `{}` vanished after creation", config.worksheet()),
        })?;

    for row in rows {
        for (offset, value) in (0_u32..).zip(row.values()) {
            sheet
                .get_cell_mut((config.start_column() + offset, row.row_index()))
                .set_value(value.clone());
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|err| DataError::Spreadsheet {
        location,
        message: err.to_string(),
    })
}
