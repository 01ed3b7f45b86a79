//! Worksheet reader with trailing-blank detection.

use super::{missing_worksheet, open_workbook, SheetCodec, SheetConfig, SheetRow};
use crate::defaults::defaults;
use crate::io::policy::{cancel_on_error, join_error};
use crate::io::{DataError, DataReader, DataResult};
use log::{debug, error, info};
use std::marker::PhantomData;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_EMPTY_RUN_LIMIT: u32 = 3;

/// Reads a worksheet region and decodes each non-blank row into `E`.
pub struct SheetReader<E, C> {
    config: SheetConfig,
    codec: C,
    empty_run_limit: u32,
    source_name: String,
    data_separator: String,
    row_separator: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E, C: SheetCodec<E>> SheetReader<E, C> {
    pub fn try_new(config: SheetConfig, codec: C) -> DataResult<Self> {
        config.validate()?;
        let defaults = defaults();
        Ok(Self {
            config,
            codec,
            empty_run_limit: DEFAULT_EMPTY_RUN_LIMIT,
            source_name: defaults.sheet_source_name,
            data_separator: defaults.data_separator,
            row_separator: defaults.row_separator,
            _entity: PhantomData,
        })
    }

    /// Number of consecutive blank rows tolerated before the scan stops.
    pub fn with_empty_run_limit(mut self, limit: u32) -> DataResult<Self> {
        if limit == 0 {
            return Err(DataError::InvalidConfig(
                "empty run limit must be positive".to_string(),
            ));
        }
        self.empty_run_limit = limit;
        Ok(self)
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn with_separators(mut self, data: impl Into<String>, row: impl Into<String>) -> Self {
        self.data_separator = data.into();
        self.row_separator = row.into();
        self
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    /// Scans the region and returns every non-blank row.
    pub fn read_rows(&self) -> DataResult<Vec<SheetRow>> {
        scan_logged(&self.config, self.empty_run_limit)
    }

    pub async fn read_rows_async(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<Vec<SheetRow>> {
        let config = self.config.clone();
        let limit = self.empty_run_limit;
        let result = tokio::task::spawn_blocking(move || scan_logged(&config, limit))
            .await
            .map_err(join_error)
            .and_then(|rows| rows);
        cancel_on_error(result, cancel)
    }

    /// Each row flattened with the data separator.
    pub fn read_joined(&self) -> DataResult<Vec<String>> {
        Ok(self
            .read_rows()?
            .iter()
            .map(|row| row.join(&self.data_separator))
            .collect())
    }

    /// Whole region flattened: rows joined by the row separator.
    pub fn read_text(&self) -> DataResult<String> {
        Ok(self.read_joined()?.join(&self.row_separator))
    }

    fn decode_all(&self, rows: &[SheetRow]) -> DataResult<Vec<E>> {
        rows.iter().map(|row| self.codec.decode(row)).collect()
    }
}

impl<E, C> DataReader<E> for SheetReader<E, C>
where
    C: SheetCodec<E>,
{
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn read_data(&self) -> DataResult<Vec<E>> {
        let rows = self.read_rows()?;
        self.decode_all(&rows)
    }

    async fn read_data_async(&self, cancel: Option<&CancellationToken>) -> DataResult<Vec<E>> {
        let rows = self.read_rows_async(cancel).await?;
        cancel_on_error(self.decode_all(&rows), cancel)
    }
}

fn scan_logged(config: &SheetConfig, empty_run_limit: u32) -> DataResult<Vec<SheetRow>> {
    let started_at = Instant::now();
    match scan_rows(config, empty_run_limit) {
        Ok(rows) => {
            info!(
                "event=sheet_read module=sheet status=ok worksheet={} rows={} duration_ms={}",
                config.worksheet(),
                rows.len(),
                started_at.elapsed().as_millis()
            );
            Ok(rows)
        }
        Err(err) => {
            error!(
                "event=sheet_read module=sheet status=error worksheet={} error_code={} error={}",
                config.worksheet(),
                err.code(),
                err
            );
            Err(err)
        }
    }
}

fn scan_rows(config: &SheetConfig, empty_run_limit: u32) -> DataResult<Vec<SheetRow>> {
    let book = open_workbook(config.path())?;
    let sheet = book
        .get_sheet_by_name(config.worksheet())
        .ok_or_else(|| missing_worksheet(&book, config.worksheet()))?;

    let mut rows = Vec::new();
    let mut empty_run = 0_u32;
    for row_index in config.start_row()..=sheet.get_highest_row() {
        let mut row = config.new_row(row_index);
        for column in config.start_column()..=config.end_column() {
            row.push(sheet.get_formatted_value((column, row_index)));
        }

        if row.is_blank() {
            empty_run += 1;
        } else {
            empty_run = 0;
            rows.push(row);
        }

        if empty_run > empty_run_limit {
            debug!(
                "event=sheet_read module=sheet status=stopped worksheet={} row={} empty_run={}",
                config.worksheet(),
                row_index,
                empty_run
            );
            break;
        }
    }
    Ok(rows)
}
