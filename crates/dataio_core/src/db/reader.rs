//! Table reader.

use super::{DbContext, Table};
use crate::defaults::defaults;
use crate::io::policy::cancel_on_error;
use crate::io::{DataError, DataReader, DataResult, SourceKind};
use log::{error, info};
use std::marker::PhantomData;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Reads every committed row of `E`'s table.
pub struct DbReader<'ctx, E> {
    context: &'ctx DbContext,
    source_name: String,
    _entity: PhantomData<fn() -> E>,
}

impl<'ctx, E: Table> DbReader<'ctx, E> {
    /// Binds a reader to `context`.
    ///
    /// # Errors
    /// - `NotFound(Table)` listing existing tables when `E::TABLE` is absent.
    pub fn try_new(context: &'ctx DbContext) -> DataResult<Self> {
        ensure_table::<E>(context)?;
        Ok(Self {
            context,
            source_name: defaults().db_source_name,
            _entity: PhantomData,
        })
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

impl<E: Table> DataReader<E> for DbReader<'_, E> {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn read_data(&self) -> DataResult<Vec<E>> {
        let started_at = Instant::now();
        match self.context.all::<E>() {
            Ok(items) => {
                info!(
                    "event=db_read module=db status=ok table={} items={} duration_ms={}",
                    E::TABLE,
                    items.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(items)
            }
            Err(err) => {
                error!(
                    "event=db_read module=db status=error table={} error={}",
                    E::TABLE,
                    err
                );
                Err(err.into())
            }
        }
    }

    async fn read_data_async(&self, cancel: Option<&CancellationToken>) -> DataResult<Vec<E>> {
        cancel_on_error(self.read_data(), cancel)
    }
}

pub(super) fn ensure_table<E: Table>(context: &DbContext) -> DataResult<()> {
    if context.table_exists(E::TABLE)? {
        return Ok(());
    }
    Err(DataError::NotFound {
        kind: SourceKind::Table,
        location: E::TABLE.to_string(),
        available: context.table_names()?,
    })
}
