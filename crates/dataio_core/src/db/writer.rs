//! Table writer: find by key, merge or add, save once.

use super::reader::ensure_table;
use super::{DbContext, Table};
use crate::defaults::defaults;
use crate::io::policy::cancel_on_failure;
use crate::io::{DataResult, DataWriter, ErrorPolicy};
use log::{error, info};
use std::marker::PhantomData;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Upserts entities into `E`'s table through a [`DbContext`].
///
/// Each write call is one unit of work: every item is located by key,
/// merged onto the stored row or marked for insertion, then the whole
/// change-set is committed by a single `save_changes`.
///
/// A failed call leaves the context's tracker as it was before the call:
/// changes staged earlier by the caller stay pending, and nothing from the
/// failed batch remains tracked.
pub struct DbWriter<'ctx, E> {
    context: &'ctx DbContext,
    source_name: String,
    policy: ErrorPolicy,
    _entity: PhantomData<fn(E)>,
}

impl<'ctx, E: Table> DbWriter<'ctx, E> {
    /// # Errors
    /// - `NotFound(Table)` when `E::TABLE` is absent.
    pub fn try_new(context: &'ctx DbContext) -> DataResult<Self> {
        ensure_table::<E>(context)?;
        Ok(Self {
            context,
            source_name: defaults().db_source_name,
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

    fn upsert(&self, items: Vec<E>) -> DataResult<()> {
        let started_at = Instant::now();
        let count = items.len();
        let snapshot = self.context.snapshot();

        let result = self.stage(items).and_then(|()| {
            self.context.save_changes()?;
            Ok(())
        });

        match &result {
            Ok(()) => info!(
                "event=db_write module=db status=ok table={} items={} duration_ms={}",
                E::TABLE,
                count,
                started_at.elapsed().as_millis()
            ),
            Err(err) => {
                self.context.restore(snapshot);
                error!(
                    "event=db_write module=db status=error table={} items={} error_code={} error={}",
                    E::TABLE,
                    count,
                    err.code(),
                    err
                );
            }
        }
        result
    }

    fn stage(&self, items: Vec<E>) -> DataResult<()> {
        for item in items {
            match self.context.find::<E>(item.id())? {
                Some(mut existing) => {
                    existing.merge_from(&item);
                    self.context.update(existing)?;
                }
                None => self.context.add(item)?,
            }
        }
        Ok(())
    }
}

impl<E: Table> DataWriter<E> for DbWriter<'_, E> {
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
        cancel_on_failure(self.write_data(item), cancel)
    }

    async fn write_batch_async(
        &self,
        items: Vec<E>,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool> {
        cancel_on_failure(self.write_batch(items), cancel)
    }
}
