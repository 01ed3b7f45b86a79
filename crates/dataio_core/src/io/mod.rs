//! Reader/writer contracts implemented by every storage backend.
//!
//! # Responsibility
//! - Define the uniform enumerate/upsert surface callers program against.
//! - Provide the loosely-typed entry points on top of the typed ones.
//!
//! # Invariants
//! - Reads never mutate backend state, except creating a missing source when
//!   the adapter is configured to.
//! - A write call applies items in caller order and commits once.
//! - Async operations cancel the supplied token before returning a failure.

pub mod dispatch;
pub mod error;
pub mod policy;

use crate::model::entity::Entity;
use dispatch::{narrow, narrow_all, Variant};
use policy::{cancel_on_error, cancel_on_failure};
use tokio_util::sync::CancellationToken;

pub use error::{DataError, DataResult, SourceKind};
pub use policy::ErrorPolicy;

/// Enumerates every persisted record of type `E`.
#[allow(async_fn_in_trait)]
pub trait DataReader<E> {
    /// Descriptive label of the backing medium.
    fn source_name(&self) -> &str;

    fn read_data(&self) -> DataResult<Vec<E>>;

    /// Async twin of [`read_data`](Self::read_data).
    ///
    /// `cancel` is cancelled when the read fails.
    async fn read_data_async(&self, cancel: Option<&CancellationToken>) -> DataResult<Vec<E>>;

    /// Reads records widened into `T` (typically an `entity_union!` enum).
    fn read_as<T: From<E>>(&self) -> DataResult<Vec<T>> {
        Ok(self.read_data()?.into_iter().map(T::from).collect())
    }

    async fn read_as_async<T: From<E>>(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<Vec<T>> {
        let items = self.read_data_async(cancel).await?;
        Ok(items.into_iter().map(T::from).collect())
    }
}

/// Upserts records of type `E` by identifier.
///
/// Writes return `Ok(true)` on success. `Ok(false)` is only produced by
/// writers configured with [`ErrorPolicy::ReportFalse`].
#[allow(async_fn_in_trait)]
pub trait DataWriter<E: Entity> {
    fn source_name(&self) -> &str;

    fn write_data(&self, item: E) -> DataResult<bool>;

    /// Upserts `items` in order and commits once.
    fn write_batch(&self, items: Vec<E>) -> DataResult<bool>;

    async fn write_data_async(
        &self,
        item: E,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool>;

    async fn write_batch_async(
        &self,
        items: Vec<E>,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool>;

    /// Loosely-typed entry point: narrows `record` to `E` first.
    fn write_variant<R: Variant<E>>(&self, record: R) -> DataResult<bool> {
        self.write_data(narrow(record)?)
    }

    /// Narrows every record before writing any of them.
    fn write_variants<R: Variant<E>>(&self, records: Vec<R>) -> DataResult<bool> {
        self.write_batch(narrow_all(records)?)
    }

    async fn write_variant_async<R: Variant<E>>(
        &self,
        record: R,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool> {
        let item = cancel_on_error(narrow(record), cancel)?;
        cancel_on_failure(self.write_data_async(item, cancel).await, cancel)
    }

    async fn write_variants_async<R: Variant<E>>(
        &self,
        records: Vec<R>,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool> {
        let items = cancel_on_error(narrow_all(records), cancel)?;
        cancel_on_failure(self.write_batch_async(items, cancel).await, cancel)
    }
}
