//! Record-level use cases over one reader/writer pair.
//!
//! # Responsibility
//! - Load, filter and look up records without knowing the medium.
//! - Persist records and announce successful writes to listeners.
//! - Copy a whole collection from one backend into another.
//!
//! # Invariants
//! - `DataChanged` is raised only for records of a write that returned
//!   `Ok(true)`.
//! - The service never bypasses the adapters' upsert semantics.

use crate::io::{DataReader, DataResult, DataWriter};
use crate::model::entity::Entity;
use crate::model::events::EntityEvents;
use log::info;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// Use-case wrapper around a reader and a writer for entity `E`.
pub struct DataService<E: Entity, R, W> {
    reader: R,
    writer: W,
    events: EntityEvents<E::Id>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R, W> DataService<E, R, W>
where
    E: Entity,
    R: DataReader<E>,
    W: DataWriter<E>,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            events: EntityEvents::new(),
            _entity: PhantomData,
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Listener registry notified after successful saves.
    pub fn events_mut(&mut self) -> &mut EntityEvents<E::Id> {
        &mut self.events
    }

    pub fn load_all(&self) -> DataResult<Vec<E>> {
        self.reader.read_data()
    }

    /// Records whose enabled flag is set, in reader order.
    pub fn load_enabled(&self) -> DataResult<Vec<E>> {
        let mut items = self.reader.read_data()?;
        items.retain(|item| item.is_enabled());
        Ok(items)
    }

    /// First record carrying `id`, if any.
    pub fn find(&self, id: &E::Id) -> DataResult<Option<E>> {
        Ok(self
            .reader
            .read_data()?
            .into_iter()
            .find(|item| item.id() == id))
    }

    pub fn save(&mut self, item: E) -> DataResult<bool> {
        let id = item.id().clone();
        let saved = self.writer.write_data(item)?;
        if saved {
            self.events.data_changed_id(id);
        }
        Ok(saved)
    }

    pub fn save_all(&mut self, items: Vec<E>) -> DataResult<bool> {
        let ids = collect_ids(&items);
        let saved = self.writer.write_batch(items)?;
        if saved {
            self.announce(ids);
        }
        Ok(saved)
    }

    /// Reads every record and upserts them into `target` in one batch.
    pub fn copy_to<T: DataWriter<E>>(&self, target: &T) -> DataResult<bool> {
        let items = self.reader.read_data()?;
        let count = items.len();
        let copied = target.write_batch(items)?;
        info!(
            "event=data_copy module=service status={} from={} to={} items={}",
            if copied { "ok" } else { "reported_false" },
            self.reader.source_name(),
            target.source_name(),
            count
        );
        Ok(copied)
    }

    pub async fn load_all_async(&self, cancel: Option<&CancellationToken>) -> DataResult<Vec<E>> {
        self.reader.read_data_async(cancel).await
    }

    pub async fn save_all_async(
        &mut self,
        items: Vec<E>,
        cancel: Option<&CancellationToken>,
    ) -> DataResult<bool> {
        let ids = collect_ids(&items);
        let saved = self.writer.write_batch_async(items, cancel).await?;
        if saved {
            self.announce(ids);
        }
        Ok(saved)
    }

    fn announce(&mut self, ids: Vec<E::Id>) {
        for id in ids {
            self.events.data_changed_id(id);
        }
    }
}

fn collect_ids<E: Entity>(items: &[E]) -> Vec<E::Id> {
    items.iter().map(|item| item.id().clone()).collect()
}
