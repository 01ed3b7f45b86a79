//! Change and save notifications for identity-keyed entities.
//!
//! # Responsibility
//! - Let an owning component register callbacks or channel subscribers.
//! - Fan one event out to every registration in registration order.
//!
//! # Invariants
//! - Entities never hold listeners; the owner raises events on their behalf.
//! - Closed channel subscribers are pruned on the next dispatch.

use crate::model::entity::Entity;
use log::debug;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Kind of notification raised for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityEventKind {
    /// Field values of the entity changed in memory.
    DataChanged,
    /// Caller asked for the entity to be persisted.
    SaveRequested,
}

/// Notification payload: which record and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityEvent<Id> {
    pub kind: EntityEventKind,
    pub id: Id,
}

type Callback<Id> = Box<dyn Fn(&EntityEvent<Id>) + Send + Sync>;

/// Registry of callbacks and channel subscribers for one entity type.
pub struct EntityEvents<Id> {
    data_changed: Vec<Callback<Id>>,
    save_requested: Vec<Callback<Id>>,
    subscribers: Vec<UnboundedSender<EntityEvent<Id>>>,
}

impl<Id: Clone> Default for EntityEvents<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Clone> EntityEvents<Id> {
    pub fn new() -> Self {
        Self {
            data_changed: Vec::new(),
            save_requested: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn on_data_changed(&mut self, callback: impl Fn(&EntityEvent<Id>) + Send + Sync + 'static) {
        self.data_changed.push(Box::new(callback));
    }

    pub fn on_save_requested(
        &mut self,
        callback: impl Fn(&EntityEvent<Id>) + Send + Sync + 'static,
    ) {
        self.save_requested.push(Box::new(callback));
    }

    /// Opens a channel receiving every event of both kinds.
    pub fn subscribe(&mut self) -> UnboundedReceiver<EntityEvent<Id>> {
        let (sender, receiver) = unbounded_channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Raises `DataChanged` for `entity`.
    pub fn data_changed<E>(&mut self, entity: &E)
    where
        E: Entity<Id = Id>,
    {
        self.data_changed_id(entity.id().clone());
    }

    /// Raises `DataChanged` for a record known only by identifier.
    pub fn data_changed_id(&mut self, id: Id) {
        self.dispatch(EntityEvent {
            kind: EntityEventKind::DataChanged,
            id,
        });
    }

    /// Raises `SaveRequested` for `entity`.
    pub fn request_save<E>(&mut self, entity: &E)
    where
        E: Entity<Id = Id>,
    {
        self.dispatch(EntityEvent {
            kind: EntityEventKind::SaveRequested,
            id: entity.id().clone(),
        });
    }

    /// Number of live registrations (callbacks plus open channels).
    pub fn listener_count(&self) -> usize {
        self.data_changed.len()
            + self.save_requested.len()
            + self.subscribers.iter().filter(|tx| !tx.is_closed()).count()
    }

    fn dispatch(&mut self, event: EntityEvent<Id>) {
        let callbacks = match event.kind {
            EntityEventKind::DataChanged => &self.data_changed,
            EntityEventKind::SaveRequested => &self.save_requested,
        };
        for callback in callbacks {
            callback(&event);
        }

        let before = self.subscribers.len();
        self.subscribers
            .retain(|sender| sender.send(event.clone()).is_ok());
        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            debug!("event=entity_events module=model status=pruned subscribers={pruned}");
        }
    }
}
