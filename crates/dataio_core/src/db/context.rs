//! Unit-of-work context over one SQLite connection.
//!
//! # Responsibility
//! - Look records up by key, seeing pending changes before committed rows.
//! - Track inserts and updates until `save_changes`.
//! - Apply the tracked change-set inside one transaction.
//!
//! # Invariants
//! - At most one tracked entry exists per `(table, key)`.
//! - Updating an entry that is still pending insertion keeps it an insert.
//! - The tracker is empty after `save_changes`, whether it succeeded or not.
//! - `restore` puts back exactly the entries captured by `snapshot`.
//! - Single-threaded: the context is not `Sync`.

use super::table::{find_sql, insert_sql, select_sql, update_sql, Table};
use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Transaction};
use std::any::Any;
use std::cell::RefCell;
use std::iter::once;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Added,
    Modified,
}

trait TrackedEntity {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn TrackedEntity>;
    fn apply(&self, tx: &Transaction<'_>, state: EntryState) -> DbResult<()>;
}

impl<T: Table> TrackedEntity for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn TrackedEntity> {
        Box::new(self.clone())
    }

    fn apply(&self, tx: &Transaction<'_>, state: EntryState) -> DbResult<()> {
        let key = T::key_value(self.id());
        match state {
            EntryState::Added => {
                tx.execute(
                    &insert_sql::<T>(),
                    params_from_iter(once(key).chain(self.column_values())),
                )?;
            }
            EntryState::Modified => {
                let changed = tx.execute(
                    &update_sql::<T>(),
                    params_from_iter(self.column_values().into_iter().chain(once(key))),
                )?;
                if changed == 0 {
                    return Err(DbError::StaleEntry {
                        table: T::TABLE,
                        key: self.id().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

struct TrackedEntry {
    table: &'static str,
    key: Value,
    state: EntryState,
    entity: Box<dyn TrackedEntity>,
}

impl Clone for TrackedEntry {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            key: self.key.clone(),
            state: self.state,
            entity: self.entity.clone_boxed(),
        }
    }
}

/// Copy of the pending change-set taken by [`DbContext::snapshot`].
pub(crate) struct TrackerSnapshot(Vec<TrackedEntry>);

/// SQLite connection plus a pending change-set.
pub struct DbContext {
    conn: Connection,
    tracker: RefCell<Vec<TrackedEntry>>,
}

impl DbContext {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            tracker: RefCell::new(Vec::new()),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Releases the connection. Pending changes are dropped.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    pub fn table_exists(&self, table: &str) -> DbResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// User table names, sorted.
    pub fn table_names(&self) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name ASC;",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Finds one record by key; tracked entries shadow committed rows.
    pub fn find<T: Table>(&self, id: &T::Id) -> DbResult<Option<T>> {
        let key = T::key_value(id);
        if let Some(tracked) = self.tracked_clone::<T>(&key)? {
            return Ok(Some(tracked));
        }

        let found = self
            .conn
            .query_row(&find_sql::<T>(), [key], |row| T::from_row(row))
            .optional()?;
        Ok(found)
    }

    /// Reads every committed row of `T`'s table.
    pub fn all<T: Table>(&self) -> DbResult<Vec<T>> {
        let mut stmt = self.conn.prepare(&select_sql::<T>())?;
        let rows = stmt
            .query_map([], |row| T::from_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Marks `entity` for insertion.
    pub fn add<T: Table>(&self, entity: T) -> DbResult<()> {
        self.track(entity, EntryState::Added)
    }

    /// Marks `entity` as modified; it must already exist as a row or be
    /// pending insertion.
    pub fn update<T: Table>(&self, entity: T) -> DbResult<()> {
        self.track(entity, EntryState::Modified)
    }

    pub fn has_changes(&self) -> bool {
        !self.tracker.borrow().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.tracker.borrow().len()
    }

    pub fn discard_changes(&self) {
        let dropped = std::mem::take(&mut *self.tracker.borrow_mut()).len();
        if dropped > 0 {
            debug!("event=db_discard module=db status=ok entries={dropped}");
        }
    }

    /// Captures the pending change-set so a failed unit of work can roll
    /// the tracker back without touching entries staged before it.
    pub(crate) fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot(self.tracker.borrow().clone())
    }

    pub(crate) fn restore(&self, snapshot: TrackerSnapshot) {
        let restored = snapshot.0.len();
        *self.tracker.borrow_mut() = snapshot.0;
        debug!("event=db_restore module=db status=ok entries={restored}");
    }

    /// Applies every tracked change in one transaction.
    ///
    /// Returns the number of applied entries.
    pub fn save_changes(&self) -> DbResult<usize> {
        let entries = std::mem::take(&mut *self.tracker.borrow_mut());
        if entries.is_empty() {
            return Ok(0);
        }

        let started_at = Instant::now();
        match apply_entries(&self.conn, &entries) {
            Ok(()) => {
                info!(
                    "event=db_save module=db status=ok entries={} duration_ms={}",
                    entries.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(entries.len())
            }
            Err(err) => {
                error!(
                    "event=db_save module=db status=error entries={} duration_ms={} error={}",
                    entries.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn tracked_clone<T: Table>(&self, key: &Value) -> DbResult<Option<T>> {
        let tracker = self.tracker.borrow();
        let Some(entry) = tracker
            .iter()
            .find(|entry| entry.table == T::TABLE && &entry.key == key)
        else {
            return Ok(None);
        };

        match entry.entity.as_any().downcast_ref::<T>() {
            Some(entity) => Ok(Some(entity.clone())),
            None => Err(DbError::TrackerConflict {
                table: T::TABLE,
                key: format!("{key:?}"),
            }),
        }
    }

    fn track<T: Table>(&self, entity: T, state: EntryState) -> DbResult<()> {
        let key = T::key_value(entity.id());
        let mut tracker = self.tracker.borrow_mut();

        if let Some(entry) = tracker
            .iter_mut()
            .find(|entry| entry.table == T::TABLE && entry.key == key)
        {
            if entry.entity.as_any().downcast_ref::<T>().is_none() {
                return Err(DbError::TrackerConflict {
                    table: T::TABLE,
                    key: entity.id().to_string(),
                });
            }
            entry.entity = Box::new(entity);
            return Ok(());
        }

        tracker.push(TrackedEntry {
            table: T::TABLE,
            key,
            state,
            entity: Box::new(entity),
        });
        Ok(())
    }
}

fn apply_entries(conn: &Connection, entries: &[TrackedEntry]) -> DbResult<()> {
    let tx = conn.unchecked_transaction()?;
    for entry in entries {
        entry.entity.apply(&tx, entry.state)?;
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::DbContext;
    use crate::db::{open_db_in_memory, DbError, Table};
    use crate::model::entity::Entity;
    use rusqlite::types::Value;
    use rusqlite::Row;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        id: i64,
        hits: i64,
        enabled: bool,
    }

    impl Entity for Counter {
        type Id = i64;

        fn id(&self) -> &i64 {
            &self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
    }

    impl Table for Counter {
        const TABLE: &'static str = "counters";
        const KEY: &'static str = "id";
        const COLUMNS: &'static [&'static str] = &["hits", "enabled"];

        fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
            Ok(Self {
                id: row.get("id")?,
                hits: row.get("hits")?,
                enabled: row.get("enabled")?,
            })
        }

        fn column_values(&self) -> Vec<Value> {
            vec![
                Value::Integer(self.hits),
                Value::Integer(i64::from(self.enabled)),
            ]
        }

        fn key_value(id: &i64) -> Value {
            Value::Integer(*id)
        }
    }

    fn context() -> DbContext {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE counters (
                id INTEGER PRIMARY KEY,
                hits INTEGER NOT NULL,
                enabled INTEGER NOT NULL
            );",
        )
        .unwrap();
        DbContext::new(conn)
    }

    fn counter(id: i64, hits: i64) -> Counter {
        Counter {
            id,
            hits,
            enabled: true,
        }
    }

    #[test]
    fn find_sees_pending_insert_before_save() {
        let ctx = context();
        ctx.add(counter(1, 5)).unwrap();

        assert_eq!(ctx.find::<Counter>(&1).unwrap(), Some(counter(1, 5)));
        assert!(ctx.all::<Counter>().unwrap().is_empty());

        assert_eq!(ctx.save_changes().unwrap(), 1);
        assert_eq!(ctx.all::<Counter>().unwrap(), vec![counter(1, 5)]);
        assert!(!ctx.has_changes());
    }

    #[test]
    fn update_of_pending_insert_stays_one_insert() {
        let ctx = context();
        ctx.add(counter(1, 5)).unwrap();
        ctx.update(counter(1, 8)).unwrap();

        assert_eq!(ctx.pending_count(), 1);
        ctx.save_changes().unwrap();
        assert_eq!(ctx.all::<Counter>().unwrap(), vec![counter(1, 8)]);
    }

    #[test]
    fn failed_save_rolls_back_and_clears_tracker() {
        let ctx = context();
        ctx.add(counter(1, 1)).unwrap();
        ctx.save_changes().unwrap();

        ctx.add(counter(2, 2)).unwrap();
        ctx.update(counter(3, 3)).unwrap();

        let err = ctx.save_changes().unwrap_err();
        assert!(matches!(err, DbError::StaleEntry { .. }));
        assert!(!ctx.has_changes());
        assert_eq!(ctx.all::<Counter>().unwrap(), vec![counter(1, 1)]);
    }

    #[test]
    fn table_names_lists_user_tables() {
        let ctx = context();
        assert!(ctx.table_exists("counters").unwrap());
        assert!(!ctx.table_exists("missing").unwrap());
        assert_eq!(ctx.table_names().unwrap(), vec!["counters".to_string()]);
    }
}
