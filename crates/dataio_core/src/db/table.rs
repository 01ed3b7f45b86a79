//! Entity-to-table mapping.

use crate::model::entity::Entity;
use rusqlite::types::Value;
use rusqlite::Row;

/// Maps an entity type onto one SQLite table.
///
/// The key column holds the entity identifier; `COLUMNS` lists every other
/// persisted column in the order produced by [`Table::column_values`].
pub trait Table: Entity + Clone + 'static {
    const TABLE: &'static str;
    const KEY: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Builds an entity from a row selected as `KEY, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Values for `COLUMNS`, same order.
    fn column_values(&self) -> Vec<Value>;

    fn key_value(id: &Self::Id) -> Value;
}

pub(crate) fn select_sql<T: Table>() -> String {
    let mut columns = vec![T::KEY];
    columns.extend_from_slice(T::COLUMNS);
    format!("SELECT {} FROM {}", columns.join(", "), T::TABLE)
}

pub(crate) fn find_sql<T: Table>() -> String {
    format!("{} WHERE {} = ?1", select_sql::<T>(), T::KEY)
}

pub(crate) fn insert_sql<T: Table>() -> String {
    let mut columns = vec![T::KEY];
    columns.extend_from_slice(T::COLUMNS);
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        columns.join(", "),
        placeholders
    )
}

pub(crate) fn update_sql<T: Table>() -> String {
    let assignments = T::COLUMNS
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        T::TABLE,
        assignments,
        T::KEY,
        T::COLUMNS.len() + 1
    )
}
