//! Column codecs shared by SQLite adapters.

use rusqlite::types::ValueRef;
use rusqlite::Row;

/// Reads a nullable INTEGER column.
///
/// The raw value is inspected first and NULL is reported as `None`; a NULL is
/// never folded into `0`.
pub(crate) fn nullable_integer(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<i64>> {
    match row.get_ref(index)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(value) => Ok(Some(value)),
        other => Err(rusqlite::Error::InvalidColumnType(
            index,
            row.as_ref()
                .column_name(index)
                .map_or_else(|_| index.to_string(), str::to_string),
            other.data_type(),
        )),
    }
}

/// Stores an unsigned address bit-for-bit in SQLite's signed INTEGER.
pub(crate) fn address_to_db(value: u64) -> i64 {
    i64::from_ne_bytes(value.to_ne_bytes())
}

pub(crate) fn address_from_db(value: i64) -> u64 {
    u64::from_ne_bytes(value.to_ne_bytes())
}
