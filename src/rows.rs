//! Typed value extraction from positioned result rows.
//!
//! The accessors here read possibly-NULL scalars and formatted date/time
//! strings out of a row by column name. They are generic over [`ColumnRead`]
//! so the same code runs against a live [`rusqlite::Row`] and against the
//! in-memory [`RowArray`](crate::testing::RowArray) double.
//!
//! Booleans are stored as SQLite INTEGERs (0/1); dates and times are stored
//! as millisecond epochs and formatted in local time.

use chrono::{DateTime, Local, TimeZone};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Row, Rows};
use tracing::{Level, trace};

use crate::error::{DataError, Result};

/// Stored INTEGER representation of `false`.
pub const STORAGE_BOOLEAN_FALSE: i64 = 0;

/// Stored INTEGER representation of `true`.
pub const STORAGE_BOOLEAN_TRUE: i64 = 1;

/// Read access to the current row of a result set, by column name.
///
/// Unknown column names fail loudly with [`DataError::UnknownColumn`].
pub trait ColumnRead {
    /// Returns the owned value of the named column in the current row.
    fn read(&self, column: &str) -> Result<Value>;
}

impl ColumnRead for Row<'_> {
    fn read(&self, column: &str) -> Result<Value> {
        match self.get::<_, Value>(column) {
            Ok(value) => Ok(value),
            Err(rusqlite::Error::InvalidColumnName(name)) => Err(DataError::UnknownColumn(name)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Converts a boolean to its stored INTEGER representation.
pub fn storage_boolean(value: bool) -> i64 {
    if value {
        STORAGE_BOOLEAN_TRUE
    } else {
        STORAGE_BOOLEAN_FALSE
    }
}

/// Reads a stored boolean. NULL and any integer other than 1 read as false.
pub fn get_boolean<R: ColumnRead + ?Sized>(row: &R, column: &str) -> Result<bool> {
    Ok(get_long(row, column)? == Some(STORAGE_BOOLEAN_TRUE))
}

/// Reads a possibly-NULL 32-bit integer column.
pub fn get_integer<R: ColumnRead + ?Sized>(row: &R, column: &str) -> Result<Option<i32>> {
    match get_long(row, column)? {
        None => Ok(None),
        Some(value) => i32::try_from(value).map(Some).map_err(|_| DataError::TypeMismatch {
            column: column.to_string(),
            expected: "a 32-bit INTEGER",
        }),
    }
}

/// Reads a possibly-NULL 64-bit integer column.
pub fn get_long<R: ColumnRead + ?Sized>(row: &R, column: &str) -> Result<Option<i64>> {
    match row.read(column)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        _ => Err(DataError::TypeMismatch {
            column: column.to_string(),
            expected: "an INTEGER",
        }),
    }
}

/// Reads a possibly-NULL text column.
pub fn get_text<R: ColumnRead + ?Sized>(row: &R, column: &str) -> Result<Option<String>> {
    match row.read(column)? {
        Value::Null => Ok(None),
        Value::Text(value) => Ok(Some(value)),
        _ => Err(DataError::TypeMismatch {
            column: column.to_string(),
            expected: "TEXT",
        }),
    }
}

/// Whether any of the named columns is NULL in the current row.
pub fn is_any_null<R: ColumnRead + ?Sized>(row: &R, columns: &[&str]) -> Result<bool> {
    for column in columns {
        if matches!(row.read(column)?, Value::Null) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Reads a millisecond-epoch column as a formatted local date.
pub fn formatted_date<R: ColumnRead + ?Sized>(row: &R, column: &str) -> Result<Option<String>> {
    read_local(row, column).map(|value| value.map(format_as_date))
}

/// Reads a millisecond-epoch column as a formatted local time.
pub fn formatted_time<R: ColumnRead + ?Sized>(row: &R, column: &str) -> Result<Option<String>> {
    read_local(row, column).map(|value| value.map(format_as_time))
}

/// Reads a millisecond-epoch column as a formatted local date and time.
pub fn formatted_date_time<R: ColumnRead + ?Sized>(
    row: &R,
    column: &str,
) -> Result<Option<String>> {
    read_local(row, column).map(|value| value.map(format_as_date_time))
}

fn read_local<R: ColumnRead + ?Sized>(row: &R, column: &str) -> Result<Option<DateTime<Local>>> {
    match get_long(row, column)? {
        None => Ok(None),
        Some(millis) => local_from_millis(millis).map(Some),
    }
}

fn local_from_millis(millis: i64) -> Result<DateTime<Local>> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .ok_or(DataError::InvalidTimestamp(millis))
}

/// Formats a local date-time as its date component.
pub fn format_as_date(value: DateTime<Local>) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// Formats a local date-time as its time component.
pub fn format_as_time(value: DateTime<Local>) -> String {
    value.format("%H:%M:%S").to_string()
}

/// Formats a local date-time with both components.
pub fn format_as_date_time(value: DateTime<Local>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Renders a live row as a single `title|col=value|…` line.
///
/// NULL cells render as `NULL`; cells that cannot be read render as `???`.
pub fn stringify_row(title: &str, row: &Row<'_>) -> String {
    let statement = row.as_ref();
    let mut dump = String::from(title);
    for (i, name) in statement.column_names().iter().enumerate() {
        dump.push('|');
        dump.push_str(name);
        dump.push('=');
        match row.get_ref(i) {
            Ok(ValueRef::Null) => dump.push_str("NULL"),
            Ok(ValueRef::Integer(value)) => dump.push_str(&value.to_string()),
            Ok(ValueRef::Real(value)) => dump.push_str(&value.to_string()),
            Ok(ValueRef::Text(value)) => dump.push_str(&String::from_utf8_lossy(value)),
            Ok(ValueRef::Blob(value)) => dump.push_str(&format!("<{} bytes>", value.len())),
            Err(_) => dump.push_str("???"),
        }
    }
    dump
}

/// Emits a [`stringify_row`] line at trace level.
pub fn trace_row(title: &str, row: &Row<'_>) {
    trace!("{}", stringify_row(title, row));
}

/// Renders every remaining row of a result stream, one line per row, with
/// the zero-based row position appended to the title
/// (`title:0|col=value|…`).
///
/// Consumes the stream — a live result cannot rewind, so re-run the query
/// to read the rows afterwards.
pub fn stringify_rows(title: &str, rows: &mut Rows<'_>) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    while let Some(row) = rows.next()? {
        lines.push(stringify_row(&format!("{title}:{}", lines.len()), row));
    }
    Ok(lines)
}

/// Emits one [`stringify_rows`] line per row at trace level.
///
/// When trace logging is disabled the stream is left untouched.
pub fn trace_rows(title: &str, rows: &mut Rows<'_>) -> Result<()> {
    if !tracing::enabled!(Level::TRACE) {
        return Ok(());
    }
    for line in stringify_rows(title, rows)? {
        trace!("{line}");
    }
    Ok(())
}
