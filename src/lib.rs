//! Fluent SQL builders, typed row access, and schema lifecycle management
//! for SQLite.
//!
//! This crate replaces ad-hoc SQL string concatenation with chainable
//! builders and manages a database's structural lifecycle — first-time
//! creation and versioned upgrades — with transactional guarantees. Output
//! targets a single fixed dialect (SQLite, via `rusqlite`).
//!
//! # Architecture
//!
//! - **`query`** — [`Query`], a fluent builder for SELECT statement text
//! - **`table`** — [`Table`] and [`Index`], fluent builders for DDL text
//! - **`lifecycle`** — [`SchemaManager`] sequencing creation/upgrade steps
//!   inside single transactions, with the store-specific operations
//!   supplied through a [`SchemaDelegate`]
//! - **`rows`** — typed extraction of possibly-NULL scalars and formatted
//!   date/time strings from result rows
//! - **`testing`** — an in-memory row-array double implementing the same
//!   read contract as a live row
//!
//! The lifecycle manager feeds the table builder (DDL); application query
//! code feeds the statement builder. The two paths do not interact.
//!
//! # Quick start — lifecycle
//!
//! ```no_run
//! use rusqlite::Connection;
//! use sqlite_datakit::{Result, SchemaDelegate, SchemaManager, Table, COLUMN_TYPE_TEXT};
//!
//! struct AppSchema;
//!
//! impl SchemaDelegate for AppSchema {
//!     fn create_structures(&self, conn: &Connection) -> Result<()> {
//!         conn.execute_batch(
//!             &Table::new("notes")
//!                 .with_id_column("_id")
//!                 .with_column("body", COLUMN_TYPE_TEXT)
//!                 .sql(),
//!         )?;
//!         Ok(())
//!     }
//!     fn populate_reference_data(&self, _conn: &Connection) -> Result<()> { Ok(()) }
//!     fn seed_transactional_data(&self, _conn: &Connection) -> Result<()> { Ok(()) }
//!     fn upgrade(&self, _conn: &Connection, _old: i32, _new: i32) -> Result<()> { Ok(()) }
//! }
//!
//! let conn = Connection::open("app.db").unwrap();
//! SchemaManager::new(1, false, AppSchema).open(&conn).unwrap();
//! ```
//!
//! # Quick start — queries
//!
//! ```
//! use sqlite_datakit::Query;
//!
//! let sql = Query::new()
//!     .select(&["_id", "body"])
//!     .from("notes")
//!     .where_null("archived_at")
//!     .order_by("_id", false)
//!     .sql();
//! assert_eq!(
//!     sql,
//!     "SELECT _id, body FROM notes WHERE archived_at IS NULL ORDER BY _id DESC"
//! );
//! ```

mod error;
mod lifecycle;
mod query;
mod rows;
mod table;
pub mod testing;

pub use error::{DataError, Result};
pub use lifecycle::{SchemaDelegate, SchemaManager, stored_version, upgrade_includes};
pub use query::Query;
pub use rows::{
    ColumnRead, STORAGE_BOOLEAN_FALSE, STORAGE_BOOLEAN_TRUE, format_as_date, format_as_date_time,
    format_as_time, formatted_date, formatted_date_time, formatted_time, get_boolean, get_integer,
    get_long, get_text, is_any_null, storage_boolean, stringify_row, stringify_rows, trace_row,
    trace_rows,
};
pub use table::{COLUMN_TYPE_INTEGER, COLUMN_TYPE_TEXT, Index, Table};
