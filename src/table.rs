//! Fluent DDL generation for SQLite tables and indexes.
//!
//! Provides [`Table`] for accumulating column definitions into a
//! `CREATE TABLE IF NOT EXISTS` statement, and [`Index`] for independently
//! renderable index DDL scoped to the owning table. All creation statements
//! use `IF NOT EXISTS`, so they are safe to execute against an
//! already-initialized store.
//!
//! # Example
//!
//! ```
//! use sqlite_datakit::{Table, COLUMN_TYPE_TEXT};
//!
//! let table = Table::new("people");
//! let by_name = table.add_index("idx_people_name", "name");
//!
//! let sql = table
//!     .with_id_column("_id")
//!     .with_column("name", COLUMN_TYPE_TEXT)
//!     .sql();
//!
//! assert_eq!(
//!     sql,
//!     "CREATE TABLE IF NOT EXISTS people \
//!      (_id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT); "
//! );
//! assert_eq!(
//!     by_name.sql(),
//!     "CREATE INDEX IF NOT EXISTS idx_people_name ON people (name); "
//! );
//! ```

/// Column type token for integer columns.
pub const COLUMN_TYPE_INTEGER: &str = "INTEGER";

/// Column type token for text columns.
pub const COLUMN_TYPE_TEXT: &str = "TEXT";

const COLUMN_TYPE_ID: &str = "INTEGER PRIMARY KEY AUTOINCREMENT";

/// Builder for `CREATE TABLE IF NOT EXISTS` statement text.
///
/// The table name is fixed at construction. Columns appear in the output in
/// call order. [`sql`](Self::sql) appends the closing parenthesis and
/// statement terminator and consumes the builder, so a statement cannot be
/// rendered twice.
#[derive(Debug)]
pub struct Table {
    name: String,
    sql: String,
    columns_started: bool,
}

impl Table {
    /// Starts a table definition for the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let sql = format!("CREATE TABLE IF NOT EXISTS {name}");
        Self {
            name,
            sql,
            columns_started: false,
        }
    }

    /// Appends the table's auto-incrementing unique identifier column.
    pub fn with_id_column(mut self, column: &str) -> Self {
        self.prefix_column();
        self.sql.push_str(column);
        self.sql.push(' ');
        self.sql.push_str(COLUMN_TYPE_ID);
        self
    }

    /// Appends a column with a caller-supplied type token.
    ///
    /// No validation is performed; the caller supplies
    /// [`COLUMN_TYPE_INTEGER`], [`COLUMN_TYPE_TEXT`], or any other
    /// dialect-valid type string.
    pub fn with_column(mut self, column: &str, column_type: &str) -> Self {
        self.prefix_column();
        self.sql.push_str(column);
        self.sql.push(' ');
        self.sql.push_str(column_type);
        self
    }

    fn prefix_column(&mut self) {
        if self.columns_started {
            self.sql.push_str(", ");
        } else {
            self.sql.push_str(" (");
            self.columns_started = true;
        }
    }

    /// Creates a single-column index on this table.
    pub fn add_index(&self, index_name: &str, column: &str) -> Index {
        Index {
            sql: format!(
                "CREATE INDEX IF NOT EXISTS {index_name} ON {} ({column}); ",
                self.name
            ),
        }
    }

    /// Creates a multi-column index on this table, optionally unique.
    pub fn add_multi_column_index(
        &self,
        index_name: &str,
        unique: bool,
        columns: &[&str],
    ) -> Index {
        let unique_keyword = if unique { "UNIQUE " } else { "" };
        Index {
            sql: format!(
                "CREATE {unique_keyword}INDEX IF NOT EXISTS {index_name} ON {} ({}); ",
                self.name,
                columns.join(", ")
            ),
        }
    }

    /// Appends the closing parenthesis and statement terminator and returns
    /// the final DDL text, consuming the builder.
    pub fn sql(mut self) -> String {
        self.sql.push_str("); ");
        self.sql
    }
}

/// Index DDL for a table, immutable once constructed.
#[derive(Debug)]
pub struct Index {
    sql: String,
}

impl Index {
    /// Returns the index creation statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }
}
