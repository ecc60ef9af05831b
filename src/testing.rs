//! Test doubles for data access components.
//!
//! [`RowArray`] stands in for a positioned read-only result cursor, backed
//! by an in-memory array of value rows. It implements
//! [`ColumnRead`](crate::ColumnRead), so the typed accessors in this crate
//! run unchanged against it — useful for exercising row-consuming code
//! without a live result set.

use rusqlite::types::Value;

use crate::error::{DataError, Result};
use crate::rows::ColumnRead;

/// In-memory stand-in for a positioned result cursor.
///
/// Holds an ordered column list and rows of values. The position starts
/// before the first row; move it with the `move_*` methods before reading.
///
/// # Examples
///
/// ```
/// use rusqlite::types::Value;
/// use sqlite_datakit::testing::RowArray;
/// use sqlite_datakit::{get_boolean, get_text};
///
/// let mut rows = RowArray::new(
///     &["name", "active"],
///     vec![
///         vec![Value::Text("ada".into()), Value::Integer(1)],
///         vec![Value::Null, Value::Integer(0)],
///     ],
/// );
///
/// assert!(rows.move_to_next());
/// assert_eq!(get_text(&rows, "name").unwrap(), Some("ada".to_string()));
/// assert!(get_boolean(&rows, "active").unwrap());
///
/// assert!(rows.move_to_next());
/// assert_eq!(get_text(&rows, "name").unwrap(), None);
///
/// assert!(!rows.move_to_next());
/// assert!(rows.is_after_last());
/// ```
#[derive(Debug)]
pub struct RowArray {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: isize,
    closed: bool,
}

impl RowArray {
    /// Creates a row array over the given columns and rows.
    ///
    /// # Panics
    ///
    /// Panics if any row's length differs from the column count.
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        for row in &rows {
            assert_eq!(
                row.len(),
                columns.len(),
                "every row must have one value per column"
            );
        }
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            position: -1,
            closed: false,
        }
    }

    /// Creates `count` rows holding only an `_id` column valued 1..=count.
    pub fn with_identity_rows(count: usize) -> Self {
        let rows = (1..=count as i64).map(|id| vec![Value::Integer(id)]).collect();
        Self::new(&["_id"], rows)
    }

    /// Number of rows.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names, in declaration order.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Index of the named column, if present.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Index of the named column, or [`DataError::UnknownColumn`].
    pub fn column_index_or_err(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| DataError::UnknownColumn(column.to_string()))
    }

    /// Current position: -1 before the first row, `count()` after the last.
    pub fn position(&self) -> isize {
        self.position
    }

    /// Moves to an absolute position, clamped to the range from
    /// before-first to after-last. Returns true iff the final position is
    /// a data row.
    pub fn move_to_position(&mut self, position: isize) -> bool {
        let count = self.rows.len() as isize;
        self.position = position.clamp(-1, count);
        self.position >= 0 && self.position < count
    }

    /// Moves to the first row.
    pub fn move_to_first(&mut self) -> bool {
        self.move_to_position(0)
    }

    /// Moves to the last row.
    pub fn move_to_last(&mut self) -> bool {
        self.move_to_position(self.rows.len() as isize - 1)
    }

    /// Advances one row. Returns false once past the last row.
    pub fn move_to_next(&mut self) -> bool {
        self.move_to_position(self.position + 1)
    }

    /// Retreats one row. Returns false once before the first row.
    pub fn move_to_previous(&mut self) -> bool {
        self.move_to_position(self.position - 1)
    }

    /// Moves by a relative offset.
    pub fn move_by(&mut self, offset: isize) -> bool {
        self.move_to_position(self.position + offset)
    }

    /// Whether the position is before the first row.
    pub fn is_before_first(&self) -> bool {
        self.position < 0
    }

    /// Whether the position is on the first row.
    pub fn is_first(&self) -> bool {
        self.position == 0 && !self.rows.is_empty()
    }

    /// Whether the position is on the last row.
    pub fn is_last(&self) -> bool {
        !self.rows.is_empty() && self.position == self.rows.len() as isize - 1
    }

    /// Whether the position is past the last row.
    pub fn is_after_last(&self) -> bool {
        self.position >= self.rows.len() as isize
    }

    /// Value at the given column index in the current row.
    ///
    /// # Panics
    ///
    /// Panics if not positioned on a data row or the index is out of range.
    pub fn value_at(&self, index: usize) -> &Value {
        &self.current_row()[index]
    }

    /// Whether the value at the given column index is NULL.
    pub fn is_null_at(&self, index: usize) -> bool {
        matches!(self.value_at(index), Value::Null)
    }

    /// Integer value at the given column index.
    ///
    /// # Panics
    ///
    /// Panics if the cell does not hold an INTEGER.
    pub fn i64_at(&self, index: usize) -> i64 {
        match self.value_at(index) {
            Value::Integer(value) => *value,
            other => panic!("column {index} holds {other:?}, not an INTEGER"),
        }
    }

    /// Real value at the given column index.
    ///
    /// # Panics
    ///
    /// Panics if the cell does not hold a REAL.
    pub fn f64_at(&self, index: usize) -> f64 {
        match self.value_at(index) {
            Value::Real(value) => *value,
            other => panic!("column {index} holds {other:?}, not a REAL"),
        }
    }

    /// Text value at the given column index.
    ///
    /// # Panics
    ///
    /// Panics if the cell does not hold TEXT.
    pub fn str_at(&self, index: usize) -> &str {
        match self.value_at(index) {
            Value::Text(value) => value,
            other => panic!("column {index} holds {other:?}, not TEXT"),
        }
    }

    /// Marks the row array closed.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn current_row(&self) -> &[Value] {
        assert!(
            self.position >= 0 && (self.position as usize) < self.rows.len(),
            "row array is not positioned on a data row"
        );
        &self.rows[self.position as usize]
    }
}

impl ColumnRead for RowArray {
    fn read(&self, column: &str) -> Result<Value> {
        let index = self.column_index_or_err(column)?;
        Ok(self.current_row()[index].clone())
    }
}
