//! Error types for builder and lifecycle operations.
//!
//! Provides a unified error type covering database access, typed row
//! extraction, and schema lifecycle failures.

use thiserror::Error;

/// Errors that can occur during data access and schema lifecycle operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A row was asked for a column name not present in its result shape.
    #[error("{0} is not a valid column name for this row")]
    UnknownColumn(String),

    /// A column held a storage class other than the one requested.
    #[error("column {column} does not hold {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    /// A millisecond epoch value could not be mapped to a local date-time.
    #[error("{0} is not a representable millisecond timestamp")]
    InvalidTimestamp(i64),

    /// A schema creation step failed; the creation transaction was rolled back.
    #[error("unable to create database structures")]
    Initialization(#[source] Box<DataError>),

    /// The upgrade routine failed; the upgrade transaction was rolled back.
    #[error("unable to upgrade database from version {from} to {to}")]
    Upgrade {
        from: i32,
        to: i32,
        #[source]
        source: Box<DataError>,
    },

    /// The store is already at a newer version than the one requested.
    #[error("store is at version {on_disk}, newer than requested version {requested}")]
    VersionRegression { on_disk: i32, requested: i32 },
}

/// Convenience alias for results with [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;
