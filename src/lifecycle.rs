//! Schema lifecycle management: first-time creation and versioned upgrades.
//!
//! Provides [`SchemaManager`], which sequences the creation and upgrade of a
//! store's structure inside single transactions, delegating the actual
//! schema and content mutation to a [`SchemaDelegate`] supplied by the
//! application. The manager owns only sequencing and transaction
//! boundaries, never the content of the delegate operations.
//!
//! Failures in delegate operations roll the enclosing transaction back and
//! are returned as typed errors ([`DataError::Initialization`] /
//! [`DataError::Upgrade`]) after being logged, letting the hosting
//! application decide whether an initialization fault is fatal.
//!
//! # Example
//!
//! ```no_run
//! use rusqlite::Connection;
//! use sqlite_datakit::{Result, SchemaDelegate, SchemaManager, Table, COLUMN_TYPE_TEXT};
//!
//! struct AppSchema;
//!
//! impl SchemaDelegate for AppSchema {
//!     fn create_structures(&self, conn: &Connection) -> Result<()> {
//!         let sql = Table::new("people")
//!             .with_id_column("_id")
//!             .with_column("name", COLUMN_TYPE_TEXT)
//!             .sql();
//!         conn.execute_batch(&sql)?;
//!         Ok(())
//!     }
//!
//!     fn populate_reference_data(&self, conn: &Connection) -> Result<()> {
//!         conn.execute("INSERT INTO people (name) VALUES ('admin')", [])?;
//!         Ok(())
//!     }
//!
//!     fn seed_transactional_data(&self, _conn: &Connection) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     fn upgrade(&self, _conn: &Connection, _old: i32, _new: i32) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let conn = Connection::open("app.db").unwrap();
//! let manager = SchemaManager::new(1, false, AppSchema);
//! manager.open(&conn).unwrap();
//! ```

use rusqlite::Connection;
use tracing::{error, info};

use crate::error::{DataError, Result};

/// Store-specific schema operations plugged into a [`SchemaManager`].
///
/// The manager calls [`create_structures`](Self::create_structures),
/// [`populate_reference_data`](Self::populate_reference_data), and
/// (when seeding is enabled)
/// [`seed_transactional_data`](Self::seed_transactional_data) in that order
/// on first creation, and [`upgrade`](Self::upgrade) with both version
/// numbers when the on-disk version is older than the requested one. All
/// operations run inside a transaction owned by the manager and should not
/// begin or end transactions of their own.
pub trait SchemaDelegate {
    /// Creates the store's tables and indexes. Called with an open
    /// transaction; DDL should use `IF NOT EXISTS` forms.
    fn create_structures(&self, conn: &Connection) -> Result<()>;

    /// Populates static lookup content, unconditionally at creation time.
    fn populate_reference_data(&self, conn: &Connection) -> Result<()>;

    /// Populates optional sample content for non-production builds. Only
    /// called when the manager was constructed with seeding enabled.
    fn seed_transactional_data(&self, conn: &Connection) -> Result<()>;

    /// Applies every structural change introduced after `old_version` up to
    /// and including `new_version`. Use [`upgrade_includes`] to test
    /// whether a change tagged with a given version applies.
    fn upgrade(&self, conn: &Connection, old_version: i32, new_version: i32) -> Result<()>;
}

/// Orchestrates creation and upgrade of a store's structure.
///
/// One instance per store, bound to the logical schema version the
/// application requires. [`open`](Self::open) drives the whole lifecycle
/// from the stored `user_version`; [`on_create`](Self::on_create) and
/// [`on_upgrade`](Self::on_upgrade) are the individual transitions for
/// hosts that do their own version detection.
pub struct SchemaManager<D> {
    version: i32,
    seed_transactional_data: bool,
    delegate: D,
}

impl<D: SchemaDelegate> SchemaManager<D> {
    /// Creates a manager requiring the given logical schema version.
    ///
    /// When `seed_transactional_data` is true, first-time creation also
    /// runs the delegate's seeding step after reference data is populated.
    ///
    /// # Panics
    ///
    /// Panics if `version` is less than 1.
    pub fn new(version: i32, seed_transactional_data: bool, delegate: D) -> Self {
        assert!(version >= 1, "schema version must be at least 1");
        Self {
            version,
            seed_transactional_data,
            delegate,
        }
    }

    /// The logical schema version this manager requires.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Brings the store to the required version, creating or upgrading as
    /// needed.
    ///
    /// Reads the stored `user_version`: 0 means the structure has never
    /// been created (the creation steps run); a lower version than required
    /// means the delegate's upgrade routine runs; an equal version is a
    /// no-op. The version stamp is written inside the same transaction as
    /// the transition, so the two commit together — an interrupted open can
    /// never leave the store created but unstamped.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::VersionRegression`] if the store is already at
    /// a newer version than requested, or the failure of the underlying
    /// transition.
    pub fn open(&self, conn: &Connection) -> Result<()> {
        let on_disk = stored_version(conn)?;
        if on_disk == self.version {
            return Ok(());
        }
        if on_disk > self.version {
            return Err(DataError::VersionRegression {
                on_disk,
                requested: self.version,
            });
        }

        if on_disk == 0 {
            self.run_create(conn, true)
        } else {
            self.run_upgrade(conn, on_disk, self.version, true)
        }
    }

    /// Runs first-time creation: create structures, populate reference
    /// data, and (if enabled) seed transactional data, in that order.
    ///
    /// If the connection is not already inside a transaction, the three
    /// steps run in one opened here; either all of them commit or none do.
    /// If a transaction is already active (SQLite disallows nested BEGIN),
    /// the steps run directly on it and the caller owns the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Initialization`] carrying the step's fault; the
    /// creation transaction is rolled back first.
    pub fn on_create(&self, conn: &Connection) -> Result<()> {
        self.run_create(conn, false)
    }

    fn run_create(&self, conn: &Connection, stamp: bool) -> Result<()> {
        let outcome = if conn.is_autocommit() {
            self.initialize_in_transaction(conn, stamp)
        } else {
            self.initialize_on_current_transaction(conn, stamp)
        };
        outcome.map_err(|e| {
            error!("unable to create database structures: {e}");
            DataError::Initialization(Box::new(e))
        })
    }

    fn initialize_in_transaction(&self, conn: &Connection, stamp: bool) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        self.initialize(&tx)?;
        if stamp {
            set_stored_version(&tx, self.version)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn initialize_on_current_transaction(&self, conn: &Connection, stamp: bool) -> Result<()> {
        self.initialize(conn)?;
        if stamp {
            set_stored_version(conn, self.version)?;
        }
        Ok(())
    }

    fn initialize(&self, conn: &Connection) -> Result<()> {
        info!("creating database structures");
        self.delegate.create_structures(conn)?;
        info!("populating reference data");
        self.delegate.populate_reference_data(conn)?;
        if self.seed_transactional_data {
            info!("seeding transactional structures with data");
            self.delegate.seed_transactional_data(conn)?;
        }
        Ok(())
    }

    /// Runs the delegate's upgrade routine from `old_version` to
    /// `new_version` inside a transaction opened here.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Upgrade`] carrying both versions and the
    /// routine's fault; the upgrade transaction is rolled back first.
    pub fn on_upgrade(&self, conn: &Connection, old_version: i32, new_version: i32) -> Result<()> {
        self.run_upgrade(conn, old_version, new_version, false)
    }

    fn run_upgrade(
        &self,
        conn: &Connection,
        old_version: i32,
        new_version: i32,
        stamp: bool,
    ) -> Result<()> {
        self.upgrade_in_transaction(conn, old_version, new_version, stamp)
            .map_err(|e| {
                error!("unable to upgrade database from {old_version} to {new_version}: {e}");
                DataError::Upgrade {
                    from: old_version,
                    to: new_version,
                    source: Box::new(e),
                }
            })
    }

    fn upgrade_in_transaction(
        &self,
        conn: &Connection,
        old_version: i32,
        new_version: i32,
        stamp: bool,
    ) -> Result<()> {
        let tx = conn.unchecked_transaction()?;
        self.delegate.upgrade(&tx, old_version, new_version)?;
        if stamp {
            set_stored_version(&tx, new_version)?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Whether a structural change tagged with `change_version` applies to an
/// upgrade from `old_version` to `new_version`.
///
/// True iff `old_version < change_version <= new_version`. Changes at or
/// below the old version were already applied; this makes upgrades
/// composable across skipped versions — upgrading from 1 directly to 4
/// applies every change tagged 2, 3, and 4 exactly once.
pub fn upgrade_includes(change_version: i32, old_version: i32, new_version: i32) -> bool {
    change_version > old_version && change_version <= new_version
}

/// Reads the store's logical version (`PRAGMA user_version`).
pub fn stored_version(conn: &Connection) -> Result<i32> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

fn set_stored_version(conn: &Connection, version: i32) -> Result<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}
