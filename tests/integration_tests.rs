//! Integration tests for the sqlite-datakit crate.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rusqlite::Connection;
use sqlite_datakit::{
    COLUMN_TYPE_INTEGER, COLUMN_TYPE_TEXT, DataError, Query, Result, SchemaDelegate,
    SchemaManager, Table, get_boolean, get_long, get_text, storage_boolean, stored_version,
    upgrade_includes,
};

/// Delegate building a small people/cities schema, recording the order of
/// lifecycle calls and optionally failing at the end of a named step.
struct AppSchema {
    log: Rc<RefCell<Vec<&'static str>>>,
    fail_during: Option<&'static str>,
}

impl AppSchema {
    fn new(log: Rc<RefCell<Vec<&'static str>>>) -> Self {
        Self {
            log,
            fail_during: None,
        }
    }

    fn failing(log: Rc<RefCell<Vec<&'static str>>>, step: &'static str) -> Self {
        Self {
            log,
            fail_during: Some(step),
        }
    }

    fn fail_if(&self, step: &'static str) -> Result<()> {
        if self.fail_during == Some(step) {
            return Err(rusqlite::Error::QueryReturnedNoRows.into());
        }
        Ok(())
    }
}

impl SchemaDelegate for AppSchema {
    fn create_structures(&self, conn: &Connection) -> Result<()> {
        self.log.borrow_mut().push("create");

        conn.execute_batch(
            &Table::new("cities")
                .with_id_column("_id")
                .with_column("name", COLUMN_TYPE_TEXT)
                .sql(),
        )?;

        let people = Table::new("people");
        let by_city = people.add_index("idx_people_city", "city_id");
        conn.execute_batch(
            &people
                .with_id_column("_id")
                .with_column("name", COLUMN_TYPE_TEXT)
                .with_column("city_id", COLUMN_TYPE_INTEGER)
                .with_column("active", COLUMN_TYPE_INTEGER)
                .sql(),
        )?;
        conn.execute_batch(by_city.sql())?;

        self.fail_if("create")
    }

    fn populate_reference_data(&self, conn: &Connection) -> Result<()> {
        self.log.borrow_mut().push("reference");
        conn.execute("INSERT INTO cities (name) VALUES ('Oslo'), ('Bergen')", [])?;
        self.fail_if("reference")
    }

    fn seed_transactional_data(&self, conn: &Connection) -> Result<()> {
        self.log.borrow_mut().push("seed");
        conn.execute(
            "INSERT INTO people (name, city_id, active) VALUES ('ada', 1, ?1)",
            [storage_boolean(true)],
        )?;
        self.fail_if("seed")
    }

    fn upgrade(&self, conn: &Connection, old_version: i32, new_version: i32) -> Result<()> {
        self.log.borrow_mut().push("upgrade");
        if upgrade_includes(2, old_version, new_version) {
            conn.execute_batch("ALTER TABLE people ADD COLUMN email TEXT;")?;
            self.log.borrow_mut().push("v2");
        }
        if upgrade_includes(3, old_version, new_version) {
            conn.execute_batch(
                &Table::new("visits")
                    .with_id_column("_id")
                    .with_column("person_id", COLUMN_TYPE_INTEGER)
                    .with_column("at", COLUMN_TYPE_INTEGER)
                    .sql(),
            )?;
            self.log.borrow_mut().push("v3");
        }
        self.fail_if("upgrade")
    }
}

fn call_log() -> Rc<RefCell<Vec<&'static str>>> {
    Rc::new(RefCell::new(Vec::new()))
}

fn table_exists(conn: &Connection, name: &str) -> bool {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [name],
            |row| row.get(0),
        )
        .unwrap();
    count > 0
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn test_create_runs_steps_in_order_with_seeding() {
    let conn = Connection::open_in_memory().unwrap();
    let log = call_log();
    let manager = SchemaManager::new(1, true, AppSchema::new(log.clone()));

    manager.on_create(&conn).unwrap();

    assert_eq!(*log.borrow(), ["create", "reference", "seed"]);
    assert_eq!(row_count(&conn, "cities"), 2);
    assert_eq!(row_count(&conn, "people"), 1);
}

#[test]
fn test_create_skips_seeding_when_disabled() {
    let conn = Connection::open_in_memory().unwrap();
    let log = call_log();
    let manager = SchemaManager::new(1, false, AppSchema::new(log.clone()));

    manager.on_create(&conn).unwrap();

    assert_eq!(*log.borrow(), ["create", "reference"]);
    assert_eq!(row_count(&conn, "people"), 0);
}

#[test]
fn test_create_failure_rolls_back_all_steps() {
    let conn = Connection::open_in_memory().unwrap();
    let log = call_log();
    let manager = SchemaManager::new(1, true, AppSchema::failing(log.clone(), "reference"));

    let err = manager.on_create(&conn).unwrap_err();
    assert!(matches!(err, DataError::Initialization(_)));

    // The whole transition is one transaction: the tables created before the
    // failing step are gone too, and seeding never ran.
    assert_eq!(*log.borrow(), ["create", "reference"]);
    assert!(!table_exists(&conn, "cities"));
    assert!(!table_exists(&conn, "people"));
}

#[test]
fn test_create_inside_an_active_transaction_uses_it() {
    let conn = Connection::open_in_memory().unwrap();
    let log = call_log();
    let manager = SchemaManager::new(1, true, AppSchema::new(log));

    let tx = conn.unchecked_transaction().unwrap();
    manager.on_create(&tx).unwrap();
    tx.commit().unwrap();

    assert_eq!(row_count(&conn, "cities"), 2);
}

#[test]
fn test_create_inside_an_active_transaction_leaves_outcome_to_caller() {
    let conn = Connection::open_in_memory().unwrap();
    let log = call_log();
    let manager = SchemaManager::new(1, true, AppSchema::new(log));

    let tx = conn.unchecked_transaction().unwrap();
    manager.on_create(&tx).unwrap();
    drop(tx); // caller rolls back

    assert!(!table_exists(&conn, "cities"));
}

// =============================================================================
// Versioned open
// =============================================================================

#[test]
fn test_open_on_fresh_store_creates_and_stamps_version() {
    let conn = Connection::open_in_memory().unwrap();
    let log = call_log();
    let manager = SchemaManager::new(1, false, AppSchema::new(log.clone()));

    manager.open(&conn).unwrap();

    assert_eq!(stored_version(&conn).unwrap(), 1);
    assert_eq!(*log.borrow(), ["create", "reference"]);
}

#[test]
fn test_open_at_current_version_is_a_no_op() {
    let conn = Connection::open_in_memory().unwrap();
    let first = SchemaManager::new(1, false, AppSchema::new(call_log()));
    first.open(&conn).unwrap();

    let log = call_log();
    let again = SchemaManager::new(1, false, AppSchema::new(log.clone()));
    again.open(&conn).unwrap();

    assert!(log.borrow().is_empty());
    assert_eq!(row_count(&conn, "cities"), 2);
}

#[test]
fn test_open_upgrades_across_skipped_versions() {
    let conn = Connection::open_in_memory().unwrap();
    SchemaManager::new(1, false, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();

    let log = call_log();
    SchemaManager::new(3, false, AppSchema::new(log.clone()))
        .open(&conn)
        .unwrap();

    // One upgrade call applied both the v2 and v3 changes, in version order.
    assert_eq!(*log.borrow(), ["upgrade", "v2", "v3"]);
    assert_eq!(stored_version(&conn).unwrap(), 3);
    assert!(table_exists(&conn, "visits"));
    conn.execute(
        "INSERT INTO people (name, city_id, active, email) VALUES ('bo', 2, 0, 'bo@x')",
        [],
    )
    .unwrap();
}

/// Counts transaction commits on the connection via the SQLite commit hook.
fn count_commits(conn: &Connection) -> Arc<AtomicUsize> {
    let commits = Arc::new(AtomicUsize::new(0));
    let counter = commits.clone();
    conn.commit_hook(Some(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        false
    }));
    commits
}

#[test]
fn test_open_stamps_version_in_the_creation_transaction() {
    let conn = Connection::open_in_memory().unwrap();
    let commits = count_commits(&conn);

    SchemaManager::new(1, true, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();

    // One commit covers the creation steps and the version stamp; a store
    // can never be observed created but unstamped.
    assert_eq!(commits.load(Ordering::SeqCst), 1);
    assert_eq!(stored_version(&conn).unwrap(), 1);
}

#[test]
fn test_open_stamps_version_in_the_upgrade_transaction() {
    let conn = Connection::open_in_memory().unwrap();
    SchemaManager::new(1, false, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();

    let commits = count_commits(&conn);
    SchemaManager::new(3, false, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();

    assert_eq!(commits.load(Ordering::SeqCst), 1);
    assert_eq!(stored_version(&conn).unwrap(), 3);
}

#[test]
fn test_interrupted_open_reopens_without_duplicating_reference_data() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SchemaManager::new(1, true, AppSchema::failing(call_log(), "seed"))
        .open(&conn)
        .unwrap_err();
    assert!(matches!(err, DataError::Initialization(_)));
    assert_eq!(stored_version(&conn).unwrap(), 0);
    assert!(!table_exists(&conn, "cities"));

    SchemaManager::new(1, true, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();
    assert_eq!(stored_version(&conn).unwrap(), 1);
    assert_eq!(row_count(&conn, "cities"), 2);
}

#[test]
fn test_open_refuses_version_regression() {
    let conn = Connection::open_in_memory().unwrap();
    SchemaManager::new(3, false, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();

    let err = SchemaManager::new(1, false, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::VersionRegression {
            on_disk: 3,
            requested: 1
        }
    ));
}

#[test]
fn test_failed_upgrade_rolls_back_and_keeps_old_version() {
    let conn = Connection::open_in_memory().unwrap();
    SchemaManager::new(1, false, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();

    let err = SchemaManager::new(2, false, AppSchema::failing(call_log(), "upgrade"))
        .open(&conn)
        .unwrap_err();
    assert!(matches!(err, DataError::Upgrade { from: 1, to: 2, .. }));

    assert_eq!(stored_version(&conn).unwrap(), 1);
    // The v2 column addition was rolled back with the transaction.
    assert!(
        conn.execute("INSERT INTO people (name, city_id, active, email) VALUES ('x', 1, 0, 'e')", [])
            .is_err()
    );
}

#[test]
fn test_open_persists_across_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");

    {
        let conn = Connection::open(&path).unwrap();
        SchemaManager::new(1, true, AppSchema::new(call_log()))
            .open(&conn)
            .unwrap();
    }

    let conn = Connection::open(&path).unwrap();
    let log = call_log();
    SchemaManager::new(1, true, AppSchema::new(log.clone()))
        .open(&conn)
        .unwrap();

    assert!(log.borrow().is_empty());
    assert_eq!(row_count(&conn, "people"), 1);
}

// =============================================================================
// Queries over a managed store
// =============================================================================

#[test]
fn test_query_built_statement_runs_over_seeded_data() {
    let conn = Connection::open_in_memory().unwrap();
    SchemaManager::new(1, true, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();

    let sql = Query::new()
        .select(&["people.name", "cities.name city", "people.active"])
        .from("people")
        .inner_join("cities")
        .on("people.city_id", "cities._id")
        .where_equal_to_text("cities.name", "Oslo")
        .order_by("people.name", true)
        .sql();

    let mut stmt = conn.prepare(&sql).unwrap();
    let mut rows = stmt.query([]).unwrap();
    let row = rows.next().unwrap().unwrap();
    assert_eq!(get_text(row, "name").unwrap(), Some("ada".to_string()));
    assert_eq!(get_text(row, "city").unwrap(), Some("Oslo".to_string()));
    assert!(get_boolean(row, "active").unwrap());
    assert!(rows.next().unwrap().is_none());
}

#[test]
fn test_count_query_with_subquery_join() {
    let conn = Connection::open_in_memory().unwrap();
    SchemaManager::new(1, true, AppSchema::new(call_log()))
        .open(&conn)
        .unwrap();
    conn.execute(
        "INSERT INTO people (name, city_id, active) VALUES ('bo', 1, 1), ('cy', 2, 0)",
        [],
    )
    .unwrap();

    let active = Query::new()
        .select(&["city_id"])
        .from("people")
        .where_equal_to("active", "1");
    let sql = Query::new()
        .count("n")
        .from("cities")
        .inner_join_query(active, "a")
        .on("cities._id", "a.city_id")
        .sql();

    let mut stmt = conn.prepare(&sql).unwrap();
    let mut rows = stmt.query([]).unwrap();
    let row = rows.next().unwrap().unwrap();
    assert_eq!(get_long(row, "n").unwrap(), Some(2));
}
