//! Integration tests for the database handle against a scripted in-memory
//! engine that records every schema call it sees.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use storeplan_core::{KeyPath, KeySpec, TableOptions};
use storeplan_db::{
    Connection, Database, DatabaseError, DatabaseInfo, SchemaTx, StorageEngine, UpgradeEvent,
    UpgradeHook,
};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Mock engine
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
enum MockError {
    #[error("table '{0}' already exists")]
    TableExists(String),
    #[error("no such table '{0}'")]
    NoSuchTable(String),
    #[error("requested version {requested} is below stored version {current}")]
    VersionTooLow { requested: u32, current: u32 },
    #[error("injected failure on '{0}'")]
    Injected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Table {
    key: Option<KeyPath>,
    autoincrement: bool,
}

#[derive(Debug, Clone, Default)]
struct StoredDb {
    version: u32,
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Default)]
struct EngineState {
    dbs: BTreeMap<String, StoredDb>,
    upgrades_run: usize,
    /// Chronological record of every committed schema call.
    applied: Vec<String>,
}

#[derive(Clone, Default)]
struct MockEngine {
    state: Arc<Mutex<EngineState>>,
    /// Table name that makes the schema transaction fail when touched.
    fail_on: Option<String>,
}

impl MockEngine {
    fn new() -> Self {
        Self::default()
    }

    fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::default()
        }
    }

    fn stored(&self, db: &str) -> Option<StoredDb> {
        self.state.lock().unwrap().dbs.get(db).cloned()
    }

    fn upgrades_run(&self) -> usize {
        self.state.lock().unwrap().upgrades_run
    }

    fn applied(&self) -> Vec<String> {
        self.state.lock().unwrap().applied.clone()
    }
}

struct MockTx {
    tables: BTreeMap<String, Table>,
    calls: Vec<String>,
    fail_on: Option<String>,
}

impl SchemaTx for MockTx {
    type Error = MockError;

    fn create_table(
        &mut self,
        name: &str,
        key_path: Option<&KeyPath>,
        autoincrement: bool,
    ) -> Result<(), MockError> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(MockError::Injected(name.to_string()));
        }
        if self.tables.contains_key(name) {
            return Err(MockError::TableExists(name.to_string()));
        }
        self.tables.insert(
            name.to_string(),
            Table {
                key: key_path.cloned(),
                autoincrement,
            },
        );
        self.calls.push(format!("add:{name}"));
        Ok(())
    }

    fn delete_table(&mut self, name: &str) -> Result<(), MockError> {
        if self.fail_on.as_deref() == Some(name) {
            return Err(MockError::Injected(name.to_string()));
        }
        if self.tables.remove(name).is_none() {
            return Err(MockError::NoSuchTable(name.to_string()));
        }
        self.calls.push(format!("drop:{name}"));
        Ok(())
    }
}

struct MockConnection {
    name: String,
    version: u32,
    open: bool,
}

impl Connection for MockConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn close(&mut self) {
        self.open = false;
    }
}

impl StorageEngine for MockEngine {
    type Connection = MockConnection;
    type Tx = MockTx;
    type Error = MockError;

    async fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: UpgradeHook<'_, MockTx, MockError>,
    ) -> Result<MockConnection, MockError> {
        let mut state = self.state.lock().unwrap();
        let current = state.dbs.get(name).map(|db| db.version).unwrap_or(0);
        if version < current {
            return Err(MockError::VersionTooLow {
                requested: version,
                current,
            });
        }

        if version > current {
            let mut tx = MockTx {
                tables: state
                    .dbs
                    .get(name)
                    .map(|db| db.tables.clone())
                    .unwrap_or_default(),
                calls: Vec::new(),
                fail_on: self.fail_on.clone(),
            };
            let event = UpgradeEvent {
                old_version: current,
                new_version: version,
            };
            // An error aborts the upgrade: nothing below runs, so no
            // schema change is committed.
            upgrade(&mut tx, &event)?;
            state.upgrades_run += 1;
            state.applied.extend(tx.calls);
            state.dbs.insert(
                name.to_string(),
                StoredDb {
                    version,
                    tables: tx.tables,
                },
            );
        }

        Ok(MockConnection {
            name: name.to_string(),
            version: version.max(current),
            open: true,
        })
    }

    async fn delete_database(&self, name: &str) -> Result<(), MockError> {
        self.state.lock().unwrap().dbs.remove(name);
        Ok(())
    }

    async fn databases(&self) -> Result<Vec<DatabaseInfo>, MockError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .dbs
            .iter()
            .map(|(name, db)| DatabaseInfo {
                name: name.clone(),
                version: db.version,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_database(engine: &MockEngine, name: &str) {
    let mut db = Database::named(engine.clone(), name);
    db.create_table("seed", TableOptions::new()).unwrap();
    db.open().await.unwrap();
    db.close();
}

// ---------------------------------------------------------------------------
// Creation and replay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_open_creates_database_and_drains_log() {
    let engine = MockEngine::new();
    let mut db = Database::named(engine.clone(), "fresh");
    db.create_table("books", TableOptions::from(KeySpec::field("isbn")))
        .unwrap();
    db.create_table("loans", TableOptions::from(KeySpec::Autoincrement))
        .unwrap();

    db.open().await.unwrap();

    assert!(db.is_open());
    assert_eq!(db.version(), Some(1));
    assert!(db.pending_operations().is_empty());

    let stored = engine.stored("fresh").unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(
        stored.tables.get("books"),
        Some(&Table {
            key: Some(KeyPath::Field("isbn".to_string())),
            autoincrement: false,
        })
    );
    // The marker key normalized away; only the flag reaches the engine.
    assert_eq!(
        stored.tables.get("loans"),
        Some(&Table {
            key: None,
            autoincrement: true,
        })
    );
}

#[tokio::test]
async fn test_open_missing_database_without_tables_fails() {
    let engine = MockEngine::new();

    let mut db = Database::named(engine.clone(), "ghost");
    let err = db.open().await.unwrap_err();
    assert!(matches!(err, DatabaseError::CannotCreateWithoutTables(name) if name == "ghost"));

    // A log of only drops does not count as table creation.
    let mut db = Database::named(engine.clone(), "ghost");
    db.drop_table("whatever").unwrap();
    let err = db.open().await.unwrap_err();
    assert!(matches!(err, DatabaseError::CannotCreateWithoutTables(_)));
    assert_eq!(engine.upgrades_run(), 0);
}

#[tokio::test]
async fn test_descriptor_version_used_for_new_database() {
    let engine = MockEngine::new();
    let mut db = Database::named(engine.clone(), "versioned");
    db.set_version(5).unwrap();
    db.create_table("t", TableOptions::new()).unwrap();

    db.open().await.unwrap();
    assert_eq!(db.version(), Some(5));
    assert_eq!(engine.stored("versioned").unwrap().version, 5);
}

#[tokio::test]
async fn test_reopen_with_operations_bumps_version_and_replays_in_order() {
    let engine = MockEngine::new();
    seed_database(&engine, "evolving").await;

    // Drop and re-add the same table: order must be preserved, not
    // deduplicated.
    let mut db = Database::named(engine.clone(), "evolving");
    db.drop_table("seed").unwrap();
    db.create_table("seed", TableOptions::from(KeySpec::field("id")))
        .unwrap();
    db.open().await.unwrap();

    assert_eq!(db.version(), Some(2));
    let applied = engine.applied();
    assert_eq!(applied[applied.len() - 2..], ["drop:seed", "add:seed"]);

    let stored = engine.stored("evolving").unwrap();
    assert_eq!(
        stored.tables.get("seed").unwrap().key,
        Some(KeyPath::Field("id".to_string()))
    );
}

#[tokio::test]
async fn test_open_existing_with_empty_log_runs_no_upgrade() {
    let engine = MockEngine::new();
    seed_database(&engine, "steady").await;
    assert_eq!(engine.upgrades_run(), 1);

    let mut db = Database::named(engine.clone(), "steady");
    db.open().await.unwrap();

    assert_eq!(db.version(), Some(1));
    assert_eq!(engine.upgrades_run(), 1);
}

#[tokio::test]
async fn test_mid_replay_failure_fails_open_and_commits_nothing() {
    let engine = MockEngine::failing_on("bad");
    let mut db = Database::named(engine.clone(), "doomed");
    db.create_table("ok", TableOptions::new()).unwrap();
    db.create_table("bad", TableOptions::new()).unwrap();
    db.create_table("never", TableOptions::new()).unwrap();

    let err = db.open().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Engine(_)));

    // Aborted upgrade: the engine kept nothing.
    assert!(engine.stored("doomed").is_none());
    assert!(engine.applied().is_empty());

    // The drain stopped at the failure; the unapplied tail stays queued.
    assert!(!db.is_open());
    assert_eq!(db.pending_operations().len(), 1);
}

#[tokio::test]
async fn test_engine_error_on_dropping_missing_table_is_surfaced() {
    let engine = MockEngine::new();
    seed_database(&engine, "strict").await;

    let mut db = Database::named(engine.clone(), "strict");
    db.drop_table("nonexistent").unwrap();
    let err = db.open().await.unwrap_err();

    let DatabaseError::Engine(cause) = err else {
        panic!("expected an engine error");
    };
    assert_eq!(
        cause.downcast::<MockError>().unwrap().as_ref(),
        &MockError::NoSuchTable("nonexistent".to_string())
    );
}

// ---------------------------------------------------------------------------
// Handle state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_recording_and_setters_fail_while_open() {
    let engine = MockEngine::new();
    let mut db = Database::named(engine.clone(), "locked");
    db.create_table("t", TableOptions::new()).unwrap();
    db.open().await.unwrap();

    assert!(matches!(
        db.create_table("more", TableOptions::new()),
        Err(DatabaseError::AlreadyOpen)
    ));
    assert!(matches!(
        db.drop_table("t"),
        Err(DatabaseError::AlreadyOpen)
    ));
    assert!(matches!(
        db.set_name("other"),
        Err(DatabaseError::AlreadyOpen)
    ));
    assert!(matches!(
        db.set_version(9),
        Err(DatabaseError::AlreadyOpen)
    ));
    assert!(matches!(db.open().await, Err(DatabaseError::AlreadyOpen)));
}

#[tokio::test]
async fn test_close_is_idempotent_and_retains_identity() {
    let engine = MockEngine::new();
    let mut db = Database::named(engine.clone(), "revolving");
    db.create_table("t", TableOptions::new()).unwrap();
    db.open().await.unwrap();

    db.close();
    db.close();
    assert!(!db.is_open());
    assert_eq!(db.name(), Some("revolving"));
    assert_eq!(db.version(), Some(1));

    // A closed handle can be reopened.
    db.open().await.unwrap();
    assert!(db.is_open());
    assert_eq!(db.version(), Some(1));
}

#[tokio::test]
async fn test_from_connection_wraps_live_connection() {
    let engine = MockEngine::new();
    let mut noop = |_tx: &mut MockTx, _event: &UpgradeEvent| -> Result<(), MockError> { Ok(()) };
    let conn = engine.open("direct", 3, &mut noop).await.unwrap();

    let mut db = Database::from_connection(engine, conn);
    assert!(db.is_open());
    assert_eq!(db.name(), Some("direct"));
    assert_eq!(db.version(), Some(3));
    assert!(matches!(
        db.create_table("t", TableOptions::new()),
        Err(DatabaseError::AlreadyOpen)
    ));
}

#[tokio::test]
async fn test_open_on_nameless_handle_fails() {
    let mut db = Database::new(MockEngine::new());
    assert!(matches!(db.open().await, Err(DatabaseError::MissingName)));
}

// ---------------------------------------------------------------------------
// Enumeration and removal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_enumeration_and_removal_scenario() {
    let engine = MockEngine::new();
    for name in ["these", "are", "test", "databases"] {
        seed_database(&engine, name).await;
    }

    let mut names: Vec<_> = storeplan_db::databases(&engine)
        .await
        .unwrap()
        .iter()
        .map(|db| db.name().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["are", "databases", "test", "these"]);

    storeplan_db::remove_database(&engine, "test").await.unwrap();

    let mut names: Vec<_> = storeplan_db::databases(&engine)
        .await
        .unwrap()
        .iter()
        .map(|db| db.name().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["are", "databases", "these"]);
}

#[tokio::test]
async fn test_enumerated_handles_are_openable() {
    let engine = MockEngine::new();
    seed_database(&engine, "solo").await;

    let mut handles = storeplan_db::databases(&engine).await.unwrap();
    let db = &mut handles[0];
    assert_eq!(db.name(), Some("solo"));
    assert_eq!(db.version(), Some(1));

    db.open().await.unwrap();
    assert!(db.is_open());
}

#[tokio::test]
async fn test_open_helper_returns_connected_handle() {
    let engine = MockEngine::new();
    seed_database(&engine, "ready").await;

    let db = storeplan_db::open(engine, "ready").await.unwrap();
    assert!(db.is_open());
    assert_eq!(db.version(), Some(1));
}

#[tokio::test]
async fn test_delete_removes_this_database() {
    let engine = MockEngine::new();
    seed_database(&engine, "mortal").await;

    let db = storeplan_db::open(engine.clone(), "mortal").await.unwrap();
    db.delete().await.unwrap();
    assert!(engine.stored("mortal").is_none());

    // Deleting a database that never existed is still fine.
    storeplan_db::remove_database(&engine, "mortal")
        .await
        .unwrap();
}
