//! The SQLite-backed storage engine.
//!
//! Each named database is one SQLite file, `<name>.sqlite`, inside the
//! engine's directory; the stored schema version lives in
//! `PRAGMA user_version`. Schema transactions buffer their statements
//! against a snapshot of the existing table set and are committed — batch
//! plus version bump — in a single SQLite transaction only after the
//! upgrade hook succeeds, so a failed upgrade changes nothing.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use storeplan_core::KeyPath;
use storeplan_db::{Connection, DatabaseInfo, SchemaTx, StorageEngine, UpgradeHook};

use crate::error::{Result, SqliteError};
use crate::schema;

/// A storage engine hosting one SQLite file per database in a directory.
///
/// # Examples
///
/// ```no_run
/// # async fn demo() -> storeplan_db::Result<()> {
/// use storeplan_core::KeySpec;
/// use storeplan_db::Database;
/// use storeplan_sqlite::SqliteEngine;
///
/// let engine = SqliteEngine::new("/var/lib/myapp/databases");
/// let mut db = Database::named(engine, "library");
/// db.create_table("books", KeySpec::field("isbn").into())?;
/// db.open().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    dir: PathBuf,
}

impl SqliteEngine {
    /// Creates an engine rooted at `dir`. The directory is created lazily
    /// on the first open.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the database files.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    fn db_path(&self, name: &str) -> Result<PathBuf> {
        schema::validate_identifier(name)?;
        Ok(self.dir.join(format!("{name}.sqlite")))
    }

    fn run_upgrade(
        &self,
        conn: &mut rusqlite::Connection,
        current: u32,
        version: u32,
        upgrade: UpgradeHook<'_, SqliteTx, SqliteError>,
    ) -> Result<()> {
        let mut tx = SqliteTx {
            tables: list_tables(conn)?,
            statements: Vec::new(),
        };
        let event = storeplan_db::UpgradeEvent {
            old_version: current,
            new_version: version,
        };
        upgrade(&mut tx, &event)?;

        let sqlite_tx = conn.transaction()?;
        if !tx.statements.is_empty() {
            sqlite_tx.execute_batch(&tx.statements.join("\n"))?;
        }
        sqlite_tx.pragma_update(None, "user_version", version)?;
        sqlite_tx.commit()?;
        Ok(())
    }
}

fn read_version(conn: &rusqlite::Connection) -> Result<u32> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version as u32)
}

fn list_tables(conn: &rusqlite::Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut tables = BTreeSet::new();
    for row in rows {
        tables.insert(row?);
    }
    Ok(tables)
}

/// Schema transaction over one database file.
///
/// Statements are buffered and validated against a snapshot of the table
/// set; nothing reaches the file until the whole upgrade hook has
/// succeeded.
pub struct SqliteTx {
    tables: BTreeSet<String>,
    statements: Vec<String>,
}

impl SchemaTx for SqliteTx {
    type Error = SqliteError;

    fn create_table(
        &mut self,
        name: &str,
        key_path: Option<&KeyPath>,
        autoincrement: bool,
    ) -> Result<()> {
        let sql = schema::create_table_sql(name, key_path, autoincrement)?;
        if !self.tables.insert(name.to_string()) {
            return Err(SqliteError::TableExists(name.to_string()));
        }
        self.statements.push(sql);
        Ok(())
    }

    fn delete_table(&mut self, name: &str) -> Result<()> {
        let sql = schema::drop_table_sql(name)?;
        if !self.tables.remove(name) {
            return Err(SqliteError::NoSuchTable(name.to_string()));
        }
        self.statements.push(sql);
        Ok(())
    }
}

/// A live connection to one SQLite-backed database.
pub struct SqliteConnection {
    name: String,
    version: u32,
    conn: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Names of the tables currently in the database, sorted.
    ///
    /// # Errors
    ///
    /// [`SqliteError::Closed`] after the connection was closed.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.as_ref().ok_or(SqliteError::Closed)?;
        Ok(list_tables(conn)?.into_iter().collect())
    }
}

impl Connection for SqliteConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn close(&mut self) {
        // Dropping the rusqlite connection closes the file handle.
        self.conn.take();
    }
}

impl StorageEngine for SqliteEngine {
    type Connection = SqliteConnection;
    type Tx = SqliteTx;
    type Error = SqliteError;

    async fn open(
        &self,
        name: &str,
        version: u32,
        upgrade: UpgradeHook<'_, SqliteTx, SqliteError>,
    ) -> Result<SqliteConnection> {
        fs::create_dir_all(&self.dir)?;
        let path = self.db_path(name)?;
        let existed = path.exists();

        let mut conn = rusqlite::Connection::open(&path)?;
        let current = read_version(&conn)?;

        let outcome = if version < current {
            Err(SqliteError::VersionTooLow {
                requested: version,
                current,
            })
        } else if version > current {
            self.run_upgrade(&mut conn, current, version, upgrade)
        } else {
            Ok(())
        };

        if let Err(err) = outcome {
            // A failed first-time open must not leave an empty database
            // file behind, or the database would "exist" from then on.
            drop(conn);
            if !existed {
                let _ = fs::remove_file(&path);
            }
            return Err(err);
        }

        Ok(SqliteConnection {
            name: name.to_string(),
            version: version.max(current),
            conn: Some(conn),
        })
    }

    async fn delete_database(&self, name: &str) -> Result<()> {
        let path = self.db_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn databases(&self) -> Result<Vec<DatabaseInfo>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut infos = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("sqlite") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let conn = rusqlite::Connection::open_with_flags(
                &path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
            )?;
            infos.push(DatabaseInfo {
                name: name.to_string(),
                version: read_version(&conn)?,
            });
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }
}
