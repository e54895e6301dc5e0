//! The database handle: recording schema operations and opening
//! connections.

use storeplan_core::{KeySpec, Operation, OperationLog, TableDef, TableOptions, normalize_table};
use tracing::debug;

use crate::engine::{Connection, StorageEngine, UpgradeEvent};
use crate::error::{DatabaseError, Result};
use crate::replay;

/// Either a not-yet-open descriptor or a live connection. Exactly one of
/// the two is active at any time.
enum State<C> {
    Pending {
        name: Option<String>,
        version: Option<u32>,
    },
    Connected(C),
}

/// A handle to one named database on a storage engine.
///
/// The handle accumulates schema changes ([`create_table`](Self::create_table),
/// [`drop_table`](Self::drop_table)) into an operation log without touching
/// the engine, then applies them all during a single upgrade transaction
/// when [`open`](Self::open) is called. Recording requires that no
/// connection is attached; once open, the handle is a thin wrapper around
/// the live connection until [`close`](Self::close).
///
/// Dropping the handle closes the connection; `close` stays the single
/// idempotent release primitive.
///
/// # Examples
///
/// ```no_run
/// # async fn demo<E: storeplan_db::StorageEngine>(engine: E) -> storeplan_db::Result<()> {
/// use storeplan_core::{KeySpec, TableOptions};
/// use storeplan_db::Database;
///
/// let mut db = Database::named(engine, "library");
/// db.create_table("books", TableOptions::new().with_key(KeySpec::field("isbn")))?;
/// db.create_table("visits", KeySpec::Autoincrement.into())?;
/// db.open().await?;
/// assert!(db.is_open());
/// db.close();
/// # Ok(())
/// # }
/// ```
pub struct Database<E: StorageEngine> {
    engine: E,
    state: State<E::Connection>,
    oplist: OperationLog,
}

impl<E: StorageEngine> Database<E> {
    /// Creates an empty handle; the name must be set before opening.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: State::Pending {
                name: None,
                version: None,
            },
            oplist: OperationLog::new(),
        }
    }

    /// Creates a handle for the named database.
    pub fn named(engine: E, name: impl Into<String>) -> Self {
        Self {
            engine,
            state: State::Pending {
                name: Some(name.into()),
                version: None,
            },
            oplist: OperationLog::new(),
        }
    }

    /// Wraps an already-open connection.
    pub fn from_connection(engine: E, connection: E::Connection) -> Self {
        Self {
            engine,
            state: State::Connected(connection),
            oplist: OperationLog::new(),
        }
    }

    pub(crate) fn descriptor(engine: E, name: String, version: u32) -> Self {
        Self {
            engine,
            state: State::Pending {
                name: Some(name),
                version: Some(version),
            },
            oplist: OperationLog::new(),
        }
    }

    /// Returns `true` while a connection is attached.
    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Connected(_))
    }

    /// Database name: read from the connection when open, from the
    /// descriptor otherwise.
    pub fn name(&self) -> Option<&str> {
        match &self.state {
            State::Pending { name, .. } => name.as_deref(),
            State::Connected(conn) => Some(conn.name()),
        }
    }

    /// Database version: the connection's version when open, the
    /// descriptor's otherwise.
    pub fn version(&self) -> Option<u32> {
        match &self.state {
            State::Pending { version, .. } => *version,
            State::Connected(conn) => Some(conn.version()),
        }
    }

    /// Sets the name on a not-yet-open handle.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::AlreadyOpen`] while a connection is attached — the
    /// name is then a read-only derived value.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        match &mut self.state {
            State::Pending { name: slot, .. } => {
                *slot = Some(name.into());
                Ok(())
            }
            State::Connected(_) => Err(DatabaseError::AlreadyOpen),
        }
    }

    /// Sets the version to request on the next open.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::InvalidVersion`] for version `0` (engine versions
    /// start at 1), [`DatabaseError::AlreadyOpen`] while connected.
    pub fn set_version(&mut self, version: u32) -> Result<()> {
        if version == 0 {
            return Err(DatabaseError::InvalidVersion(version));
        }
        match &mut self.state {
            State::Pending { version: slot, .. } => {
                *slot = Some(version);
                Ok(())
            }
            State::Connected(_) => Err(DatabaseError::AlreadyOpen),
        }
    }

    /// The queue of not-yet-applied schema operations.
    pub fn pending_operations(&self) -> &OperationLog {
        &self.oplist
    }

    /// The live connection, while one is attached.
    pub fn connection(&self) -> Option<&E::Connection> {
        match &self.state {
            State::Pending { .. } => None,
            State::Connected(conn) => Some(conn),
        }
    }

    fn ensure_closed(&self) -> Result<()> {
        if self.is_open() {
            return Err(DatabaseError::AlreadyOpen);
        }
        Ok(())
    }

    /// Queues creation of a table. Pure bookkeeping: no engine I/O happens
    /// until [`open`](Self::open).
    ///
    /// The options are normalized first; a failed normalization discards
    /// the half-built record and leaves the log untouched.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::AlreadyOpen`] while connected;
    /// [`DatabaseError::Normalize`] when the key shape implies
    /// autoincrement and the options explicitly disable it.
    pub fn create_table(&mut self, name: impl Into<String>, options: TableOptions) -> Result<()> {
        self.create_table_def(TableDef {
            name: name.into(),
            key: options.key,
            autoincrement: options.autoincrement,
        })
    }

    /// Queues creation of a table described as one merged value.
    pub fn create_table_def(&mut self, def: TableDef) -> Result<()> {
        self.ensure_closed()?;
        let spec = normalize_table(def)?;
        self.oplist.push(Operation::AddTable(spec));
        Ok(())
    }

    /// Queues creation of several tables, in iteration order.
    ///
    /// Not transactional: a failure on the *k*-th entry leaves the earlier
    /// entries queued.
    pub fn create_tables<N, O, I>(&mut self, tables: I) -> Result<()>
    where
        N: Into<String>,
        O: Into<TableOptions>,
        I: IntoIterator<Item = (N, O)>,
    {
        for (name, options) in tables {
            self.create_table(name, options.into())?;
        }
        Ok(())
    }

    /// Queues deletion of the named table.
    ///
    /// Whether the table exists is the engine's business, checked at
    /// replay time.
    pub fn drop_table(&mut self, name: impl Into<String>) -> Result<()> {
        self.ensure_closed()?;
        self.oplist.push(Operation::DropTable { name: name.into() });
        Ok(())
    }

    /// Queues deletion of several tables, in iteration order. Like
    /// [`create_tables`](Self::create_tables), not transactional.
    pub fn drop_tables<N, I>(&mut self, names: I) -> Result<()>
    where
        N: Into<String>,
        I: IntoIterator<Item = N>,
    {
        for name in names {
            self.drop_table(name)?;
        }
        Ok(())
    }

    /// Opens the database, replaying any queued schema operations inside
    /// the engine's upgrade transaction.
    ///
    /// Version selection: with a non-empty log the engine is asked for the
    /// stored version plus one (or the descriptor's version, default 1,
    /// when the database is new), which is what makes the upgrade fire.
    /// With an empty log no bump is requested and no replay runs.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::AlreadyOpen`], [`DatabaseError::MissingName`],
    /// [`DatabaseError::CannotCreateWithoutTables`] when the database does
    /// not exist and the log holds no table creation, or
    /// [`DatabaseError::Engine`] for anything the engine rejects —
    /// including a mid-replay failure, which leaves the unapplied records
    /// queued and no schema change committed.
    pub async fn open(&mut self) -> Result<()> {
        let (name, requested) = match &self.state {
            State::Connected(_) => return Err(DatabaseError::AlreadyOpen),
            State::Pending { name, version } => (
                name.clone().ok_or(DatabaseError::MissingName)?,
                *version,
            ),
        };

        let current = self
            .engine
            .databases()
            .await
            .map_err(DatabaseError::engine)?
            .into_iter()
            .find(|info| info.name == name)
            .map(|info| info.version);

        if current.is_none() && !self.oplist.has_add_table() {
            return Err(DatabaseError::CannotCreateWithoutTables(name));
        }

        let target = if self.oplist.is_empty() {
            requested.or(current).unwrap_or(1)
        } else {
            match current {
                Some(version) => version + 1,
                None => requested.unwrap_or(1),
            }
        };
        debug!(db = %name, version = target, stored = ?current, "opening database");

        let log = &mut self.oplist;
        let mut upgrade = |tx: &mut E::Tx, event: &UpgradeEvent| {
            debug!(
                db = %name,
                from = event.old_version,
                to = event.new_version,
                queued = log.len(),
                "replaying schema operations"
            );
            replay::apply(tx, log)
        };
        let connection = self
            .engine
            .open(&name, target, &mut upgrade)
            .await
            .map_err(DatabaseError::engine)?;

        self.state = State::Connected(connection);
        Ok(())
    }

    /// Closes the connection, if any. Idempotent.
    ///
    /// The connection's name and version are retained in the handle, so a
    /// closed handle can be reopened.
    pub fn close(&mut self) {
        if let State::Connected(conn) = &mut self.state {
            let name = conn.name().to_string();
            let version = conn.version();
            conn.close();
            self.state = State::Pending {
                name: Some(name),
                version: Some(version),
            };
        }
    }

    /// Closes the connection and deletes this handle's database from the
    /// engine.
    ///
    /// # Errors
    ///
    /// [`DatabaseError::MissingName`] on an empty handle;
    /// [`DatabaseError::Engine`] when the engine refuses the deletion.
    pub async fn delete(mut self) -> Result<()> {
        let name = self
            .name()
            .ok_or(DatabaseError::MissingName)?
            .to_string();
        self.close();
        debug!(db = %name, "deleting database");
        self.engine
            .delete_database(&name)
            .await
            .map_err(DatabaseError::engine)
    }
}

impl<E: StorageEngine> Drop for Database<E> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Constructs a handle for `name` and opens it in one call.
///
/// Only suitable for databases that already exist, since no tables can
/// have been queued yet.
pub async fn open<E: StorageEngine>(engine: E, name: &str) -> Result<Database<E>> {
    let mut db = Database::named(engine, name);
    db.open().await?;
    Ok(db)
}

/// Lists every existing database as a ready-to-open handle with its name
/// and stored version pre-filled.
pub async fn databases<E>(engine: &E) -> Result<Vec<Database<E>>>
where
    E: StorageEngine + Clone,
{
    let infos = engine.databases().await.map_err(DatabaseError::engine)?;
    Ok(infos
        .into_iter()
        .map(|info| Database::descriptor(engine.clone(), info.name, info.version))
        .collect())
}

/// Deletes the named database. Existence is not checked first: the call
/// ensures no database with this name remains.
pub async fn remove_database<E: StorageEngine>(engine: &E, name: &str) -> Result<()> {
    engine
        .delete_database(name)
        .await
        .map_err(DatabaseError::engine)
}
