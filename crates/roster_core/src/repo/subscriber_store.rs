//! Storage gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Execute insert, update, delete and delete-all against durable storage.
//! - Keep the live subscriber list in sync with every successful mutation.
//!
//! # Invariants
//! - Insert and update validate the record before touching SQL.
//! - Update and delete match by id and report affected rows; `0` means no
//!   row matched and nothing was published.
//! - Published lists are ordered by ascending id.
//! - A mutation and the re-read that feeds the live list share one
//!   transaction; if the re-read fails the mutation is rolled back.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::subscriber::{Subscriber, SubscriberId, SubscriberValidationError};
use crate::repo::live::{LiveSubscribers, SubscriberFeed};
use log::{debug, error, info};
use rusqlite::{params, Connection, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SUBSCRIBER_TABLE: &str = "subscriber_data_table";
const SUBSCRIBER_SELECT_SQL: &str = "SELECT id, name, email FROM subscriber_data_table";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for subscriber persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(SubscriberValidationError),
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// The store can no longer be used, e.g. its connection lock is poisoned.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::Unavailable(message) => write!(f, "subscriber store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::Unavailable(_) => None,
        }
    }
}

impl From<SubscriberValidationError> for StoreError {
    fn from(value: SubscriberValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence boundary for subscribers.
///
/// Implementations must be shareable across threads: the controller runs
/// every call on a blocking worker.
pub trait SubscriberStore: Send + Sync {
    /// Stores a new record and returns its id.
    ///
    /// An `UNASSIGNED_ID` record gets a fresh id; any other id is stored as
    /// given and fails if it already exists.
    fn insert(&self, subscriber: &Subscriber) -> StoreResult<SubscriberId>;
    /// Overwrites name and email of the row with the same id.
    fn update(&self, subscriber: &Subscriber) -> StoreResult<usize>;
    /// Removes the row with the same id.
    fn delete(&self, subscriber: &Subscriber) -> StoreResult<usize>;
    /// Removes every row and returns how many were removed.
    fn delete_all(&self) -> StoreResult<usize>;
    /// Returns a live view over all rows.
    fn subscribers(&self) -> LiveSubscribers;
}

/// SQLite-backed subscriber store.
#[derive(Debug)]
pub struct SqliteSubscriberStore {
    conn: Mutex<Connection>,
    feed: SubscriberFeed,
}

impl SqliteSubscriberStore {
    /// Wraps an already-migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` when the subscriber table is absent.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let actual_version = current_user_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        if !table_exists(&conn, SUBSCRIBER_TABLE)? {
            return Err(StoreError::MissingRequiredTable(SUBSCRIBER_TABLE));
        }

        let initial = load_all(&conn)?;
        debug!(
            "event=store_init module=repo status=ok rows={}",
            initial.len()
        );
        Ok(Self {
            conn: Mutex::new(conn),
            feed: SubscriberFeed::new(initial),
        })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory database and wraps it.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            error!("event=store_lock module=repo status=error error_code=lock_poisoned");
            StoreError::Unavailable("connection lock poisoned".to_string())
        })
    }

    /// Re-reads the table inside `tx`, commits, then publishes while the
    /// connection is still held so publishes land in mutation order.
    fn commit_and_publish(&self, tx: Transaction<'_>, event: &str) -> StoreResult<()> {
        let all = load_all(&tx).map_err(|err| {
            error!("event={event} module=repo status=error error_code=reload_failed error={err}");
            err
        })?;
        tx.commit()?;
        self.feed.publish(all);
        Ok(())
    }
}

impl SubscriberStore for SqliteSubscriberStore {
    fn insert(&self, subscriber: &Subscriber) -> StoreResult<SubscriberId> {
        subscriber.validate()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let result = if subscriber.is_persisted() {
            tx.execute(
                "INSERT INTO subscriber_data_table (id, name, email) VALUES (?1, ?2, ?3);",
                params![subscriber.id, subscriber.name, subscriber.email],
            )
            .map(|_| subscriber.id)
        } else {
            tx.execute(
                "INSERT INTO subscriber_data_table (name, email) VALUES (?1, ?2);",
                params![subscriber.name, subscriber.email],
            )
            .map(|_| tx.last_insert_rowid())
        };

        let id = result.map_err(|err| {
            error!("event=subscriber_insert module=repo status=error error={err}");
            err
        })?;
        self.commit_and_publish(tx, "subscriber_insert")?;
        info!("event=subscriber_insert module=repo status=ok id={id}");
        Ok(id)
    }

    fn update(&self, subscriber: &Subscriber) -> StoreResult<usize> {
        subscriber.validate()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE subscriber_data_table SET name = ?1, email = ?2 WHERE id = ?3;",
            params![subscriber.name, subscriber.email, subscriber.id],
        )?;
        if changed > 0 {
            self.commit_and_publish(tx, "subscriber_update")?;
        }
        info!(
            "event=subscriber_update module=repo status=ok id={} affected={changed}",
            subscriber.id
        );
        Ok(changed)
    }

    fn delete(&self, subscriber: &Subscriber) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "DELETE FROM subscriber_data_table WHERE id = ?1;",
            [subscriber.id],
        )?;
        if changed > 0 {
            self.commit_and_publish(tx, "subscriber_delete")?;
        }
        info!(
            "event=subscriber_delete module=repo status=ok id={} affected={changed}",
            subscriber.id
        );
        Ok(changed)
    }

    fn delete_all(&self) -> StoreResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let changed = tx.execute("DELETE FROM subscriber_data_table;", [])?;
        if changed > 0 {
            self.commit_and_publish(tx, "subscriber_delete_all")?;
        }
        info!("event=subscriber_delete_all module=repo status=ok affected={changed}");
        Ok(changed)
    }

    fn subscribers(&self) -> LiveSubscribers {
        self.feed.subscribe()
    }
}

fn table_exists(conn: &Connection, table_name: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_all(conn: &Connection) -> StoreResult<Vec<Subscriber>> {
    let mut stmt = conn.prepare(&format!("{SUBSCRIBER_SELECT_SQL} ORDER BY id ASC;"))?;
    let rows = stmt.query_map([], parse_subscriber_row)?;
    let subscribers = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(subscribers)
}

fn parse_subscriber_row(row: &Row<'_>) -> rusqlite::Result<Subscriber> {
    Ok(Subscriber {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    })
}
