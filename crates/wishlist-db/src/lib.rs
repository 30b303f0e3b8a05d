pub mod bookings;
pub mod error;
pub mod migrations;
pub mod models;
pub mod participants;
pub mod relations;
pub mod wishes;

pub use bookings::BookingEngine;
pub use error::{DbError, DbResult};
pub use participants::Participants;
pub use relations::Relations;
pub use wishes::Wishes;

use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};

/// How long a writer waits on another process holding the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the single SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))
    }

    /// Run read-only statements on the connection.
    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// Commits when `f` returns `Ok`. Any error, or a panic unwinding through
    /// `f`, drops the transaction and rolls every statement back.
    pub fn with_tx<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&*tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Drop and recreate every table. Administrative only.
    pub fn reset(&self) -> DbResult<()> {
        self.with_tx(migrations::reset)?;
        warn!("Database reset: all tables dropped and recreated");
        Ok(())
    }
}

/// The fixed set of repositories, built once and shared by handle.
#[derive(Clone)]
pub struct Registry {
    pub wishes: Wishes,
    pub bookings: BookingEngine,
    pub relations: Relations,
    pub participants: Participants,
    db: Database,
}

impl Registry {
    pub fn new(db: Database) -> Self {
        Self {
            wishes: Wishes::new(db.clone()),
            bookings: BookingEngine::new(db.clone()),
            relations: Relations::new(db.clone()),
            participants: Participants::new(db.clone()),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wishlist_types::models::NewWish;

    #[test]
    fn schema_creation_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(migrations::run).unwrap();
        db.with_conn(migrations::run).unwrap();

        let tables: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                     AND name IN ('creator', 'presenter', 'wish', 'relation', 'booked')",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();

        let result: DbResult<()> = registry.database().with_tx(|conn| {
            wishes::set_booked(conn, id, true)?;
            Err(DbError::InvalidInput("abort"))
        });
        assert!(matches!(result, Err(DbError::InvalidInput(_))));

        let wish = registry.wishes.get(id).unwrap().unwrap();
        assert!(!wish.booked);
    }

    #[test]
    fn reset_empties_every_table() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();
        registry.bookings.book(id, "bob").unwrap();

        registry.database().reset().unwrap();

        assert!(registry.wishes.list_by_creator("alice").unwrap().is_empty());
        assert!(registry.bookings.booking_for(id).unwrap().is_none());
        assert!(!registry.participants.is_creator("alice").unwrap());
        assert!(!registry.participants.is_presenter("bob").unwrap());

        // Store is usable again after the reset.
        registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();
    }
}
