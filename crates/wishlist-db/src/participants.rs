use rusqlite::{Connection, OptionalExtension};

use crate::Database;
use crate::error::{DbError, DbResult};

/// Read side of the creator and presenter identity tables. Rows are written
/// insert-if-absent by the repositories inside their own transactions and
/// never change afterwards.
#[derive(Clone)]
pub struct Participants {
    db: Database,
}

impl Participants {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn is_creator(&self, creator_name: &str) -> DbResult<bool> {
        self.db.with_conn(|conn| {
            exists(conn, "SELECT 1 FROM creator WHERE creator_name = ?1", creator_name)
        })
    }

    pub fn is_presenter(&self, presenter_name: &str) -> DbResult<bool> {
        self.db.with_conn(|conn| {
            exists(conn, "SELECT 1 FROM presenter WHERE presenter_name = ?1", presenter_name)
        })
    }
}

pub(crate) fn require_name(value: &str, message: &'static str) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::InvalidInput(message));
    }
    Ok(())
}

pub(crate) fn insert_creator(conn: &Connection, creator_name: &str) -> DbResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO creator (creator_name) VALUES (?1)",
        [creator_name],
    )?;
    Ok(())
}

pub(crate) fn insert_presenter(conn: &Connection, presenter_name: &str) -> DbResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO presenter (presenter_name) VALUES (?1)",
        [presenter_name],
    )?;
    Ok(())
}

fn exists(conn: &Connection, sql: &str, key: &str) -> DbResult<bool> {
    let found = conn
        .query_row(sql, [key], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}
