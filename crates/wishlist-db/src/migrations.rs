use rusqlite::Connection;
use tracing::info;

use crate::error::DbResult;

/// A table owned by this crate: its name and idempotent DDL.
pub trait Table {
    const NAME: &'static str;
    const CREATE: &'static str;
}

pub struct CreatorTable;
pub struct PresenterTable;
pub struct WishTable;
pub struct RelationTable;
pub struct BookedTable;

impl Table for CreatorTable {
    const NAME: &'static str = "creator";
    const CREATE: &'static str = "
        CREATE TABLE IF NOT EXISTS creator (
            creator_name    TEXT NOT NULL PRIMARY KEY
        );
    ";
}

impl Table for PresenterTable {
    const NAME: &'static str = "presenter";
    const CREATE: &'static str = "
        CREATE TABLE IF NOT EXISTS presenter (
            presenter_name  TEXT NOT NULL PRIMARY KEY
        );
    ";
}

impl Table for WishTable {
    const NAME: &'static str = "wish";
    const CREATE: &'static str = "
        CREATE TABLE IF NOT EXISTS wish (
            wish_id         INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            booked          BOOLEAN NOT NULL DEFAULT 0,
            presented       BOOLEAN NOT NULL DEFAULT 0,
            creator_name    TEXT NOT NULL REFERENCES creator(creator_name),
            name            TEXT NOT NULL,
            priority        INTEGER,
            relation_type   TEXT,
            link            TEXT,
            price           REAL,
            photo_ref       TEXT,
            \"desc\"          TEXT,
            quantity        INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_wish_creator
            ON wish(creator_name, booked);
    ";
}

impl Table for RelationTable {
    const NAME: &'static str = "relation";
    const CREATE: &'static str = "
        CREATE TABLE IF NOT EXISTS relation (
            relation_id     INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            creator_name    TEXT NOT NULL REFERENCES creator(creator_name),
            presenter_name  TEXT NOT NULL REFERENCES presenter(presenter_name),
            relation_type   TEXT NOT NULL
        );
    ";
}

// UNIQUE(wish_id) is what rejects a second booking; the composite key alone
// would let two different presenters claim the same wish.
impl Table for BookedTable {
    const NAME: &'static str = "booked";
    const CREATE: &'static str = "
        CREATE TABLE IF NOT EXISTS booked (
            wish_id         INTEGER NOT NULL UNIQUE REFERENCES wish(wish_id),
            creator_name    TEXT NOT NULL REFERENCES creator(creator_name),
            presenter_name  TEXT NOT NULL REFERENCES presenter(presenter_name),
            date            INTEGER NOT NULL,
            PRIMARY KEY (wish_id, presenter_name)
        );

        CREATE INDEX IF NOT EXISTS idx_booked_presenter
            ON booked(presenter_name, date);
    ";
}

fn create_table<T: Table>(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(T::CREATE)?;
    Ok(())
}

fn drop_table<T: Table>(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", T::NAME))?;
    Ok(())
}

/// Create every table that does not exist yet. Parents before children.
pub fn run(conn: &Connection) -> DbResult<()> {
    create_table::<CreatorTable>(conn)?;
    create_table::<PresenterTable>(conn)?;
    create_table::<WishTable>(conn)?;
    create_table::<RelationTable>(conn)?;
    create_table::<BookedTable>(conn)?;

    info!("Database migrations complete");
    Ok(())
}

/// Drop every table, children first, then recreate the schema.
pub fn reset(conn: &Connection) -> DbResult<()> {
    drop_table::<BookedTable>(conn)?;
    drop_table::<RelationTable>(conn)?;
    drop_table::<WishTable>(conn)?;
    drop_table::<PresenterTable>(conn)?;
    drop_table::<CreatorTable>(conn)?;

    run(conn)
}
