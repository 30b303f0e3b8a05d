use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;
use wishlist_types::models::{NewWish, Wish};

use crate::Database;
use crate::error::DbResult;
use crate::models::{WISH_COLUMNS, WishRow};
use crate::participants::{insert_creator, require_name};

/// Ranking used by every creator listing: priority ascending with unset
/// priorities last, then insertion order.
const WISH_ORDER: &str = "ORDER BY w.priority ASC NULLS LAST, w.wish_id ASC";

#[derive(Clone)]
pub struct Wishes {
    db: Database,
}

impl Wishes {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persist a new unbooked wish and return its id. The creator row is
    /// added in the same transaction if this is their first wish.
    pub fn create(&self, wish: &NewWish) -> DbResult<i64> {
        require_name(&wish.creator_name, "creator_name is required")?;
        require_name(&wish.name, "wish name is required")?;

        let wish_id = self.db.with_tx(|conn| {
            insert_creator(conn, &wish.creator_name)?;
            conn.execute(
                "INSERT INTO wish (booked, presented, creator_name, name, priority, relation_type,
                                   link, price, photo_ref, \"desc\", quantity)
                 VALUES (0, 0, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    wish.creator_name,
                    wish.name,
                    wish.priority,
                    wish.relation_type.map(|r| r.as_str()),
                    wish.link,
                    wish.price,
                    wish.photo_ref,
                    wish.desc,
                    wish.quantity,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(wish_id, creator = %wish.creator_name, "wish created");
        Ok(wish_id)
    }

    pub fn get(&self, wish_id: i64) -> DbResult<Option<Wish>> {
        self.db.with_conn(|conn| query_wish(conn, wish_id))
    }

    /// Ids of every wish owned by `creator_name`, best ranked first.
    pub fn list_by_creator(&self, creator_name: &str) -> DbResult<Vec<i64>> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT w.wish_id FROM wish w WHERE w.creator_name = ?1 {WISH_ORDER}");
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map([creator_name], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    /// Full records of a creator's wishes in one booking state, best ranked first.
    pub fn list_by_creator_and_booking_state(
        &self,
        creator_name: &str,
        booked: bool,
    ) -> DbResult<Vec<Wish>> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {WISH_COLUMNS} FROM wish w
                 WHERE w.creator_name = ?1 AND w.booked = ?2
                 {WISH_ORDER}"
            );
            collect_wishes(conn, &sql, params![creator_name, booked])
        })
    }

    /// Wishes `presenter_name` has booked, oldest booking first.
    pub fn list_booked_for_presenter(&self, presenter_name: &str) -> DbResult<Vec<Wish>> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {WISH_COLUMNS} FROM booked b
                 JOIN wish w ON w.wish_id = b.wish_id
                 WHERE b.presenter_name = ?1
                 ORDER BY b.date ASC, w.wish_id ASC"
            );
            collect_wishes(conn, &sql, params![presenter_name])
        })
    }
}

/// Flip the booked flag. Only valid inside the booking transaction, which
/// writes the matching `booked` row.
pub(crate) fn set_booked(conn: &Connection, wish_id: i64, value: bool) -> DbResult<usize> {
    let changed = conn.execute(
        "UPDATE wish SET booked = ?1 WHERE wish_id = ?2",
        params![value, wish_id],
    )?;
    Ok(changed)
}

pub(crate) fn creator_of(conn: &Connection, wish_id: i64) -> DbResult<Option<String>> {
    let creator = conn
        .query_row(
            "SELECT creator_name FROM wish WHERE wish_id = ?1",
            [wish_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(creator)
}

fn query_wish(conn: &Connection, wish_id: i64) -> DbResult<Option<Wish>> {
    let sql = format!("SELECT {WISH_COLUMNS} FROM wish w WHERE w.wish_id = ?1");
    let row = conn
        .query_row(&sql, [wish_id], WishRow::from_row)
        .optional()?;
    row.map(Wish::try_from).transpose()
}

fn collect_wishes(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> DbResult<Vec<Wish>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, WishRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(Wish::try_from).collect()
}
