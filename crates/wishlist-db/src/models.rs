//! Database row types. These map directly to SQLite rows and are kept apart
//! from the wishlist-types models so the stored text forms stay local here.

use rusqlite::Row;
use wishlist_types::models::{Booking, Relation, RelationType, Wish};

use crate::error::DbError;

/// Column list matching `WishRow::from_row`. Always select through this.
pub const WISH_COLUMNS: &str = "w.wish_id, w.booked, w.presented, w.creator_name, w.name, \
     w.priority, w.relation_type, w.link, w.price, w.photo_ref, w.\"desc\", w.quantity";

pub struct WishRow {
    pub wish_id: i64,
    pub booked: bool,
    pub presented: bool,
    pub creator_name: String,
    pub name: String,
    pub priority: Option<i64>,
    pub relation_type: Option<String>,
    pub link: Option<String>,
    pub price: Option<f64>,
    pub photo_ref: Option<String>,
    pub desc: Option<String>,
    pub quantity: Option<i64>,
}

impl WishRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            wish_id: row.get(0)?,
            booked: row.get(1)?,
            presented: row.get(2)?,
            creator_name: row.get(3)?,
            name: row.get(4)?,
            priority: row.get(5)?,
            relation_type: row.get(6)?,
            link: row.get(7)?,
            price: row.get(8)?,
            photo_ref: row.get(9)?,
            desc: row.get(10)?,
            quantity: row.get(11)?,
        })
    }
}

impl TryFrom<WishRow> for Wish {
    type Error = DbError;

    fn try_from(row: WishRow) -> Result<Self, Self::Error> {
        let relation_type = row.relation_type.as_deref().map(str::parse::<RelationType>).transpose()?;

        Ok(Wish {
            wish_id: row.wish_id,
            creator_name: row.creator_name,
            name: row.name,
            booked: row.booked,
            presented: row.presented,
            priority: row.priority,
            relation_type,
            link: row.link,
            price: row.price,
            photo_ref: row.photo_ref,
            desc: row.desc,
            quantity: row.quantity,
        })
    }
}

pub struct BookedRow {
    pub wish_id: i64,
    pub creator_name: String,
    pub presenter_name: String,
    pub date: i64,
}

impl From<BookedRow> for Booking {
    fn from(row: BookedRow) -> Self {
        Booking {
            wish_id: row.wish_id,
            creator_name: row.creator_name,
            presenter_name: row.presenter_name,
            timestamp_ms: row.date,
        }
    }
}

pub struct RelationRow {
    pub relation_id: i64,
    pub creator_name: String,
    pub presenter_name: String,
    pub relation_type: String,
}

impl TryFrom<RelationRow> for Relation {
    type Error = DbError;

    fn try_from(row: RelationRow) -> Result<Self, Self::Error> {
        Ok(Relation {
            relation_id: row.relation_id,
            creator_name: row.creator_name,
            presenter_name: row.presenter_name,
            relation_type: row.relation_type.parse()?,
        })
    }
}
