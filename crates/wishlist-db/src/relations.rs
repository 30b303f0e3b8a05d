use rusqlite::params;
use tracing::debug;
use wishlist_types::models::{Relation, RelationType};

use crate::Database;
use crate::error::DbResult;
use crate::models::RelationRow;
use crate::participants::{insert_creator, insert_presenter, require_name};

/// Append-only log of creator/presenter affinities.
///
/// Nothing on the read or booking path consults these rows yet, and the same
/// pair may be recorded any number of times with different types.
#[derive(Clone)]
pub struct Relations {
    db: Database,
}

impl Relations {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn add(
        &self,
        creator_name: &str,
        presenter_name: &str,
        relation_type: RelationType,
    ) -> DbResult<i64> {
        require_name(creator_name, "creator_name is required")?;
        require_name(presenter_name, "presenter_name is required")?;

        let relation_id = self.db.with_tx(|conn| {
            insert_creator(conn, creator_name)?;
            insert_presenter(conn, presenter_name)?;
            conn.execute(
                "INSERT INTO relation (creator_name, presenter_name, relation_type) VALUES (?1, ?2, ?3)",
                params![creator_name, presenter_name, relation_type.as_str()],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(relation_id, creator = %creator_name, presenter = %presenter_name, %relation_type, "relation recorded");
        Ok(relation_id)
    }

    pub fn list_for_creator(&self, creator_name: &str) -> DbResult<Vec<Relation>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT relation_id, creator_name, presenter_name, relation_type
                 FROM relation
                 WHERE creator_name = ?1
                 ORDER BY relation_id ASC",
            )?;

            let rows = stmt
                .query_map([creator_name], |row| {
                    Ok(RelationRow {
                        relation_id: row.get(0)?,
                        creator_name: row.get(1)?,
                        presenter_name: row.get(2)?,
                        relation_type: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(Relation::try_from).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DbError, Registry};
    use wishlist_types::models::NewWish;

    #[test]
    fn duplicate_and_contradictory_pairs_are_kept() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let relations = &registry.relations;

        let first = relations.add("alice", "bob", RelationType::Friend).unwrap();
        let second = relations.add("alice", "bob", RelationType::Friend).unwrap();
        let third = relations.add("alice", "bob", RelationType::Family).unwrap();
        relations.add("carol", "bob", RelationType::Private).unwrap();

        let listed = relations.list_for_creator("alice").unwrap();
        let ids: Vec<i64> = listed.iter().map(|r| r.relation_id).collect();
        assert_eq!(ids, vec![first, second, third]);
        assert_eq!(listed[2].relation_type, RelationType::Family);

        assert!(registry.participants.is_creator("alice").unwrap());
        assert!(registry.participants.is_presenter("bob").unwrap());
    }

    #[test]
    fn relations_do_not_gate_booking() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        registry.relations.add("alice", "bob", RelationType::Private).unwrap();
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();

        // A stranger with no recorded relation may still book.
        registry.bookings.book(id, "mallory").unwrap();
    }

    #[test]
    fn unknown_stored_type_surfaces_as_error() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        registry.relations.add("alice", "bob", RelationType::Friend).unwrap();
        registry
            .database()
            .with_tx(|conn| {
                conn.execute("UPDATE relation SET relation_type = 'rival'", [])?;
                Ok(())
            })
            .unwrap();

        assert!(matches!(
            registry.relations.list_for_creator("alice"),
            Err(DbError::InvalidStoredValue(_))
        ));
    }
}
