use rusqlite::{OptionalExtension, params};
use tracing::{error, info, warn};
use wishlist_types::models::Booking;

use crate::error::{DbError, DbResult, is_unique_violation};
use crate::models::BookedRow;
use crate::participants::{insert_presenter, require_name};
use crate::{Database, now_ms, wishes};

/// Claims wishes for presenters. A wish moves `Unbooked -> Booked` at most
/// once; the `booked` row and the wish flag are always written together.
#[derive(Clone)]
pub struct BookingEngine {
    db: Database,
}

impl BookingEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Book `wish_id` for `presenter_name` in one immediate transaction.
    ///
    /// A second claim on the same wish trips the unique key on `booked` and
    /// comes back as `AlreadyBooked`, with the first booking left intact.
    pub fn book(&self, wish_id: i64, presenter_name: &str) -> DbResult<Booking> {
        require_name(presenter_name, "presenter_name is required")?;

        let result = self.db.with_tx(|conn| {
            let creator_name =
                wishes::creator_of(conn, wish_id)?.ok_or(DbError::NotFound(wish_id))?;

            insert_presenter(conn, presenter_name)?;
            wishes::set_booked(conn, wish_id, true)?;

            let timestamp_ms = now_ms();
            conn.execute(
                "INSERT INTO booked (wish_id, creator_name, presenter_name, date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![wish_id, creator_name, presenter_name, timestamp_ms],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::AlreadyBooked(wish_id)
                } else {
                    DbError::Sqlite(e)
                }
            })?;

            Ok(Booking {
                wish_id,
                creator_name,
                presenter_name: presenter_name.to_string(),
                timestamp_ms,
            })
        });

        match &result {
            Ok(booking) => info!(
                wish_id,
                presenter = %presenter_name,
                creator = %booking.creator_name,
                "wish booked"
            ),
            Err(DbError::NotFound(_)) => warn!(wish_id, presenter = %presenter_name, "booking rejected: no such wish"),
            Err(DbError::AlreadyBooked(_)) => warn!(wish_id, presenter = %presenter_name, "booking rejected: already booked"),
            Err(e) => error!(wish_id, presenter = %presenter_name, "booking rolled back: {}", e),
        }

        result
    }

    pub fn booking_for(&self, wish_id: i64) -> DbResult<Option<Booking>> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT wish_id, creator_name, presenter_name, date FROM booked WHERE wish_id = ?1",
                    [wish_id],
                    |row| {
                        Ok(BookedRow {
                            wish_id: row.get(0)?,
                            creator_name: row.get(1)?,
                            presenter_name: row.get(2)?,
                            date: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(row.map(Booking::from))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Registry;
    use std::path::PathBuf;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use wishlist_types::models::NewWish;

    fn count(db: &Database, sql: &str) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
            .unwrap()
    }

    /// Flag and row agree for every wish in the store.
    fn assert_flags_match_rows(db: &Database) {
        let mismatched = count(
            db,
            "SELECT COUNT(*) FROM wish w
             WHERE w.booked != EXISTS (SELECT 1 FROM booked b WHERE b.wish_id = w.wish_id)",
        );
        assert_eq!(mismatched, 0);
    }

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("wishlist-test-{}.db", uuid::Uuid::new_v4()))
    }

    #[test]
    fn book_sets_flag_and_writes_row() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();
        assert_flags_match_rows(registry.database());

        let booking = registry.bookings.book(id, "bob").unwrap();
        assert_eq!(booking.wish_id, id);
        assert_eq!(booking.creator_name, "alice");
        assert_eq!(booking.presenter_name, "bob");
        assert!(booking.timestamp_ms > 0);

        assert!(registry.wishes.get(id).unwrap().unwrap().booked);
        assert_eq!(registry.bookings.booking_for(id).unwrap(), Some(booking));
        assert!(registry.participants.is_presenter("bob").unwrap());
        assert_flags_match_rows(registry.database());
    }

    #[test]
    fn second_booking_is_rejected() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();

        registry.bookings.book(id, "bob").unwrap();
        let again = registry.bookings.book(id, "bob");
        assert!(matches!(again, Err(DbError::AlreadyBooked(w)) if w == id));

        let other = registry.bookings.book(id, "carol");
        assert!(matches!(other, Err(DbError::AlreadyBooked(_))));

        assert_eq!(count(registry.database(), "SELECT COUNT(*) FROM booked"), 1);
        let booking = registry.bookings.booking_for(id).unwrap().unwrap();
        assert_eq!(booking.presenter_name, "bob");
        assert_flags_match_rows(registry.database());
    }

    #[test]
    fn rejected_booking_leaves_no_presenter_behind() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();

        registry.bookings.book(id, "bob").unwrap();
        registry.bookings.book(id, "carol").unwrap_err();

        assert!(!registry.participants.is_presenter("carol").unwrap());
    }

    #[test]
    fn missing_wish_is_not_found_without_side_effects() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();

        let result = registry.bookings.book(999, "bob");
        assert!(matches!(result, Err(DbError::NotFound(999))));

        let db = registry.database();
        assert_eq!(count(db, "SELECT COUNT(*) FROM wish"), 1);
        assert_eq!(count(db, "SELECT COUNT(*) FROM booked"), 0);
        assert_eq!(count(db, "SELECT COUNT(*) FROM presenter"), 0);
        assert_flags_match_rows(db);
    }

    #[test]
    fn blank_presenter_is_invalid() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();

        assert!(matches!(
            registry.bookings.book(id, ""),
            Err(DbError::InvalidInput(_))
        ));
        assert!(!registry.wishes.get(id).unwrap().unwrap().booked);
    }

    #[test]
    fn storage_failure_rolls_back_every_write() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();
        registry
            .database()
            .with_tx(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER refuse_booking BEFORE INSERT ON booked
                     BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
                )?;
                Ok(())
            })
            .unwrap();

        let err = registry.bookings.book(id, "bob").unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
        assert!(err.is_storage());

        // Presenter insert and flag update ran before the failing insert.
        assert!(!registry.wishes.get(id).unwrap().unwrap().booked);
        assert!(!registry.participants.is_presenter("bob").unwrap());
        assert_eq!(registry.bookings.booking_for(id).unwrap(), None);
        let db = registry.database();
        assert_eq!(count(db, "SELECT COUNT(*) FROM booked"), 0);
        assert_flags_match_rows(db);
    }

    #[test]
    fn concurrent_bookings_on_shared_handle_pick_one_winner() {
        let registry = Registry::new(Database::open_in_memory().unwrap());
        let id = registry.wishes.create(&NewWish::new("alice", "kite")).unwrap();

        let presenters = ["bob", "carol", "dave", "erin", "frank", "grace"];
        let barrier = Arc::new(Barrier::new(presenters.len()));
        let handles: Vec<_> = presenters
            .iter()
            .map(|presenter| {
                let bookings = registry.bookings.clone();
                let barrier = barrier.clone();
                let presenter = presenter.to_string();
                thread::spawn(move || {
                    barrier.wait();
                    bookings.book(id, &presenter)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, DbError::AlreadyBooked(_)))
        );

        assert_eq!(count(registry.database(), "SELECT COUNT(*) FROM booked"), 1);
        assert!(registry.wishes.get(id).unwrap().unwrap().booked);
        assert_flags_match_rows(registry.database());
    }

    #[test]
    fn concurrent_bookings_across_connections_pick_one_winner() {
        let path = temp_db_path();
        let first = Registry::new(Database::open(&path).unwrap());
        let second = Registry::new(Database::open(&path).unwrap());
        let id = first.wishes.create(&NewWish::new("alice", "kite")).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let a = {
            let bookings = first.bookings.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                bookings.book(id, "bob")
            })
        };
        let b = {
            let bookings = second.bookings.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                bookings.book(id, "carol")
            })
        };

        let results = [a.join().unwrap(), b.join().unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(DbError::AlreadyBooked(_))))
        );

        assert_eq!(count(second.database(), "SELECT COUNT(*) FROM booked"), 1);
        assert!(second.wishes.get(id).unwrap().unwrap().booked);
        assert_flags_match_rows(first.database());

        drop(first);
        drop(second);
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }
}
