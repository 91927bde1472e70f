//! Books, events and shared resources. Thin persistence over their tables.

use campus_types::models::BookKind;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{BookRow, EventRow, ResourceRow};
use crate::{Database, Result, timestamp};

pub struct NewBook<'a> {
    pub id: &'a str,
    pub kind: BookKind,
    pub owner_id: &'a str,
    pub title: &'a str,
    pub author: Option<&'a str>,
    pub description: Option<&'a str>,
    pub reason: Option<&'a str>,
}

pub struct NewEvent<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub starts_at: DateTime<Utc>,
    pub link: &'a str,
    pub media_url: &'a str,
}

const BOOK_SELECT: &str =
    "SELECT b.id, b.kind, b.owner_id, o.username, b.title, b.author, b.description, b.reason,
            b.accepted, b.accepted_by, a.username, b.created_at
     FROM books b
     LEFT JOIN users o ON b.owner_id = o.id
     LEFT JOIN users a ON b.accepted_by = a.id";

const EVENT_COLUMNS: &str = "id, title, description, starts_at, link, media_url, created_at";

const RESOURCE_COLUMNS: &str = "id, title, link, subject, created_by, created_at";

impl Database {
    // -- Books --

    pub fn create_book(&self, book: &NewBook<'_>) -> Result<BookRow> {
        let now = timestamp(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO books (id, kind, owner_id, title, author, description, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    book.id,
                    book.kind.as_str(),
                    book.owner_id,
                    book.title,
                    book.author,
                    book.description,
                    book.reason,
                    now
                ],
            )?;
            query_book(conn, book.id)?
                .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
        })
    }

    /// Whole feed, newest first.
    pub fn get_books(&self) -> Result<Vec<BookRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY b.created_at DESC, b.rowid DESC", BOOK_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], book_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Marks a borrow request accepted by `user_id`. Returns `None` when the id
    /// is unknown or names a lend offer.
    pub fn accept_borrow_request(&self, book_id: &str, user_id: &str) -> Result<Option<BookRow>> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE books SET accepted = 1, accepted_by = ?2 WHERE id = ?1 AND kind = 'borrow'",
                [book_id, user_id],
            )?;
            if updated == 0 {
                return Ok(None);
            }
            query_book(conn, book_id)
        })
    }

    // -- Events --

    pub fn create_event(&self, event: &NewEvent<'_>) -> Result<EventRow> {
        let now = timestamp(Utc::now());
        let starts_at = timestamp(event.starts_at);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, title, description, starts_at, link, media_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    event.id,
                    event.title,
                    event.description,
                    starts_at,
                    event.link,
                    event.media_url,
                    now
                ],
            )?;
            let sql = format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS);
            Ok(conn.query_row(&sql, [event.id], event_from_row)?)
        })
    }

    /// Latest start time first.
    pub fn get_events(&self) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM events ORDER BY starts_at DESC, rowid DESC",
                EVENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], event_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Resources --

    pub fn create_resource(
        &self,
        id: &str,
        title: &str,
        link: &str,
        subject: &str,
        created_by: &str,
    ) -> Result<ResourceRow> {
        let now = timestamp(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO resources (id, title, link, subject, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, title, link, subject, created_by, &now),
            )?;
            let sql = format!("SELECT {} FROM resources WHERE id = ?1", RESOURCE_COLUMNS);
            Ok(conn.query_row(&sql, [id], resource_from_row)?)
        })
    }

    /// Newest first.
    pub fn get_resources(&self) -> Result<Vec<ResourceRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM resources ORDER BY created_at DESC, rowid DESC",
                RESOURCE_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], resource_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_book(conn: &Connection, id: &str) -> Result<Option<BookRow>> {
    let sql = format!("{} WHERE b.id = ?1", BOOK_SELECT);
    let row = conn.query_row(&sql, [id], book_from_row).optional()?;
    Ok(row)
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<BookRow> {
    Ok(BookRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        owner_id: row.get(2)?,
        owner_username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        title: row.get(4)?,
        author: row.get(5)?,
        description: row.get(6)?,
        reason: row.get(7)?,
        accepted: row.get(8)?,
        accepted_by: row.get(9)?,
        accepted_by_username: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        starts_at: row.get(3)?,
        link: row.get(4)?,
        media_url: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<ResourceRow> {
    Ok(ResourceRow {
        id: row.get(0)?,
        title: row.get(1)?,
        link: row.get(2)?,
        subject: row.get(3)?,
        created_by: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "alice", "a@x.com", "hash", "MIT").unwrap();
        db.create_user("u2", "bob", "b@x.com", "hash", "MIT").unwrap();
        db
    }

    fn borrow<'a>(id: &'a str, title: &'a str) -> NewBook<'a> {
        NewBook {
            id,
            kind: BookKind::Borrow,
            owner_id: "u1",
            title,
            author: None,
            description: None,
            reason: Some("exam"),
        }
    }

    #[test]
    fn accepting_a_borrow_request_records_the_acceptor() {
        let db = db();
        db.create_book(&borrow("b1", "SICP")).unwrap();

        let book = db.accept_borrow_request("b1", "u2").unwrap().unwrap();
        assert!(book.accepted);
        assert_eq!(book.accepted_by.as_deref(), Some("u2"));
        assert_eq!(book.accepted_by_username.as_deref(), Some("bob"));
    }

    #[test]
    fn lend_offers_and_unknown_ids_cannot_be_accepted() {
        let db = db();
        db.create_book(&NewBook {
            id: "b1",
            kind: BookKind::Lend,
            owner_id: "u1",
            title: "TAOCP",
            author: Some("Knuth"),
            description: None,
            reason: None,
        })
        .unwrap();

        assert!(db.accept_borrow_request("b1", "u2").unwrap().is_none());
        assert!(db.accept_borrow_request("missing", "u2").unwrap().is_none());
    }

    #[test]
    fn book_feed_is_newest_first() {
        let db = db();
        db.create_book(&borrow("b1", "first")).unwrap();
        db.create_book(&borrow("b2", "second")).unwrap();

        let titles: Vec<String> = db.get_books().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, ["second", "first"]);
    }

    #[test]
    fn events_sort_by_start_time_descending() {
        let db = db();
        for (id, day) in [("e1", 1), ("e2", 20), ("e3", 10)] {
            db.create_event(&NewEvent {
                id,
                title: id,
                description: "desc",
                starts_at: Utc.with_ymd_and_hms(2026, 3, day, 18, 0, 0).unwrap(),
                link: "",
                media_url: "",
            })
            .unwrap();
        }

        let ids: Vec<String> = db.get_events().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["e2", "e3", "e1"]);
    }

    #[test]
    fn resources_keep_their_creator() {
        let db = db();
        let row = db
            .create_resource("r1", "Notes", "https://notes.example", "Math", "u2")
            .unwrap();
        assert_eq!(row.created_by.as_deref(), Some("u2"));
        assert_eq!(db.get_resources().unwrap().len(), 1);
    }
}
