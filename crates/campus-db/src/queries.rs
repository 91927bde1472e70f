use campus_types::models::ChatKind;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{MessageRow, UserRow};
use crate::{Database, Result, timestamp};

/// Fields of a message about to be stored. Constructors enforce which
/// per-mode fields are set; the table CHECK constraint enforces it again.
pub struct NewMessage<'a> {
    pub id: &'a str,
    pub kind: ChatKind,
    pub sender_id: &'a str,
    pub college: Option<&'a str>,
    pub receiver_id: Option<&'a str>,
    pub text: &'a str,
}

impl<'a> NewMessage<'a> {
    pub fn global(id: &'a str, sender_id: &'a str, text: &'a str) -> Self {
        Self {
            id,
            kind: ChatKind::Global,
            sender_id,
            college: None,
            receiver_id: None,
            text,
        }
    }

    pub fn group(id: &'a str, sender_id: &'a str, college: &'a str, text: &'a str) -> Self {
        Self {
            id,
            kind: ChatKind::Group,
            sender_id,
            college: Some(college),
            receiver_id: None,
            text,
        }
    }

    pub fn direct(id: &'a str, sender_id: &'a str, receiver_id: &'a str, text: &'a str) -> Self {
        Self {
            id,
            kind: ChatKind::OneToOne,
            sender_id,
            college: None,
            receiver_id: Some(receiver_id),
            text,
        }
    }
}

/// Which messages to read. Results are always oldest first.
pub enum MessageFilter<'a> {
    Global,
    Group { college: &'a str },
    Direct { user_a: &'a str, user_b: &'a str },
}

const USER_COLUMNS: &str = "id, username, email, password, college, created_at";

const MESSAGE_SELECT: &str =
    "SELECT m.id, m.kind, m.sender_id, s.username, m.college, m.receiver_id, r.username, m.text, m.created_at
     FROM messages m
     LEFT JOIN users s ON m.sender_id = s.id
     LEFT JOIN users r ON m.receiver_id = r.id";

impl Database {
    // -- Users --

    /// Single INSERT; a taken username or email comes back as
    /// `DbError::DuplicateKey` with no row written.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        college: &str,
    ) -> Result<()> {
        let now = timestamp(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, college, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, username, email, password_hash, college, &now),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn user_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Batch-fetch users for a set of ids, ordered by username.
    pub fn get_users_by_ids(&self, ids: &[String]) -> Result<Vec<UserRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {} FROM users WHERE id IN ({}) ORDER BY username",
                USER_COLUMNS,
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Case-insensitive substring match on username.
    pub fn search_users(&self, term: &str, limit: u32) -> Result<Vec<UserRow>> {
        let pattern = format!("%{}%", escape_like(term));
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users WHERE username LIKE ?1 ESCAPE '\\' ORDER BY username LIMIT ?2",
                USER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![pattern, limit], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    /// Stores the message with `created_at` assigned now and returns the
    /// stored row with sender and receiver usernames resolved.
    pub fn create_message(&self, msg: &NewMessage<'_>) -> Result<MessageRow> {
        let now = timestamp(Utc::now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, kind, sender_id, college, receiver_id, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    msg.id,
                    msg.kind.as_str(),
                    msg.sender_id,
                    msg.college,
                    msg.receiver_id,
                    msg.text,
                    now
                ],
            )?;

            let sql = format!("{} WHERE m.id = ?1", MESSAGE_SELECT);
            let row = conn.query_row(&sql, [msg.id], message_from_row)?;
            Ok(row)
        })
    }

    pub fn get_messages(&self, filter: &MessageFilter<'_>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, filter))
    }

    /// (sender_id, receiver_id) of every one-to-one message the user took
    /// part in, in either direction.
    pub fn get_direct_pairs(&self, user_id: &str) -> Result<Vec<(String, String)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT sender_id, receiver_id FROM messages
                 WHERE kind = 'one-to-one' AND (sender_id = ?1 OR receiver_id = ?1)",
            )?;
            let rows = stmt
                .query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let row = conn.query_row(&sql, [value], user_from_row).optional()?;
    Ok(row)
}

fn query_messages(conn: &Connection, filter: &MessageFilter<'_>) -> Result<Vec<MessageRow>> {
    const ORDER: &str = "ORDER BY m.created_at ASC, m.rowid ASC";

    let rows = match filter {
        MessageFilter::Global => {
            let sql = format!("{} WHERE m.kind = 'global' {}", MESSAGE_SELECT, ORDER);
            let mut stmt = conn.prepare(&sql)?;
            stmt
                .query_map([], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        MessageFilter::Group { college } => {
            let sql = format!(
                "{} WHERE m.kind = 'group' AND m.college = ?1 {}",
                MESSAGE_SELECT, ORDER
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt
                .query_map([college], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        MessageFilter::Direct { user_a, user_b } => {
            let sql = format!(
                "{} WHERE m.kind = 'one-to-one'
                   AND ((m.sender_id = ?1 AND m.receiver_id = ?2)
                     OR (m.sender_id = ?2 AND m.receiver_id = ?1)) {}",
                MESSAGE_SELECT, ORDER
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt
                .query_map([user_a, user_b], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        college: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        sender_id: row.get(2)?,
        sender_username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        college: row.get(4)?,
        receiver_id: row.get(5)?,
        receiver_username: row.get(6)?,
        text: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;

    fn db_with_users(names: &[(&str, &str)]) -> Database {
        let db = Database::open_in_memory().unwrap();
        for (name, college) in names {
            db.create_user(
                &format!("id-{}", name),
                name,
                &format!("{}@x.com", name),
                "hash",
                college,
            )
            .unwrap();
        }
        db
    }

    fn count_users(db: &Database) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn duplicate_username_is_a_conflict_and_writes_nothing() {
        let db = db_with_users(&[("alice", "MIT")]);

        let err = db
            .create_user("id-2", "alice", "other@x.com", "hash", "MIT")
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey(_)));
        assert_eq!(count_users(&db), 1);
    }

    #[test]
    fn duplicate_email_ignores_case() {
        let db = db_with_users(&[("alice", "MIT")]);

        let err = db
            .create_user("id-2", "bob", "ALICE@x.com", "hash", "MIT")
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey(_)));
        assert_eq!(count_users(&db), 1);
    }

    #[test]
    fn primary_key_reuse_is_not_reported_as_duplicate_key() {
        let db = db_with_users(&[("alice", "MIT")]);

        let err = db
            .create_user("id-alice", "bob", "bob@x.com", "hash", "MIT")
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    }

    #[test]
    fn direct_conversation_is_ordered_and_scoped_to_the_pair() {
        let db = db_with_users(&[("alice", "MIT"), ("bob", "MIT"), ("carol", "MIT")]);

        db.create_message(&NewMessage::direct("m1", "id-alice", "id-bob", "hi"))
            .unwrap();
        db.create_message(&NewMessage::direct("m2", "id-carol", "id-alice", "psst"))
            .unwrap();
        db.create_message(&NewMessage::direct("m3", "id-bob", "id-alice", "hello"))
            .unwrap();

        let rows = db
            .get_messages(&MessageFilter::Direct {
                user_a: "id-bob",
                user_b: "id-alice",
            })
            .unwrap();
        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["hi", "hello"]);
        assert_eq!(rows[0].receiver_username.as_deref(), Some("bob"));
    }

    #[test]
    fn group_filter_only_returns_that_college() {
        let db = db_with_users(&[("alice", "MIT"), ("nick", "NYU")]);

        db.create_message(&NewMessage::group("m1", "id-alice", "MIT", "mit only"))
            .unwrap();
        db.create_message(&NewMessage::group("m2", "id-nick", "NYU", "nyu only"))
            .unwrap();
        db.create_message(&NewMessage::global("m3", "id-nick", "everyone"))
            .unwrap();

        let rows = db
            .get_messages(&MessageFilter::Group { college: "MIT" })
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].college.as_deref(), Some("MIT"));

        let global = db.get_messages(&MessageFilter::Global).unwrap();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].sender_username, "nick");
    }

    #[test]
    fn global_feed_is_in_send_order_and_skips_other_modes() {
        let db = db_with_users(&[("alice", "MIT"), ("bob", "NYU")]);

        for (i, (sender, text)) in [("id-alice", "one"), ("id-bob", "two"), ("id-alice", "three")]
            .into_iter()
            .enumerate()
        {
            db.create_message(&NewMessage::global(&format!("g{}", i), sender, text))
                .unwrap();
        }
        db.create_message(&NewMessage::direct("d1", "id-alice", "id-bob", "private"))
            .unwrap();

        let rows = db.get_messages(&MessageFilter::Global).unwrap();
        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
        assert!(rows.iter().all(|r| r.receiver_id.is_none()));
    }

    #[test]
    fn check_constraint_rejects_mixed_mode_fields() {
        let db = db_with_users(&[("alice", "MIT"), ("bob", "MIT")]);

        let bad = NewMessage {
            id: "m1",
            kind: ChatKind::Global,
            sender_id: "id-alice",
            college: None,
            receiver_id: Some("id-bob"),
            text: "nope",
        };
        assert!(db.create_message(&bad).is_err());
    }

    #[test]
    fn search_is_case_insensitive_and_escapes_wildcards() {
        let db = db_with_users(&[("Alice", "MIT"), ("malik", "MIT"), ("bob", "MIT")]);

        let names: Vec<String> = db
            .search_users("ali", 10)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["Alice", "malik"]);

        assert!(db.search_users("%", 10).unwrap().is_empty());
        assert_eq!(db.search_users("", 2).unwrap().len(), 2);
    }

    #[test]
    fn direct_pairs_cover_both_directions() {
        let db = db_with_users(&[("alice", "MIT"), ("bob", "MIT"), ("carol", "MIT")]);

        db.create_message(&NewMessage::direct("m1", "id-alice", "id-bob", "a"))
            .unwrap();
        db.create_message(&NewMessage::direct("m2", "id-carol", "id-alice", "b"))
            .unwrap();
        db.create_message(&NewMessage::direct("m3", "id-bob", "id-carol", "c"))
            .unwrap();

        let mut pairs = db.get_direct_pairs("id-alice").unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            [
                ("id-alice".to_string(), "id-bob".to_string()),
                ("id-carol".to_string(), "id-alice".to_string()),
            ]
        );
    }

    #[test]
    fn user_lookup_by_id_set() {
        let db = db_with_users(&[("carol", "MIT"), ("bob", "MIT")]);

        let users = db
            .get_users_by_ids(&["id-carol".to_string(), "id-bob".to_string(), "id-ghost".to_string()])
            .unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["bob", "carol"]);
        assert!(db.get_users_by_ids(&[]).unwrap().is_empty());
        assert!(db.user_exists("id-bob").unwrap());
        assert!(!db.user_exists("id-ghost").unwrap());
    }
}
