use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, messages)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password    TEXT NOT NULL,
                college     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE messages (
                id           TEXT PRIMARY KEY,
                kind         TEXT NOT NULL CHECK (kind IN ('global', 'group', 'one-to-one')),
                sender_id    TEXT NOT NULL REFERENCES users(id),
                college      TEXT,
                receiver_id  TEXT REFERENCES users(id),
                text         TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                CHECK (
                    (kind = 'global' AND college IS NULL AND receiver_id IS NULL)
                    OR (kind = 'group' AND college IS NOT NULL AND receiver_id IS NULL)
                    OR (kind = 'one-to-one' AND receiver_id IS NOT NULL AND college IS NULL)
                )
            );

            CREATE INDEX idx_messages_kind
                ON messages(kind, created_at);
            CREATE INDEX idx_messages_college
                ON messages(college, created_at) WHERE kind = 'group';
            CREATE INDEX idx_messages_sender
                ON messages(sender_id, receiver_id) WHERE kind = 'one-to-one';
            CREATE INDEX idx_messages_receiver
                ON messages(receiver_id) WHERE kind = 'one-to-one';

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (books, events, resources)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE books (
                id           TEXT PRIMARY KEY,
                kind         TEXT NOT NULL CHECK (kind IN ('lend', 'borrow')),
                owner_id     TEXT NOT NULL REFERENCES users(id),
                title        TEXT NOT NULL,
                author       TEXT,
                description  TEXT,
                reason       TEXT,
                accepted     INTEGER NOT NULL DEFAULT 0,
                accepted_by  TEXT REFERENCES users(id),
                created_at   TEXT NOT NULL
            );

            CREATE TABLE events (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                description  TEXT NOT NULL,
                starts_at    TEXT NOT NULL,
                link         TEXT NOT NULL DEFAULT '',
                media_url    TEXT NOT NULL DEFAULT '',
                created_at   TEXT NOT NULL
            );

            CREATE TABLE resources (
                id           TEXT PRIMARY KEY,
                title        TEXT NOT NULL,
                link         TEXT NOT NULL,
                subject      TEXT NOT NULL,
                created_by   TEXT REFERENCES users(id),
                created_at   TEXT NOT NULL
            );

            CREATE INDEX idx_books_created ON books(created_at);
            CREATE INDEX idx_events_starts ON events(starts_at);
            CREATE INDEX idx_resources_created ON resources(created_at);

            INSERT INTO schema_version (version) VALUES (2);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
