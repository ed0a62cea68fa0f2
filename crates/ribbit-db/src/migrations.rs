use rusqlite::Connection;
use tracing::info;

use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, roles, posts)");
        conn.execute_batch(
            "
            CREATE TABLE roles (
                id              INTEGER PRIMARY KEY,
                access_level    INTEGER NOT NULL,
                name            TEXT NOT NULL UNIQUE
            );

            INSERT INTO roles (id, access_level, name) VALUES
                (1, 1, 'user'),
                (2, 2, 'admin'),
                (3, 3, 'super_admin');

            CREATE TABLE users (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                role_id             INTEGER NOT NULL DEFAULT 1 REFERENCES roles(id),
                username            TEXT NOT NULL UNIQUE,
                email               TEXT NOT NULL UNIQUE,
                password            TEXT NOT NULL,
                token               TEXT,
                last_login          TEXT,
                referral_code       TEXT UNIQUE,
                first_name          TEXT,
                last_name           TEXT,
                mobile              TEXT,
                country_code        TEXT,
                address             TEXT,
                city                TEXT,
                state               TEXT,
                country             TEXT,
                zip_code            TEXT,
                dob                 TEXT,
                bio                 TEXT,
                avatar              TEXT,
                occupation          TEXT,
                employer_name       TEXT,
                account_status      TEXT,
                facebook_url        TEXT,
                twitter_url         TEXT,
                instagram_url       TEXT,
                referred_by         TEXT,
                public_portfolio    INTEGER NOT NULL DEFAULT 0,
                active              INTEGER NOT NULL DEFAULT 1,
                verified            INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                deleted_at          TEXT
            );

            CREATE INDEX idx_users_token ON users(token);

            -- Posts and comments share one table. A comment is the only kind
            -- of row allowed to carry a parent.
            CREATE TABLE posts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                type            TEXT NOT NULL CHECK (type IN ('post', 'comment')),
                parent_id       INTEGER REFERENCES posts(id),
                added_by        INTEGER NOT NULL REFERENCES users(id),
                email           TEXT,
                title           TEXT NOT NULL DEFAULT '',
                description     TEXT NOT NULL DEFAULT '',
                is_private      INTEGER NOT NULL DEFAULT 0,
                attachments     TEXT NOT NULL DEFAULT '[]',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                deleted_at      TEXT,
                CHECK ((type = 'comment') = (parent_id IS NOT NULL))
            );

            CREATE INDEX idx_posts_parent ON posts(parent_id, type);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
