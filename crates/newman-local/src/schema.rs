//! SQL schema for the local backend.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- At most one signed-in session per database.
CREATE TABLE IF NOT EXISTS sessions (
    slot          INTEGER PRIMARY KEY CHECK (slot = 1),
    account_id    TEXT NOT NULL REFERENCES accounts(account_id),
    access_token  TEXT NOT NULL,
    refresh_token TEXT NOT NULL,
    issued_at     TEXT NOT NULL
);

-- One JSON document per record; `seq` breaks ordering ties.
CREATE TABLE IF NOT EXISTS records (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,      -- 'profiles' | 'stores' | 'messages'
    record_id  TEXT NOT NULL,
    body       TEXT NOT NULL,
    UNIQUE (collection, record_id)
);

CREATE INDEX IF NOT EXISTS records_collection_idx ON records(collection);

PRAGMA user_version = 1;
";
