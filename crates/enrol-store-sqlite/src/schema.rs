//! SQL schema for the Enrol SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;

-- Uniqueness of nim and institutional_email is enforced here and nowhere
-- else; writers map the constraint failure to a duplicate-field error.
CREATE TABLE IF NOT EXISTS participants (
    participant_id      TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    nim                 INTEGER NOT NULL UNIQUE,
    institutional_email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    personal_email      TEXT NOT NULL,
    phone               TEXT NOT NULL,
    major               TEXT NOT NULL,   -- display string of Major
    payment_proof       TEXT,            -- object-store URI or NULL
    registered_at       TEXT NOT NULL    -- RFC 3339 UTC, fixed micros; server-assigned
);

-- One row per key; values are JSON.
CREATE TABLE IF NOT EXISTS settings (
    key         TEXT PRIMARY KEY,
    value_json  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS participants_registered_idx
    ON participants(registered_at);

PRAGMA user_version = 1;
";
