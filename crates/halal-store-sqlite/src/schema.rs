//! SQL schema for the Halal Match SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One JSON document per (viewer, slot). A save replaces the row in a single
-- upsert, so a slot is never half-written.
CREATE TABLE IF NOT EXISTS viewer_state (
    viewer_id   TEXT NOT NULL,
    slot        TEXT NOT NULL,   -- 'decisions' | 'filters' | 'quota' | 'matches' | 'profile'
    value_json  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,   -- ISO 8601 UTC
    PRIMARY KEY (viewer_id, slot)
);

PRAGMA user_version = 1;
";
