//! v001: Click ledger
//!
//! Creates the contributions table (one row per identity, enforced by the
//! primary key) and the singleton click counter.

use super::Migration;

pub const MIGRATION: Migration = Migration {
    version: 1,
    description: "Contributions and click counter",
    up: &[
        "CREATE TABLE contributions (
            identity_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        "CREATE TABLE click_counter (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            count INTEGER NOT NULL DEFAULT 0 CHECK (count >= 0)
        )",
        "INSERT INTO click_counter (id, count) VALUES (1, 0)",
    ],
    down: &[
        "DROP TABLE click_counter",
        "DROP TABLE contributions",
    ],
};
