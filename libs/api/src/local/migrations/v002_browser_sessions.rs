//! v002: Browser sessions
//!
//! Server-side session records keyed by the cookie token. `expires_at` is a
//! unix timestamp so expiry checks are plain integer comparisons.

use super::Migration;

pub const MIGRATION: Migration = Migration {
    version: 2,
    description: "Browser sessions",
    up: &[
        "CREATE TABLE browser_sessions (
            token TEXT PRIMARY KEY,
            identity_id TEXT NOT NULL,
            display_name TEXT NOT NULL,
            email TEXT NOT NULL,
            photo_url TEXT,
            created_at TEXT NOT NULL,
            expires_at INTEGER NOT NULL
        )",
        "CREATE INDEX idx_browser_sessions_expires_at ON browser_sessions(expires_at)",
    ],
    down: &[
        "DROP INDEX idx_browser_sessions_expires_at",
        "DROP TABLE browser_sessions",
    ],
};
