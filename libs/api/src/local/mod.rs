//! Local libsql (SQLite) backend

pub mod migrations;
pub mod storage;
