//! SQL DDL for initializing credential and audit-log storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema:
/// - `users`: one row per credential, `username` as the natural key.
///   `plain_password` is the administrative escrow copy and may be NULL
///   (a user whose escrow was never captured is shown a reset sentinel).
/// - `query_logs`: append-only audit trail. `id` is AUTOINCREMENT so
///   insertion order is chronological order. `queried_at` is local time
///   formatted as `YYYY-MM-DD HH:MM:SS`.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    email TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    salt TEXT NOT NULL,
    plain_password TEXT NULL
);

CREATE TABLE IF NOT EXISTS query_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    cas_number TEXT NOT NULL,
    usage_purpose TEXT NOT NULL DEFAULT '',
    queried_at TEXT NOT NULL,
    result_summary TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_query_logs_username ON query_logs(username)
"#;
