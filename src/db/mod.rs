//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pooled storage handle with the actual queries

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbQueryLog, DbUser};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage};
