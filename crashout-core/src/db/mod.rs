//! Database layer for crashout
//!
//! SQLite-backed [`KeyValueStore`](crate::store::KeyValueStore) with:
//! - Schema migrations
//! - One row per snapshot key

pub mod repo;
pub mod schema;

pub use repo::Database;
